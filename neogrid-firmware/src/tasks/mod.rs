//! Embassy async tasks
//!
//! The device task owns all protocol state; the status LED task only
//! listens for activity signals.

pub mod device;
pub mod status_led;

pub use device::device_task;
pub use status_led::status_led_task;
