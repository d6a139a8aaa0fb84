//! Device state and LED buffer
//!
//! The dispatcher is the only writer of both. Renderers read the LED buffer
//! and consume the dirty flags held in the device state.

pub mod device_state;
pub mod leds;

pub use device_state::{DeviceId, DeviceState, FirmwareVersion, GridOffset};
pub use leds::{LedBuffer, MAX_COLS, MAX_RINGS, MAX_ROWS, RING_SIZE};
