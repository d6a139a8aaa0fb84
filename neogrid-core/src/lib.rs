//! Board-agnostic core logic for the neogrid controller
//!
//! This crate contains everything that does not depend on specific
//! hardware:
//!
//! - Device state and the LED intensity buffer
//! - Input event queues
//! - Command dispatch and outbound messages
//! - Gamma rendering onto a pixel sink
//! - Hardware abstraction traits (pixels, keypad)
//! - Configuration types and the config file parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod device;
pub mod dispatch;
pub mod outbound;
pub mod queue;
pub mod render;
pub mod state;
pub mod traits;

pub use device::{MonomeDevice, PollOutcome};
pub use outbound::ScanError;
