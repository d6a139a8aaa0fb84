//! monome serial protocol
//!
//! This crate defines the byte-level protocol spoken between a host running
//! serialosc (or any monome-aware software) and a grid or arc controller.
//!
//! # Protocol Overview
//!
//! There is no framing, length prefix or checksum. Every command is a single
//! opcode byte followed by a fixed number of payload bytes determined by
//! the opcode alone:
//! ```text
//! ┌────────┬──────────────────────────────┐
//! │ OPCODE │ PAYLOAD                      │
//! │ 1B     │ 0–34B (fixed per opcode)     │
//! └────────┴──────────────────────────────┘
//! ```
//!
//! The high nibble of the opcode selects a section (system, led-grid,
//! key-grid, encoder, tilt, ring) and the low nibble the command within it.
//! Replies written by the device reuse the same shape.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod events;
pub mod opcode;
pub mod parser;
pub mod reply;

pub use command::{pack_levels, unpack_levels, DecodeError, HostCommand};
pub use events::{ArcEvent, GridEvent};
pub use opcode::{Opcode, ID_LEN, MAX_PAYLOAD_SIZE, VERSION_LEN};
pub use parser::{CommandParser, Packet, ParseError};
pub use reply::{DeviceMessage, EncodeError, MAX_MESSAGE_SIZE};
