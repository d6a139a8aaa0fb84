//! neogrid Hardware Abstraction Layer
//!
//! This crate defines the transport traits the protocol engine is written
//! against. A board crate implements them for its UART or USB CDC endpoint;
//! tests implement them over in-memory buffers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  neogrid-core (dispatcher, encoder)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  neogrid-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ RP2040 UART   │       │ host mocks    │
//! │ (firmware)    │       │ (tests)       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`serial::SerialTx`], [`serial::SerialRx`] - Byte-stream transport
//! - [`serial::SerialPort`] - Both halves on one endpoint

#![no_std]
#![deny(unsafe_code)]

pub mod serial;

pub use serial::{ErrorType, SerialConfig, SerialPort, SerialRx, SerialTx};
