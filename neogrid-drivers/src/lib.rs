//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in neogrid-core:
//!
//! - Adafruit NeoTrellis boards (seesaw over I2C), tiled into one grid

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod trellis;
