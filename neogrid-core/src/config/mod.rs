//! Configuration
//!
//! Board-agnostic device configuration and the parser for the `device.toml`
//! file embedded in firmware images.

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ConfigParseError};
pub use types::*;
