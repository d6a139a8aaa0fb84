//! Configuration loading
//!
//! The device configuration is compiled in from `device.toml` (checked by
//! build.rs) and parsed at boot with the no_std parser in neogrid-core.

use defmt::*;

use neogrid_core::config::{parse_config, DeviceConfig};

/// Embedded configuration; edit device.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../device.toml");

/// Parse the embedded configuration, falling back to defaults
pub fn load() -> DeviceConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Config: id={} grid={}x{} encoders={}",
                config.device.id.as_str(),
                config.grid_cols(),
                config.grid_rows(),
                config.arc.encoders
            );
            config
        }
        Err(e) => {
            // build.rs rejects bad files, so this means the two parsers disagree
            error!("Failed to parse embedded config: {:?}", e);
            warn!("Using default configuration");
            DeviceConfig::default()
        }
    }
}
