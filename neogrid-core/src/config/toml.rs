//! Minimal TOML parser for device configuration
//!
//! Handles only the subset used by `device.toml`. It does not allocate.
//!
//! Supported:
//! - `[section]` headers: device, grid, arc, led, link, render
//! - `key = value` pairs with string, integer, boolean and integer-array values
//! - Comments (`# ...`), including after a value
//!
//! Unknown keys are ignored so newer files still load on older firmware.
//! Unknown sections are an error.

use heapless::String;

use crate::render::Rgb;

use super::types::{DeviceConfig, LineAlign, RingFillMode};

/// Config parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or cannot be parsed
    InvalidValue,
    /// Number outside the range the field accepts
    OutOfRange,
    /// String longer than the field's capacity
    TooLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Device,
    Grid,
    Arc,
    Led,
    Link,
    Render,
}

/// Parse `device.toml` text into a [`DeviceConfig`]
///
/// Fields missing from the input keep their defaults.
pub fn parse_config(input: &str) -> Result<DeviceConfig, ConfigParseError> {
    let mut config = DeviceConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(section, key, value, &mut config)?;
        }
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ConfigParseError> {
    match header.trim() {
        "device" => Ok(Section::Device),
        "grid" => Ok(Section::Grid),
        "arc" => Ok(Section::Arc),
        "led" => Ok(Section::Led),
        "link" => Ok(Section::Link),
        "render" => Ok(Section::Render),
        _ => Err(ConfigParseError::InvalidSection),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut DeviceConfig,
) -> Result<(), ConfigParseError> {
    match (section, key) {
        (Section::Device, "id") => config.device.id = parse_heapless(value)?,
        (Section::Device, "firmware_version") => {
            config.device.firmware_version = parse_heapless(value)?
        }
        (Section::Device, "monome") => config.device.monome = parse_bool(value)?,

        (Section::Grid, "enabled") => config.grid.enabled = parse_bool(value)?,
        (Section::Grid, "rows") => config.grid.rows = parse_bounded(value, 16)?,
        (Section::Grid, "cols") => config.grid.cols = parse_bounded(value, 16)?,

        (Section::Arc, "encoders") => config.arc.encoders = parse_bounded(value, 4)?,

        (Section::Led, "brightness") => config.led.brightness = parse_bounded(value, 15)?,
        (Section::Led, "vari_mono_thresh") => {
            config.led.vari_mono_thresh = parse_bounded(value, 15)?
        }
        (Section::Led, "ring_fill") => config.led.ring_fill = parse_ring_fill(value)?,
        (Section::Led, "line_align") => config.led.line_align = parse_line_align(value)?,

        (Section::Link, "baudrate") => config.link.baudrate = parse_int(value)?,
        (Section::Link, "command_timeout_ms") => {
            config.link.command_timeout_ms = parse_int(value)?
        }

        (Section::Render, "tint") => config.render.tint = parse_rgb(value)?,
        (Section::Render, "refresh_ms") => config.render.refresh_ms = parse_int(value)?,

        _ => {}
    }
    Ok(())
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments outside strings
    let value = match value.find('#') {
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn parse_heapless<const N: usize>(value: &str) -> Result<String<N>, ConfigParseError> {
    String::try_from(parse_string(value)).map_err(|_| ConfigParseError::TooLong)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ConfigParseError> {
    value.parse().map_err(|_| ConfigParseError::InvalidValue)
}

/// Parse an integer no larger than `max`
fn parse_bounded(value: &str, max: u8) -> Result<u8, ConfigParseError> {
    let n: u32 = parse_int(value)?;
    if n > max as u32 {
        return Err(ConfigParseError::OutOfRange);
    }
    Ok(n as u8)
}

fn parse_bool(value: &str) -> Result<bool, ConfigParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigParseError::InvalidValue),
    }
}

fn parse_ring_fill(value: &str) -> Result<RingFillMode, ConfigParseError> {
    match parse_string(value) {
        "fill" => Ok(RingFillMode::Fill),
        "zero" | "zero_ring" => Ok(RingFillMode::ZeroRing),
        _ => Err(ConfigParseError::InvalidValue),
    }
}

fn parse_line_align(value: &str) -> Result<LineAlign, ConfigParseError> {
    match parse_string(value) {
        "block" => Ok(LineAlign::Block),
        "axis" => Ok(LineAlign::Axis),
        _ => Err(ConfigParseError::InvalidValue),
    }
}

/// Parse `[r, g, b]`
fn parse_rgb(value: &str) -> Result<Rgb, ConfigParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ConfigParseError::InvalidValue)?;

    let mut channels = [0u8; 3];
    let mut parts = inner.split(',').map(str::trim);
    for channel in channels.iter_mut() {
        let part = parts.next().ok_or(ConfigParseError::InvalidValue)?;
        *channel = parse_int::<u16>(part)?
            .try_into()
            .map_err(|_| ConfigParseError::OutOfRange)?;
    }
    // Allow a trailing comma, nothing else
    if parts.any(|p| !p.is_empty()) {
        return Err(ConfigParseError::InvalidValue);
    }

    let [r, g, b] = channels;
    Ok(Rgb::new(r, g, b))
}
