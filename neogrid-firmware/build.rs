//! Build script for neogrid-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates device.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sections the firmware's config parser understands
const SECTIONS: &[&str] = &["device", "grid", "arc", "led", "link", "render"];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths and scripts
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x");
    f.write_all(memory_x).expect("write memory.x");

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate device.toml so mistakes fail the build instead of falling back
/// to defaults on the device
fn validate_config() {
    println!("cargo:rerun-if-changed=device.toml");

    let config_path = Path::new("device.toml");
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: device.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a device.toml configuration file.           ║\n\
            ║  Please create one in the neogrid-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read device.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail("Invalid TOML syntax in device.toml", &[e.to_string()]),
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_device(&config, &mut errors);
    validate_grid(&config, &mut errors);
    validate_leds(&config, &mut errors);
    validate_render(&config, &mut errors);

    if !errors.is_empty() {
        fail("Invalid device configuration", &errors);
    }
}

fn fail(title: &str, errors: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(table) = config.as_table() else {
        errors.push("top level must be a table".into());
        return;
    };
    for (name, value) in table {
        if !SECTIONS.contains(&name.as_str()) {
            errors.push(format!("unknown section [{}]", name));
        } else if !value.is_table() {
            errors.push(format!("[{}] must be a table", name));
        }
    }
}

fn int_in(
    config: &toml::Value,
    section: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) -> Option<i64> {
    match config.get(section).and_then(|s| s.get(key)) {
        None => None,
        Some(toml::Value::Integer(n)) if range.contains(n) => Some(*n),
        Some(_) => {
            errors.push(format!(
                "[{}] {} must be an integer in {}..={}",
                section,
                key,
                range.start(),
                range.end()
            ));
            None
        }
    }
}

fn string_max(
    config: &toml::Value,
    section: &str,
    key: &str,
    max_len: usize,
    errors: &mut Vec<String>,
) {
    match config.get(section).and_then(|s| s.get(key)) {
        None => {}
        Some(toml::Value::String(s)) if s.len() <= max_len => {}
        Some(_) => errors.push(format!(
            "[{}] {} must be a string of at most {} bytes",
            section, key, max_len
        )),
    }
}

fn validate_device(config: &toml::Value, errors: &mut Vec<String>) {
    string_max(config, "device", "id", 32, errors);
    string_max(config, "device", "firmware_version", 8, errors);
}

fn validate_grid(config: &toml::Value, errors: &mut Vec<String>) {
    let rows = int_in(config, "grid", "rows", 0..=16, errors);
    let cols = int_in(config, "grid", "cols", 0..=16, errors);
    int_in(config, "arc", "encoders", 0..=4, errors);

    // NeoTrellis boards come in 4×4 tiles
    for (key, value) in [("rows", rows), ("cols", cols)] {
        if let Some(n) = value {
            if n % 4 != 0 {
                println!("cargo:warning=[grid] {} = {} is not a multiple of 4", key, n);
            }
        }
    }
}

fn validate_leds(config: &toml::Value, errors: &mut Vec<String>) {
    int_in(config, "led", "brightness", 0..=15, errors);
    int_in(config, "led", "vari_mono_thresh", 0..=15, errors);
    match config.get("led").and_then(|s| s.get("ring_fill")) {
        None => {}
        Some(toml::Value::String(s)) if ["fill", "zero", "zero_ring"].contains(&s.as_str()) => {}
        Some(_) => errors.push("[led] ring_fill must be \"fill\" or \"zero_ring\"".into()),
    }
    match config.get("led").and_then(|s| s.get("line_align")) {
        None => {}
        Some(toml::Value::String(s)) if ["block", "axis"].contains(&s.as_str()) => {}
        Some(_) => errors.push("[led] line_align must be \"block\" or \"axis\"".into()),
    }
    int_in(config, "link", "baudrate", 1..=4_000_000, errors);
    int_in(config, "link", "command_timeout_ms", 0..=u32::MAX as i64, errors);
}

fn validate_render(config: &toml::Value, errors: &mut Vec<String>) {
    int_in(config, "render", "refresh_ms", 1..=1000, errors);
    match config.get("render").and_then(|s| s.get("tint")) {
        None => {}
        Some(toml::Value::Array(channels))
            if channels.len() == 3
                && channels
                    .iter()
                    .all(|c| matches!(c.as_integer(), Some(0..=255))) => {}
        Some(_) => errors.push("[render] tint must be [r, g, b] with values 0-255".into()),
    }
}
