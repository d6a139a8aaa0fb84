//! Configuration type definitions

use heapless::String;

use neogrid_protocol::{ID_LEN, VERSION_LEN};

use crate::render::Rgb;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default serial baudrate
pub const DEFAULT_BAUDRATE: u32 = 115_200;

/// Default time allowed for a command's payload to arrive
pub const DEFAULT_COMMAND_TIMEOUT_MS: u32 = 100;

/// Default render interval (about 60 Hz)
pub const DEFAULT_REFRESH_MS: u32 = 16;

/// Behaviour of the ring "all" command (0x91)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RingFillMode {
    /// Fill the ring with the requested level
    #[default]
    Fill,
    /// Zero the ring regardless of level, as older firmware did
    ZeroRing,
}

/// Origin used by the level row/col commands (0x1B, 0x1C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LineAlign {
    /// Align both coordinates to the 8×8 block, like 0x1A
    #[default]
    Block,
    /// Align only the axis the line runs along
    Axis,
}

/// Identity reported to the host
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IdentityConfig {
    /// Device id returned by sys/id
    pub id: String<ID_LEN>,
    /// Version string returned by 0x0F
    pub firmware_version: String<VERSION_LEN>,
    /// Advertise as monome-compatible
    pub monome: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        let mut id = String::new();
        let _ = id.push_str("neo-monome");
        Self {
            id,
            firmware_version: String::new(),
            monome: true,
        }
    }
}

/// Grid geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridConfig {
    /// Device acts as a grid (false for arc-only devices)
    pub enabled: bool,
    pub rows: u8,
    pub cols: u8,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rows: 8,
            cols: 16,
        }
    }
}

/// Arc geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArcConfig {
    /// Number of encoders (rings), 0 for none
    pub encoders: u8,
}

/// Initial LED behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LedConfig {
    /// Level used by "on" and "all on" (0-15)
    pub brightness: u8,
    /// Decoded levels at or below this are stored as 0 (0-15)
    pub vari_mono_thresh: u8,
    pub ring_fill: RingFillMode,
    pub line_align: LineAlign,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            brightness: 15,
            vari_mono_thresh: 0,
            ring_fill: RingFillMode::Fill,
            line_align: LineAlign::Block,
        }
    }
}

/// Serial link settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    pub baudrate: u32,
    /// Partial commands older than this are dropped; 0 waits forever
    pub command_timeout_ms: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baudrate: DEFAULT_BAUDRATE,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
        }
    }
}

/// Rendering settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderConfig {
    /// Colour of a fully lit key
    pub tint: Rgb,
    /// Interval between pixel refreshes
    pub refresh_ms: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tint: Rgb::WHITE,
            refresh_ms: DEFAULT_REFRESH_MS,
        }
    }
}

/// Complete device configuration
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceConfig {
    pub device: IdentityConfig,
    pub grid: GridConfig,
    pub arc: ArcConfig,
    pub led: LedConfig,
    pub link: LinkConfig,
    pub render: RenderConfig,
}

impl DeviceConfig {
    /// Grid rows the device exposes (0 when the grid is disabled)
    pub fn grid_rows(&self) -> u8 {
        if self.grid.enabled {
            self.grid.rows
        } else {
            0
        }
    }

    /// Grid columns the device exposes (0 when the grid is disabled)
    pub fn grid_cols(&self) -> u8 {
        if self.grid.enabled {
            self.grid.cols
        } else {
            0
        }
    }
}
