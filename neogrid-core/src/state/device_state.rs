//! Identity and configuration state

use heapless::String;

use neogrid_protocol::{ID_LEN, VERSION_LEN};

use crate::config::{LineAlign, RingFillMode};

/// Device id, at most 32 bytes of UTF-8
pub type DeviceId = String<ID_LEN>;

/// Firmware version, at most 8 bytes of UTF-8
pub type FirmwareVersion = String<VERSION_LEN>;

/// Grid offset as last set by the host
///
/// Stored and reported only; it never changes LED addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GridOffset {
    pub n: u8,
    pub x: u8,
    pub y: u8,
}

impl Default for GridOffset {
    fn default() -> Self {
        Self { n: 1, x: 0, y: 0 }
    }
}

/// Everything about the device except LED levels and queued input
#[derive(Debug, Clone)]
pub struct DeviceState {
    pub active: bool,
    pub is_monome: bool,
    pub is_grid: bool,
    rows: u8,
    cols: u8,
    encoders: u8,
    id: DeviceId,
    firmware_version: FirmwareVersion,
    pub grid_offset: GridOffset,
    brightness: u8,
    vari_mono_thresh: u8,
    pub ring_fill: RingFillMode,
    /// Origin rule for the level row/col commands
    pub line_align: LineAlign,
    grid_dirty: bool,
    arc_dirty: bool,
}

impl DeviceState {
    pub fn new(
        active: bool,
        is_monome: bool,
        is_grid: bool,
        rows: u8,
        cols: u8,
        encoders: u8,
    ) -> Self {
        Self {
            active,
            is_monome,
            is_grid,
            rows,
            cols,
            encoders,
            id: DeviceId::new(),
            firmware_version: FirmwareVersion::new(),
            grid_offset: GridOffset::default(),
            brightness: 15,
            vari_mono_thresh: 0,
            ring_fill: RingFillMode::default(),
            line_align: LineAlign::default(),
            grid_dirty: false,
            arc_dirty: false,
        }
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn encoders(&self) -> u8 {
        self.encoders
    }

    /// Quads reported by sys/query: cols / rows, or 0 for a gridless device
    pub fn quads(&self) -> u8 {
        if self.rows == 0 {
            0
        } else {
            self.cols / self.rows
        }
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Replace the id, truncating to 32 bytes on a character boundary
    pub fn set_id(&mut self, id: &str) {
        self.id = truncated(id);
    }

    /// Replace the id from a 32-byte wire field
    ///
    /// Trailing zero padding is dropped. Invalid UTF-8 keeps only the
    /// longest valid prefix.
    pub fn set_id_from_wire(&mut self, raw: &[u8]) {
        let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        let raw = &raw[..end];
        let text = match core::str::from_utf8(raw) {
            Ok(text) => text,
            // valid_up_to is always a char boundary
            Err(e) => core::str::from_utf8(&raw[..e.valid_up_to()]).unwrap_or(""),
        };
        self.set_id(text);
    }

    pub fn firmware_version(&self) -> &str {
        self.firmware_version.as_str()
    }

    pub fn set_firmware_version(&mut self, version: &str) {
        self.firmware_version = truncated(version);
    }

    /// Level written by "on" and "all on"
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn set_brightness(&mut self, level: u8) {
        self.brightness = level & 0x0F;
    }

    /// Decoded levels at or below this are stored as 0
    pub fn vari_mono_thresh(&self) -> u8 {
        self.vari_mono_thresh
    }

    pub fn set_vari_mono_thresh(&mut self, level: u8) {
        self.vari_mono_thresh = level & 0x0F;
    }

    /// Apply the variable-brightness threshold to a decoded level
    pub fn clamp_level(&self, level: u8) -> u8 {
        if level > self.vari_mono_thresh {
            level
        } else {
            0
        }
    }

    pub fn mark_grid_dirty(&mut self) {
        self.grid_dirty = true;
    }

    pub fn mark_arc_dirty(&mut self) {
        self.arc_dirty = true;
    }

    pub fn grid_dirty(&self) -> bool {
        self.grid_dirty
    }

    pub fn arc_dirty(&self) -> bool {
        self.arc_dirty
    }

    /// Read and clear the grid dirty flag
    pub fn take_grid_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.grid_dirty, false)
    }

    /// Read and clear the arc dirty flag
    pub fn take_arc_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.arc_dirty, false)
    }
}

/// Longest prefix of `text` that fits in `N` bytes without splitting a char
fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut end = text.len().min(N);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::new();
    // Fits by construction
    let _ = out.push_str(&text[..end]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> DeviceState {
        DeviceState::new(true, true, true, 8, 16, 0)
    }

    #[test]
    fn test_defaults() {
        let s = state();
        assert_eq!(s.brightness(), 15);
        assert_eq!(s.vari_mono_thresh(), 0);
        assert_eq!(s.grid_offset, GridOffset { n: 1, x: 0, y: 0 });
        assert_eq!(s.id(), "");
        assert_eq!(s.firmware_version(), "");
        assert!(!s.grid_dirty());
    }

    #[test]
    fn test_quads() {
        assert_eq!(state().quads(), 2);
        assert_eq!(DeviceState::new(true, true, false, 0, 0, 4).quads(), 0);
        assert_eq!(DeviceState::new(true, true, true, 8, 8, 0).quads(), 1);
    }

    #[test]
    fn test_id_truncates_on_char_boundary() {
        let mut s = state();
        // 31 ASCII bytes followed by a 2-byte char
        let mut long = "a".repeat(31);
        long.push('é');
        s.set_id(&long);
        assert_eq!(s.id().len(), 31);
        assert!(s.id().chars().all(|c| c == 'a'));
    }

    #[test]
    fn test_id_from_wire_strips_padding() {
        let mut s = state();
        let mut raw = [0u8; 32];
        raw[..8].copy_from_slice(b"mydevice");
        s.set_id_from_wire(&raw);
        assert_eq!(s.id(), "mydevice");
    }

    #[test]
    fn test_id_from_wire_keeps_valid_prefix() {
        let mut s = state();
        let mut raw = [0u8; 32];
        raw[..4].copy_from_slice(b"grid");
        raw[4] = 0xFF;
        raw[5] = b'x';
        s.set_id_from_wire(&raw);
        assert_eq!(s.id(), "grid");
    }

    #[test]
    fn test_threshold_clamp() {
        let mut s = state();
        assert_eq!(s.clamp_level(0), 0);
        assert_eq!(s.clamp_level(1), 1);
        s.set_vari_mono_thresh(7);
        assert_eq!(s.clamp_level(7), 0);
        assert_eq!(s.clamp_level(8), 8);
    }

    #[test]
    fn test_dirty_flags_are_consumed() {
        let mut s = state();
        s.mark_grid_dirty();
        assert!(s.take_grid_dirty());
        assert!(!s.take_grid_dirty());
        s.mark_arc_dirty();
        assert!(s.arc_dirty());
        assert!(s.take_arc_dirty());
        assert!(!s.arc_dirty());
    }
}
