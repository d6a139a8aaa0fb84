//! Host-to-device commands
//!
//! A [`Packet`] carries raw bytes; [`HostCommand`] gives each opcode its
//! typed payload. Decoding is a pure function of the packet, so every row of
//! the opcode table can be exercised on its own.

use heapless::Vec;

use crate::opcode::{Opcode, ID_LEN, MAX_PAYLOAD_SIZE, PACKED_BLOCK_LEN};
use crate::parser::Packet;

/// Cells in an 8×8 block or an arc ring
pub const BLOCK_CELLS: usize = 2 * PACKED_BLOCK_LEN;

/// Largest encoded command (opcode + payload)
pub const MAX_COMMAND_SIZE: usize = 1 + MAX_PAYLOAD_SIZE;

/// Errors that can occur turning a packet into a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Payload length does not match the opcode table
    Length { opcode: Opcode, len: usize },
}

/// Commands sent by the host
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCommand {
    /// Request device information
    Query,
    /// Request the device id
    GetId,
    /// Write the device id (zero padded)
    SetId { raw: [u8; ID_LEN] },
    /// Request the grid offset
    GetGridOffset,
    /// Set the grid offset of device `n`
    SetGridOffset { n: u8, x: u8, y: u8 },
    /// Request the grid size
    GetGridSize,
    /// Set the grid size
    SetGridSize { x: u8, y: u8 },
    /// Reassign the device address
    SetAddress { a: u8, b: u8 },
    /// Request the firmware version string
    GetFirmwareVersion,
    /// Turn one LED off
    LedOff { x: u8, y: u8 },
    /// Turn one LED on at the global brightness
    LedOn { x: u8, y: u8 },
    /// Turn every LED off
    LedAllOff,
    /// Turn every LED on at the global brightness
    LedAllOn,
    /// On/off bitmask for an 8×8 block, one byte per row
    LedMap { x: u8, y: u8, rows: [u8; 8] },
    /// On/off bitmask for 8 LEDs in a row
    LedRow { x: u8, y: u8, mask: u8 },
    /// On/off bitmask for 8 LEDs in a column
    LedCol { x: u8, y: u8, mask: u8 },
    /// Set the global brightness
    LedIntensity { level: u8 },
    /// Set one LED to an explicit level
    LedLevelSet { x: u8, y: u8, level: u8 },
    /// Set every LED to an explicit level
    LedLevelAll { level: u8 },
    /// Levels for an 8×8 block, row-major
    LedLevelMap { x: u8, y: u8, levels: [u8; BLOCK_CELLS] },
    /// Levels for 8 LEDs in a row
    LedLevelRow { x: u8, y: u8, levels: [u8; 8] },
    /// Levels for 8 LEDs in a column
    LedLevelCol { x: u8, y: u8, levels: [u8; 8] },
    /// Key released
    KeyUp { x: u8, y: u8 },
    /// Key pressed
    KeyDown { x: u8, y: u8 },
    /// Encoder turned by a signed amount
    EncDelta { index: u8, delta: i8 },
    /// Encoder key released
    EncKeyUp { index: u8 },
    /// Encoder key pressed
    EncKeyDown { index: u8 },
    /// Tilt sensor messages; reserved
    Tilt(Opcode),
    /// Set one ring LED
    RingSet { ring: u8, pos: u8, level: u8 },
    /// Set every LED of a ring
    RingAll { ring: u8, level: u8 },
    /// Levels for all 64 ring positions
    RingMap { ring: u8, levels: [u8; BLOCK_CELLS] },
    /// Set a (possibly wrapping) range of ring positions
    RingRange { ring: u8, start: u8, end: u8, level: u8 },
}

impl HostCommand {
    /// Parse a command from a framed packet
    pub fn decode(packet: &Packet) -> Result<Self, DecodeError> {
        let opcode = packet.opcode;
        let p = &packet.payload[..];
        if p.len() != opcode.payload_len() {
            return Err(DecodeError::Length {
                opcode,
                len: p.len(),
            });
        }

        let cmd = match opcode {
            Opcode::Query => HostCommand::Query,
            Opcode::GetId => HostCommand::GetId,
            Opcode::SetId => {
                let mut raw = [0u8; ID_LEN];
                raw.copy_from_slice(p);
                HostCommand::SetId { raw }
            }
            Opcode::GetGridOffset => HostCommand::GetGridOffset,
            Opcode::SetGridOffset => HostCommand::SetGridOffset {
                n: p[0],
                x: p[1],
                y: p[2],
            },
            Opcode::GetGridSize => HostCommand::GetGridSize,
            Opcode::SetGridSize => HostCommand::SetGridSize { x: p[0], y: p[1] },
            Opcode::SetAddress => HostCommand::SetAddress { a: p[0], b: p[1] },
            Opcode::GetFirmwareVersion => HostCommand::GetFirmwareVersion,
            Opcode::LedOff => HostCommand::LedOff { x: p[0], y: p[1] },
            Opcode::LedOn => HostCommand::LedOn { x: p[0], y: p[1] },
            Opcode::LedAllOff => HostCommand::LedAllOff,
            Opcode::LedAllOn => HostCommand::LedAllOn,
            Opcode::LedMap => {
                let mut rows = [0u8; 8];
                rows.copy_from_slice(&p[2..]);
                HostCommand::LedMap {
                    x: p[0],
                    y: p[1],
                    rows,
                }
            }
            Opcode::LedRow => HostCommand::LedRow {
                x: p[0],
                y: p[1],
                mask: p[2],
            },
            Opcode::LedCol => HostCommand::LedCol {
                x: p[0],
                y: p[1],
                mask: p[2],
            },
            Opcode::LedIntensity => HostCommand::LedIntensity { level: p[0] },
            Opcode::LedLevelSet => HostCommand::LedLevelSet {
                x: p[0],
                y: p[1],
                level: p[2],
            },
            Opcode::LedLevelAll => HostCommand::LedLevelAll { level: p[0] },
            Opcode::LedLevelMap => HostCommand::LedLevelMap {
                x: p[0],
                y: p[1],
                levels: unpack_levels(&p[2..]),
            },
            Opcode::LedLevelRow => HostCommand::LedLevelRow {
                x: p[0],
                y: p[1],
                levels: unpack_levels(&p[2..]),
            },
            Opcode::LedLevelCol => HostCommand::LedLevelCol {
                x: p[0],
                y: p[1],
                levels: unpack_levels(&p[2..]),
            },
            Opcode::KeyUp => HostCommand::KeyUp { x: p[0], y: p[1] },
            Opcode::KeyDown => HostCommand::KeyDown { x: p[0], y: p[1] },
            Opcode::EncDelta => HostCommand::EncDelta {
                index: p[0],
                delta: p[1] as i8,
            },
            Opcode::EncKeyUp => HostCommand::EncKeyUp { index: p[0] },
            Opcode::EncKeyDown => HostCommand::EncKeyDown { index: p[0] },
            Opcode::TiltActive | Opcode::Tilt => HostCommand::Tilt(opcode),
            Opcode::RingSet => HostCommand::RingSet {
                ring: p[0],
                pos: p[1],
                level: p[2],
            },
            Opcode::RingAll => HostCommand::RingAll {
                ring: p[0],
                level: p[1],
            },
            Opcode::RingMap => HostCommand::RingMap {
                ring: p[0],
                levels: unpack_levels(&p[1..]),
            },
            Opcode::RingRange => HostCommand::RingRange {
                ring: p[0],
                start: p[1],
                end: p[2],
                level: p[3],
            },
        };
        Ok(cmd)
    }

    /// Opcode this command is sent with
    pub fn opcode(&self) -> Opcode {
        match self {
            HostCommand::Query => Opcode::Query,
            HostCommand::GetId => Opcode::GetId,
            HostCommand::SetId { .. } => Opcode::SetId,
            HostCommand::GetGridOffset => Opcode::GetGridOffset,
            HostCommand::SetGridOffset { .. } => Opcode::SetGridOffset,
            HostCommand::GetGridSize => Opcode::GetGridSize,
            HostCommand::SetGridSize { .. } => Opcode::SetGridSize,
            HostCommand::SetAddress { .. } => Opcode::SetAddress,
            HostCommand::GetFirmwareVersion => Opcode::GetFirmwareVersion,
            HostCommand::LedOff { .. } => Opcode::LedOff,
            HostCommand::LedOn { .. } => Opcode::LedOn,
            HostCommand::LedAllOff => Opcode::LedAllOff,
            HostCommand::LedAllOn => Opcode::LedAllOn,
            HostCommand::LedMap { .. } => Opcode::LedMap,
            HostCommand::LedRow { .. } => Opcode::LedRow,
            HostCommand::LedCol { .. } => Opcode::LedCol,
            HostCommand::LedIntensity { .. } => Opcode::LedIntensity,
            HostCommand::LedLevelSet { .. } => Opcode::LedLevelSet,
            HostCommand::LedLevelAll { .. } => Opcode::LedLevelAll,
            HostCommand::LedLevelMap { .. } => Opcode::LedLevelMap,
            HostCommand::LedLevelRow { .. } => Opcode::LedLevelRow,
            HostCommand::LedLevelCol { .. } => Opcode::LedLevelCol,
            HostCommand::KeyUp { .. } => Opcode::KeyUp,
            HostCommand::KeyDown { .. } => Opcode::KeyDown,
            HostCommand::EncDelta { .. } => Opcode::EncDelta,
            HostCommand::EncKeyUp { .. } => Opcode::EncKeyUp,
            HostCommand::EncKeyDown { .. } => Opcode::EncKeyDown,
            HostCommand::Tilt(op) => *op,
            HostCommand::RingSet { .. } => Opcode::RingSet,
            HostCommand::RingAll { .. } => Opcode::RingAll,
            HostCommand::RingMap { .. } => Opcode::RingMap,
            HostCommand::RingRange { .. } => Opcode::RingRange,
        }
    }

    /// Encode this command as host software would send it
    ///
    /// Used by host-side tooling and tests to drive the device.
    pub fn encode(&self) -> Vec<u8, MAX_COMMAND_SIZE> {
        let mut out = Vec::new();
        // Every variant fits in MAX_COMMAND_SIZE by construction
        let _ = out.push(self.opcode().to_byte());
        let _ = match self {
            HostCommand::Query
            | HostCommand::GetId
            | HostCommand::GetGridOffset
            | HostCommand::GetGridSize
            | HostCommand::GetFirmwareVersion
            | HostCommand::LedAllOff
            | HostCommand::LedAllOn
            | HostCommand::Tilt(_) => Ok(()),
            HostCommand::SetId { raw } => out.extend_from_slice(raw),
            HostCommand::SetGridOffset { n, x, y } => out.extend_from_slice(&[*n, *x, *y]),
            HostCommand::SetGridSize { x, y } => out.extend_from_slice(&[*x, *y]),
            HostCommand::SetAddress { a, b } => out.extend_from_slice(&[*a, *b]),
            HostCommand::LedOff { x, y }
            | HostCommand::LedOn { x, y }
            | HostCommand::KeyUp { x, y }
            | HostCommand::KeyDown { x, y } => out.extend_from_slice(&[*x, *y]),
            HostCommand::LedMap { x, y, rows } => out
                .extend_from_slice(&[*x, *y])
                .and_then(|_| out.extend_from_slice(rows)),
            HostCommand::LedRow { x, y, mask } | HostCommand::LedCol { x, y, mask } => {
                out.extend_from_slice(&[*x, *y, *mask])
            }
            HostCommand::LedIntensity { level } | HostCommand::LedLevelAll { level } => {
                out.extend_from_slice(&[*level])
            }
            HostCommand::LedLevelSet { x, y, level } => out.extend_from_slice(&[*x, *y, *level]),
            HostCommand::LedLevelMap { x, y, levels } => {
                let packed: [u8; PACKED_BLOCK_LEN] = pack_levels(levels);
                out.extend_from_slice(&[*x, *y])
                    .and_then(|_| out.extend_from_slice(&packed))
            }
            HostCommand::LedLevelRow { x, y, levels } | HostCommand::LedLevelCol { x, y, levels } => {
                let packed: [u8; 4] = pack_levels(levels);
                out.extend_from_slice(&[*x, *y])
                    .and_then(|_| out.extend_from_slice(&packed))
            }
            HostCommand::EncDelta { index, delta } => out.extend_from_slice(&[*index, *delta as u8]),
            HostCommand::EncKeyUp { index } | HostCommand::EncKeyDown { index } => {
                out.extend_from_slice(&[*index])
            }
            HostCommand::RingSet { ring, pos, level } => out.extend_from_slice(&[*ring, *pos, *level]),
            HostCommand::RingAll { ring, level } => out.extend_from_slice(&[*ring, *level]),
            HostCommand::RingMap { ring, levels } => {
                let packed: [u8; PACKED_BLOCK_LEN] = pack_levels(levels);
                out.extend_from_slice(&[*ring])
                    .and_then(|_| out.extend_from_slice(&packed))
            }
            HostCommand::RingRange {
                ring,
                start,
                end,
                level,
            } => out.extend_from_slice(&[*ring, *start, *end, *level]),
        };
        out
    }
}

/// Expand nibble-pair packed bytes into one level per cell
///
/// Each byte holds two 4-bit levels, high nibble first: `0xAB` yields
/// `0xA` then `0xB`. Cells beyond `2 * packed.len()` stay zero.
pub fn unpack_levels<const N: usize>(packed: &[u8]) -> [u8; N] {
    let mut levels = [0u8; N];
    for (i, level) in levels.iter_mut().enumerate() {
        let Some(&byte) = packed.get(i / 2) else {
            break;
        };
        *level = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
    }
    levels
}

/// Pack levels two per byte, high nibble first
///
/// Levels are masked to 4 bits.
pub fn pack_levels<const N: usize>(levels: &[u8]) -> [u8; N] {
    let mut packed = [0u8; N];
    for (i, pair) in levels.chunks(2).take(N).enumerate() {
        let high = pair[0] & 0x0F;
        let low = pair.get(1).map_or(0, |l| l & 0x0F);
        packed[i] = (high << 4) | low;
    }
    packed
}
