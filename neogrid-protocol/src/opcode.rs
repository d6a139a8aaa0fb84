//! Opcode table
//!
//! Byte values here are the single source of truth for host
//! interoperability. Each opcode implies the exact number of payload bytes
//! that follow it on the wire.

// Opcode bytes: system section
pub const SYS_QUERY: u8 = 0x00;
pub const SYS_GET_ID: u8 = 0x01;
pub const SYS_SET_ID: u8 = 0x02;
pub const SYS_GET_GRID_OFFSET: u8 = 0x03;
pub const SYS_SET_GRID_OFFSET: u8 = 0x04;
pub const SYS_GET_GRID_SIZE: u8 = 0x05;
pub const SYS_SET_GRID_SIZE: u8 = 0x06;
pub const SYS_SET_ADDRESS: u8 = 0x08;
pub const SYS_GET_FIRMWARE_VERSION: u8 = 0x0F;

// Opcode bytes: led-grid section
pub const LED_OFF: u8 = 0x10;
pub const LED_ON: u8 = 0x11;
pub const LED_ALL_OFF: u8 = 0x12;
pub const LED_ALL_ON: u8 = 0x13;
pub const LED_MAP: u8 = 0x14;
pub const LED_ROW: u8 = 0x15;
pub const LED_COL: u8 = 0x16;
pub const LED_INTENSITY: u8 = 0x17;
pub const LED_LEVEL_SET: u8 = 0x18;
pub const LED_LEVEL_ALL: u8 = 0x19;
pub const LED_LEVEL_MAP: u8 = 0x1A;
pub const LED_LEVEL_ROW: u8 = 0x1B;
pub const LED_LEVEL_COL: u8 = 0x1C;

// Opcode bytes: key-grid section
pub const KEY_UP: u8 = 0x20;
pub const KEY_DOWN: u8 = 0x21;

// Opcode bytes: encoder section
pub const ENC_DELTA: u8 = 0x50;
pub const ENC_KEY_UP: u8 = 0x51;
pub const ENC_KEY_DOWN: u8 = 0x52;

// Opcode bytes: tilt section (reserved)
pub const TILT_ACTIVE: u8 = 0x80;
pub const TILT: u8 = 0x81;

// Opcode bytes: led-ring section
pub const RING_SET: u8 = 0x90;
pub const RING_ALL: u8 = 0x91;
pub const RING_MAP: u8 = 0x92;
pub const RING_RANGE: u8 = 0x93;

/// Length of the device id field on the wire
///
/// The published protocol notes list 64 bytes; serialosc and the hosts this
/// device is paired with read 32.
pub const ID_LEN: usize = 32;

/// Length of the firmware version field on the wire
pub const VERSION_LEN: usize = 8;

/// Cells in one 8×8 block or one arc ring, packed two per byte
pub const PACKED_BLOCK_LEN: usize = 32;

/// Largest payload of any opcode (led level map: x, y, 32 packed bytes)
pub const MAX_PAYLOAD_SIZE: usize = 2 + PACKED_BLOCK_LEN;

/// A recognised protocol command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    Query,
    GetId,
    SetId,
    GetGridOffset,
    SetGridOffset,
    GetGridSize,
    SetGridSize,
    SetAddress,
    GetFirmwareVersion,
    LedOff,
    LedOn,
    LedAllOff,
    LedAllOn,
    LedMap,
    LedRow,
    LedCol,
    LedIntensity,
    LedLevelSet,
    LedLevelAll,
    LedLevelMap,
    LedLevelRow,
    LedLevelCol,
    KeyUp,
    KeyDown,
    EncDelta,
    EncKeyUp,
    EncKeyDown,
    TiltActive,
    Tilt,
    RingSet,
    RingAll,
    RingMap,
    RingRange,
}

impl Opcode {
    /// Every opcode, in wire order
    pub const ALL: [Opcode; 33] = [
        Opcode::Query,
        Opcode::GetId,
        Opcode::SetId,
        Opcode::GetGridOffset,
        Opcode::SetGridOffset,
        Opcode::GetGridSize,
        Opcode::SetGridSize,
        Opcode::SetAddress,
        Opcode::GetFirmwareVersion,
        Opcode::LedOff,
        Opcode::LedOn,
        Opcode::LedAllOff,
        Opcode::LedAllOn,
        Opcode::LedMap,
        Opcode::LedRow,
        Opcode::LedCol,
        Opcode::LedIntensity,
        Opcode::LedLevelSet,
        Opcode::LedLevelAll,
        Opcode::LedLevelMap,
        Opcode::LedLevelRow,
        Opcode::LedLevelCol,
        Opcode::KeyUp,
        Opcode::KeyDown,
        Opcode::EncDelta,
        Opcode::EncKeyUp,
        Opcode::EncKeyDown,
        Opcode::TiltActive,
        Opcode::Tilt,
        Opcode::RingSet,
        Opcode::RingAll,
        Opcode::RingMap,
        Opcode::RingRange,
    ];

    /// Look up an opcode byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        let op = match byte {
            SYS_QUERY => Opcode::Query,
            SYS_GET_ID => Opcode::GetId,
            SYS_SET_ID => Opcode::SetId,
            SYS_GET_GRID_OFFSET => Opcode::GetGridOffset,
            SYS_SET_GRID_OFFSET => Opcode::SetGridOffset,
            SYS_GET_GRID_SIZE => Opcode::GetGridSize,
            SYS_SET_GRID_SIZE => Opcode::SetGridSize,
            SYS_SET_ADDRESS => Opcode::SetAddress,
            SYS_GET_FIRMWARE_VERSION => Opcode::GetFirmwareVersion,
            LED_OFF => Opcode::LedOff,
            LED_ON => Opcode::LedOn,
            LED_ALL_OFF => Opcode::LedAllOff,
            LED_ALL_ON => Opcode::LedAllOn,
            LED_MAP => Opcode::LedMap,
            LED_ROW => Opcode::LedRow,
            LED_COL => Opcode::LedCol,
            LED_INTENSITY => Opcode::LedIntensity,
            LED_LEVEL_SET => Opcode::LedLevelSet,
            LED_LEVEL_ALL => Opcode::LedLevelAll,
            LED_LEVEL_MAP => Opcode::LedLevelMap,
            LED_LEVEL_ROW => Opcode::LedLevelRow,
            LED_LEVEL_COL => Opcode::LedLevelCol,
            KEY_UP => Opcode::KeyUp,
            KEY_DOWN => Opcode::KeyDown,
            ENC_DELTA => Opcode::EncDelta,
            ENC_KEY_UP => Opcode::EncKeyUp,
            ENC_KEY_DOWN => Opcode::EncKeyDown,
            TILT_ACTIVE => Opcode::TiltActive,
            TILT => Opcode::Tilt,
            RING_SET => Opcode::RingSet,
            RING_ALL => Opcode::RingAll,
            RING_MAP => Opcode::RingMap,
            RING_RANGE => Opcode::RingRange,
            _ => return None,
        };
        Some(op)
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            Opcode::Query => SYS_QUERY,
            Opcode::GetId => SYS_GET_ID,
            Opcode::SetId => SYS_SET_ID,
            Opcode::GetGridOffset => SYS_GET_GRID_OFFSET,
            Opcode::SetGridOffset => SYS_SET_GRID_OFFSET,
            Opcode::GetGridSize => SYS_GET_GRID_SIZE,
            Opcode::SetGridSize => SYS_SET_GRID_SIZE,
            Opcode::SetAddress => SYS_SET_ADDRESS,
            Opcode::GetFirmwareVersion => SYS_GET_FIRMWARE_VERSION,
            Opcode::LedOff => LED_OFF,
            Opcode::LedOn => LED_ON,
            Opcode::LedAllOff => LED_ALL_OFF,
            Opcode::LedAllOn => LED_ALL_ON,
            Opcode::LedMap => LED_MAP,
            Opcode::LedRow => LED_ROW,
            Opcode::LedCol => LED_COL,
            Opcode::LedIntensity => LED_INTENSITY,
            Opcode::LedLevelSet => LED_LEVEL_SET,
            Opcode::LedLevelAll => LED_LEVEL_ALL,
            Opcode::LedLevelMap => LED_LEVEL_MAP,
            Opcode::LedLevelRow => LED_LEVEL_ROW,
            Opcode::LedLevelCol => LED_LEVEL_COL,
            Opcode::KeyUp => KEY_UP,
            Opcode::KeyDown => KEY_DOWN,
            Opcode::EncDelta => ENC_DELTA,
            Opcode::EncKeyUp => ENC_KEY_UP,
            Opcode::EncKeyDown => ENC_KEY_DOWN,
            Opcode::TiltActive => TILT_ACTIVE,
            Opcode::Tilt => TILT,
            Opcode::RingSet => RING_SET,
            Opcode::RingAll => RING_ALL,
            Opcode::RingMap => RING_MAP,
            Opcode::RingRange => RING_RANGE,
        }
    }

    /// Number of payload bytes that follow this opcode
    pub fn payload_len(self) -> usize {
        match self {
            Opcode::Query
            | Opcode::GetId
            | Opcode::GetGridOffset
            | Opcode::GetGridSize
            | Opcode::GetFirmwareVersion
            | Opcode::LedAllOff
            | Opcode::LedAllOn
            | Opcode::TiltActive
            | Opcode::Tilt => 0,
            Opcode::SetId => ID_LEN,
            Opcode::LedIntensity
            | Opcode::LedLevelAll
            | Opcode::EncKeyUp
            | Opcode::EncKeyDown => 1,
            Opcode::SetGridSize
            | Opcode::SetAddress
            | Opcode::LedOff
            | Opcode::LedOn
            | Opcode::KeyUp
            | Opcode::KeyDown
            | Opcode::EncDelta
            | Opcode::RingAll => 2,
            Opcode::SetGridOffset
            | Opcode::LedRow
            | Opcode::LedCol
            | Opcode::LedLevelSet
            | Opcode::RingSet => 3,
            Opcode::RingRange => 4,
            Opcode::LedLevelRow | Opcode::LedLevelCol => 2 + 4,
            Opcode::LedMap => 2 + 8,
            Opcode::RingMap => 1 + PACKED_BLOCK_LEN,
            Opcode::LedLevelMap => 2 + PACKED_BLOCK_LEN,
        }
    }

    /// Returns true for commands that change grid LEDs
    pub fn touches_grid(self) -> bool {
        matches!(
            self,
            Opcode::LedOff
                | Opcode::LedOn
                | Opcode::LedAllOff
                | Opcode::LedAllOn
                | Opcode::LedMap
                | Opcode::LedRow
                | Opcode::LedCol
                | Opcode::LedLevelSet
                | Opcode::LedLevelAll
                | Opcode::LedLevelMap
                | Opcode::LedLevelRow
                | Opcode::LedLevelCol
        )
    }

    /// Returns true for commands that change ring LEDs
    pub fn touches_arc(self) -> bool {
        matches!(
            self,
            Opcode::RingSet | Opcode::RingAll | Opcode::RingMap | Opcode::RingRange
        )
    }
}

/// Align a coordinate to the origin of its 8×8 block
///
/// Masking, not rounding: `10 & 0xF8 == 8`, `5 & 0xF8 == 0`.
pub const fn block_origin(coord: u8) -> u8 {
    coord & 0xF8
}
