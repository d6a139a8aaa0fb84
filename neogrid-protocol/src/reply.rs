//! Device-to-host messages
//!
//! Everything the device writes back: query replies and locally generated
//! input events. All messages are a few fixed-size bytes; string fields are
//! zero padded to their wire width.

use heapless::Vec;

use crate::opcode::{
    ENC_DELTA, ENC_KEY_DOWN, ENC_KEY_UP, ID_LEN, KEY_DOWN, KEY_UP, SYS_GET_ID, SYS_QUERY,
    VERSION_LEN,
};

/// Largest encoded message ([0x01] + 32-byte id)
pub const MAX_MESSAGE_SIZE: usize = 1 + ID_LEN;

// Reply headers
const REPLY_QUERY: u8 = 0x00;
const REPLY_ID: u8 = SYS_GET_ID;
const REPLY_GRID_OFFSET: u8 = 0x02;
const REPLY_GRID_SIZE: u8 = 0x03;

// Subsystem numbers in the query reply
const SUBSYSTEM_LED_GRID: u8 = 0x01;
const SUBSYSTEM_KEY_GRID: u8 = 0x02;

/// Errors that can occur during message encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Messages from the device to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMessage<'a> {
    /// sys/query reply: led-grid and key-grid subsystems, `quads` each
    QueryReply { quads: u8 },
    /// sys/id reply; truncated to 32 bytes, zero padded
    Id(&'a str),
    /// Grid offset report
    GridOffset { n: u8, x: u8, y: u8 },
    /// Grid size report
    GridSize { cols: u8, rows: u8 },
    /// Firmware version; 8 zero-padded bytes with no header
    FirmwareVersion(&'a str),
    /// Grid key edge
    GridKey { x: u8, y: u8, pressed: bool },
    /// Encoder key edge
    ArcKey { index: u8, pressed: bool },
    /// Encoder rotation
    ArcDelta { index: u8, delta: i8 },
    /// Ask the other side to identify itself (sys/query request)
    InfoRequest,
}

impl DeviceMessage<'_> {
    /// Number of bytes this message occupies on the wire
    pub fn encoded_len(&self) -> usize {
        match self {
            DeviceMessage::QueryReply { .. } => 6,
            DeviceMessage::Id(_) => 1 + ID_LEN,
            DeviceMessage::GridOffset { .. } => 4,
            DeviceMessage::GridSize { .. } => 3,
            DeviceMessage::FirmwareVersion(_) => VERSION_LEN,
            DeviceMessage::GridKey { .. } => 3,
            DeviceMessage::ArcKey { .. } => 2,
            DeviceMessage::ArcDelta { .. } => 3,
            DeviceMessage::InfoRequest => 1,
        }
    }

    /// Encode this message into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, EncodeError> {
        let len = self.encoded_len();
        if buffer.len() < len {
            return Err(EncodeError::BufferTooSmall);
        }
        let out = &mut buffer[..len];

        match *self {
            DeviceMessage::QueryReply { quads } => out.copy_from_slice(&[
                REPLY_QUERY,
                SUBSYSTEM_LED_GRID,
                quads,
                REPLY_QUERY,
                SUBSYSTEM_KEY_GRID,
                quads,
            ]),
            DeviceMessage::Id(id) => {
                out[0] = REPLY_ID;
                write_padded(&mut out[1..], id);
            }
            DeviceMessage::GridOffset { n, x, y } => {
                out.copy_from_slice(&[REPLY_GRID_OFFSET, n, x, y])
            }
            DeviceMessage::GridSize { cols, rows } => {
                out.copy_from_slice(&[REPLY_GRID_SIZE, cols, rows])
            }
            DeviceMessage::FirmwareVersion(version) => write_padded(out, version),
            DeviceMessage::GridKey { x, y, pressed } => {
                let op = if pressed { KEY_DOWN } else { KEY_UP };
                out.copy_from_slice(&[op, x, y]);
            }
            DeviceMessage::ArcKey { index, pressed } => {
                let op = if pressed { ENC_KEY_DOWN } else { ENC_KEY_UP };
                out.copy_from_slice(&[op, index]);
            }
            DeviceMessage::ArcDelta { index, delta } => {
                out.copy_from_slice(&[ENC_DELTA, index, delta as u8])
            }
            DeviceMessage::InfoRequest => out[0] = SYS_QUERY,
        }

        Ok(len)
    }

    /// Encode this message into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_MESSAGE_SIZE>, EncodeError> {
        let mut buffer = [0u8; MAX_MESSAGE_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| EncodeError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// Copy `text` into `field`, truncating to the field and zero filling the rest
fn write_padded(field: &mut [u8], text: &str) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(field.len());
    field[..len].copy_from_slice(&bytes[..len]);
    field[len..].fill(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_reply() {
        let bytes = DeviceMessage::QueryReply { quads: 2 }.encode_to_vec().unwrap();
        assert_eq!(&bytes[..], &[0x00, 0x01, 2, 0x00, 0x02, 2]);
    }

    #[test]
    fn test_id_is_padded_to_32() {
        let bytes = DeviceMessage::Id("mydevice").encode_to_vec().unwrap();
        assert_eq!(bytes.len(), 33);
        assert_eq!(bytes[0], 0x01);
        assert_eq!(&bytes[1..9], b"mydevice");
        assert!(bytes[9..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_oversized_id_is_truncated() {
        let long = "0123456789abcdef0123456789abcdef-overflow";
        let bytes = DeviceMessage::Id(long).encode_to_vec().unwrap();
        assert_eq!(bytes.len(), 33);
        assert_eq!(&bytes[1..], &long.as_bytes()[..32]);
    }

    #[test]
    fn test_firmware_version_has_no_header() {
        let bytes = DeviceMessage::FirmwareVersion("").encode_to_vec().unwrap();
        assert_eq!(&bytes[..], &[0u8; 8]);

        let bytes = DeviceMessage::FirmwareVersion("1.2").encode_to_vec().unwrap();
        assert_eq!(&bytes[..], b"1.2\0\0\0\0\0");
    }

    #[test]
    fn test_offset_and_size() {
        let bytes = DeviceMessage::GridOffset { n: 1, x: 0, y: 0 }
            .encode_to_vec()
            .unwrap();
        assert_eq!(&bytes[..], &[0x02, 1, 0, 0]);

        let bytes = DeviceMessage::GridSize { cols: 16, rows: 8 }
            .encode_to_vec()
            .unwrap();
        assert_eq!(&bytes[..], &[0x03, 16, 8]);
    }

    #[test]
    fn test_input_messages() {
        let down = DeviceMessage::GridKey {
            x: 3,
            y: 4,
            pressed: true,
        };
        assert_eq!(&down.encode_to_vec().unwrap()[..], &[0x21, 3, 4]);

        let up = DeviceMessage::GridKey {
            x: 3,
            y: 4,
            pressed: false,
        };
        assert_eq!(&up.encode_to_vec().unwrap()[..], &[0x20, 3, 4]);

        let key = DeviceMessage::ArcKey {
            index: 1,
            pressed: true,
        };
        assert_eq!(&key.encode_to_vec().unwrap()[..], &[0x52, 1]);

        let turn = DeviceMessage::ArcDelta {
            index: 0,
            delta: -1,
        };
        assert_eq!(&turn.encode_to_vec().unwrap()[..], &[0x50, 0, 0xFF]);

        assert_eq!(
            &DeviceMessage::InfoRequest.encode_to_vec().unwrap()[..],
            &[0x00]
        );
    }

    #[test]
    fn test_every_message_fits_max_size() {
        let long = "0123456789abcdef0123456789abcdef-overflow";
        let messages = [
            DeviceMessage::QueryReply { quads: 2 },
            DeviceMessage::Id(long),
            DeviceMessage::GridOffset { n: 1, x: 0, y: 0 },
            DeviceMessage::GridSize { cols: 16, rows: 16 },
            DeviceMessage::FirmwareVersion(long),
            DeviceMessage::GridKey {
                x: 0,
                y: 0,
                pressed: true,
            },
            DeviceMessage::ArcKey {
                index: 0,
                pressed: false,
            },
            DeviceMessage::ArcDelta { index: 3, delta: 1 },
            DeviceMessage::InfoRequest,
        ];
        for message in messages {
            assert!(message.encoded_len() <= MAX_MESSAGE_SIZE);
            let mut buf = [0u8; MAX_MESSAGE_SIZE];
            assert_eq!(message.encode(&mut buf), Ok(message.encoded_len()));
        }
    }

    #[test]
    fn test_buffer_too_small() {
        let mut buf = [0u8; 2];
        assert_eq!(
            DeviceMessage::GridSize { cols: 8, rows: 8 }.encode(&mut buf),
            Err(EncodeError::BufferTooSmall)
        );
    }
}
