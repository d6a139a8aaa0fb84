//! Command framing for the monome serial protocol.
//!
//! Parser states:
//! - AwaitingOpcode: the next byte selects a command
//! - AwaitingPayload(n): n payload bytes still outstanding
//!
//! A command is handed out the moment its last payload byte arrives, so the
//! "ready" state never persists between calls. Zero-payload commands are
//! ready on the opcode byte itself.
//!
//! The parser never blocks. A partial command can be abandoned with
//! [`CommandParser::expire`] once it has waited longer than the configured
//! timeout, after which opcode scanning resumes with the next byte.

use heapless::Vec;

use crate::opcode::{Opcode, MAX_PAYLOAD_SIZE};

/// Errors that can occur while framing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Byte in opcode position is not a known command; nothing was consumed
    UnknownOpcode(u8),
    /// Payload did not arrive in time; partial bytes were discarded
    Timeout(Opcode),
}

/// A fully framed command: opcode plus its complete payload
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Packet {
    /// Command identifier
    pub opcode: Opcode,
    /// Payload data, exactly `opcode.payload_len()` bytes
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Packet {
    /// Build a packet, checking the payload length against the opcode table
    pub fn new(opcode: Opcode, payload: &[u8]) -> Option<Self> {
        if payload.len() != opcode.payload_len() {
            return None;
        }
        let mut buf = Vec::new();
        buf.extend_from_slice(payload).ok()?;
        Some(Self {
            opcode,
            payload: buf,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for an opcode byte
    AwaitingOpcode,
    /// Collecting payload bytes for `opcode`
    AwaitingPayload { opcode: Opcode, remaining: usize },
}

/// State machine for framing incoming commands
#[derive(Debug, Clone)]
pub struct CommandParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    /// Timestamp of the opcode byte of the command being collected
    started_ms: u32,
    /// Maximum wait for a complete payload; `None` waits forever
    timeout_ms: Option<u32>,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandParser {
    /// Create a parser that waits indefinitely for payload bytes
    pub const fn new() -> Self {
        Self {
            state: ParseState::AwaitingOpcode,
            buffer: Vec::new(),
            started_ms: 0,
            timeout_ms: None,
        }
    }

    /// Create a parser that abandons partial commands after `timeout_ms`
    ///
    /// A timeout of zero disables expiry.
    pub const fn with_timeout(timeout_ms: u32) -> Self {
        let mut parser = Self::new();
        parser.timeout_ms = if timeout_ms == 0 {
            None
        } else {
            Some(timeout_ms)
        };
        parser
    }

    /// Reset the parser state, discarding any partial command
    pub fn reset(&mut self) {
        self.state = ParseState::AwaitingOpcode;
        self.buffer.clear();
        self.started_ms = 0;
    }

    /// True when no command is partially received
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::AwaitingOpcode
    }

    /// Opcode of the command currently being collected
    pub fn pending(&self) -> Option<Opcode> {
        match self.state {
            ParseState::AwaitingOpcode => None,
            ParseState::AwaitingPayload { opcode, .. } => Some(opcode),
        }
    }

    /// Payload bytes still outstanding for the pending command
    pub fn remaining(&self) -> usize {
        match self.state {
            ParseState::AwaitingOpcode => 0,
            ParseState::AwaitingPayload { remaining, .. } => remaining,
        }
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(packet))` when a command is complete, `Ok(None)`
    /// when more bytes are needed, or `Err` for an unknown opcode.
    pub fn feed(&mut self, byte: u8, now_ms: u32) -> Result<Option<Packet>, ParseError> {
        match self.state {
            ParseState::AwaitingOpcode => {
                let opcode = Opcode::from_byte(byte).ok_or(ParseError::UnknownOpcode(byte))?;
                let len = opcode.payload_len();
                if len == 0 {
                    return Ok(Some(Packet {
                        opcode,
                        payload: Vec::new(),
                    }));
                }
                self.buffer.clear();
                self.started_ms = now_ms;
                self.state = ParseState::AwaitingPayload {
                    opcode,
                    remaining: len,
                };
                Ok(None)
            }
            ParseState::AwaitingPayload { opcode, remaining } => {
                // Capacity covers the largest payload in the opcode table
                let _ = self.buffer.push(byte);
                if remaining > 1 {
                    self.state = ParseState::AwaitingPayload {
                        opcode,
                        remaining: remaining - 1,
                    };
                    return Ok(None);
                }

                let packet = Packet {
                    opcode,
                    payload: self.buffer.clone(),
                };
                self.reset();
                Ok(Some(packet))
            }
        }
    }

    /// Abandon a partial command that has waited too long
    ///
    /// Returns `Err(ParseError::Timeout)` naming the dropped opcode, or
    /// `Ok(())` when nothing expired.
    pub fn expire(&mut self, now_ms: u32) -> Result<(), ParseError> {
        let (Some(timeout), Some(opcode)) = (self.timeout_ms, self.pending()) else {
            return Ok(());
        };
        if now_ms.wrapping_sub(self.started_ms) >= timeout {
            self.reset();
            return Err(ParseError::Timeout(opcode));
        }
        Ok(())
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete command and the number of bytes consumed.
    /// Remaining bytes after a complete command are not consumed. Unknown
    /// opcodes are skipped.
    pub fn feed_bytes(&mut self, bytes: &[u8], now_ms: u32) -> (Option<Packet>, usize) {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Ok(Some(packet)) = self.feed(byte, now_ms) {
                return (Some(packet), i + 1);
            }
        }
        (None, bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::{LED_ALL_OFF, LED_LEVEL_MAP, LED_ON, SYS_SET_ID};

    #[test]
    fn test_zero_payload_is_ready_immediately() {
        let mut parser = CommandParser::new();
        let packet = parser.feed(LED_ALL_OFF, 0).unwrap().unwrap();
        assert_eq!(packet.opcode, Opcode::LedAllOff);
        assert!(packet.payload.is_empty());
        assert!(parser.is_idle());
    }

    #[test]
    fn test_payload_collected_across_feeds() {
        let mut parser = CommandParser::new();
        assert_eq!(parser.feed(LED_ON, 0), Ok(None));
        assert_eq!(parser.pending(), Some(Opcode::LedOn));
        assert_eq!(parser.remaining(), 2);
        assert_eq!(parser.feed(3, 1), Ok(None));
        assert_eq!(parser.remaining(), 1);

        let packet = parser.feed(4, 2).unwrap().unwrap();
        assert_eq!(packet.opcode, Opcode::LedOn);
        assert_eq!(&packet.payload[..], &[3, 4]);
        assert!(parser.is_idle());
    }

    #[test]
    fn test_payload_bytes_are_not_opcodes() {
        // 0x12 inside a payload must not be read as "all off"
        let mut parser = CommandParser::new();
        let (packet, used) = parser.feed_bytes(&[LED_ON, 0x12, 0x12, LED_ALL_OFF], 0);
        let packet = packet.unwrap();
        assert_eq!(used, 3);
        assert_eq!(packet.opcode, Opcode::LedOn);
        assert_eq!(&packet.payload[..], &[0x12, 0x12]);
    }

    #[test]
    fn test_unknown_opcode_consumes_nothing_else() {
        let mut parser = CommandParser::new();
        assert_eq!(parser.feed(0x07, 0), Err(ParseError::UnknownOpcode(0x07)));
        assert!(parser.is_idle());
        assert_eq!(parser.feed(LED_ON, 0), Ok(None));
    }

    #[test]
    fn test_largest_payload_fits() {
        let mut parser = CommandParser::new();
        assert_eq!(parser.feed(LED_LEVEL_MAP, 0), Ok(None));
        for i in 0..33u8 {
            assert_eq!(parser.feed(i, 0), Ok(None));
        }
        let packet = parser.feed(0xFF, 0).unwrap().unwrap();
        assert_eq!(packet.payload.len(), MAX_PAYLOAD_SIZE);
        assert_eq!(packet.payload[33], 0xFF);
    }

    #[test]
    fn test_timeout_discards_partial_command() {
        let mut parser = CommandParser::with_timeout(100);
        parser.feed(SYS_SET_ID, 1_000).unwrap();
        parser.feed(b'a', 1_010).unwrap();

        assert_eq!(parser.expire(1_099), Ok(()));
        assert_eq!(parser.expire(1_100), Err(ParseError::Timeout(Opcode::SetId)));
        assert!(parser.is_idle());

        // Next byte is treated as an opcode again
        let packet = parser.feed(LED_ALL_OFF, 1_101).unwrap().unwrap();
        assert_eq!(packet.opcode, Opcode::LedAllOff);
    }

    #[test]
    fn test_timeout_handles_clock_wrap() {
        let mut parser = CommandParser::with_timeout(10);
        parser.feed(LED_ON, u32::MAX - 2).unwrap();
        assert_eq!(parser.expire(2), Ok(()));
        assert_eq!(parser.expire(8), Err(ParseError::Timeout(Opcode::LedOn)));
    }

    #[test]
    fn test_zero_timeout_waits_forever() {
        let mut parser = CommandParser::with_timeout(0);
        parser.feed(LED_ON, 0).unwrap();
        assert_eq!(parser.expire(u32::MAX), Ok(()));
        assert_eq!(parser.pending(), Some(Opcode::LedOn));
    }

    #[test]
    fn test_expire_when_idle_is_noop() {
        let mut parser = CommandParser::with_timeout(5);
        assert_eq!(parser.expire(1_000), Ok(()));
    }

    #[test]
    fn test_packet_new_checks_length() {
        assert!(Packet::new(Opcode::LedOn, &[1, 2]).is_some());
        assert!(Packet::new(Opcode::LedOn, &[1]).is_none());
        assert!(Packet::new(Opcode::LedAllOff, &[]).is_some());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_panics_and_payloads_match_table(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
                let mut parser = CommandParser::new();
                for byte in bytes {
                    if let Ok(Some(packet)) = parser.feed(byte, 0) {
                        prop_assert_eq!(packet.payload.len(), packet.opcode.payload_len());
                    }
                    prop_assert!(parser.remaining() < MAX_PAYLOAD_SIZE + 1);
                }
            }

            #[test]
            fn split_delivery_matches_whole_delivery(
                payload in proptest::collection::vec(any::<u8>(), 34),
                split in 0usize..35,
            ) {
                let mut stream = std::vec::Vec::new();
                stream.push(LED_LEVEL_MAP);
                stream.extend_from_slice(&payload);

                let mut whole = CommandParser::new();
                let (expected, _) = whole.feed_bytes(&stream, 0);

                let mut parts = CommandParser::new();
                let (first, used) = parts.feed_bytes(&stream[..split + 1], 0);
                prop_assert!(first.is_none() || split == 34);
                let got = match first {
                    Some(packet) => Some(packet),
                    None => {
                        prop_assert_eq!(used, split + 1);
                        parts.feed_bytes(&stream[split + 1..], 0).0
                    }
                };
                prop_assert_eq!(got, expected);
            }
        }
    }
}
