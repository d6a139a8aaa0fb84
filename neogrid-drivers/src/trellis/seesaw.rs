//! Adafruit seesaw register access
//!
//! Every access starts with a two-byte address: module base, then function
//! register. Writes append their data to the same transfer. Reads write the
//! address, wait for the chip to prepare the answer, then read.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// Module base addresses
pub mod base {
    pub const STATUS: u8 = 0x00;
    pub const NEOPIXEL: u8 = 0x0E;
    pub const KEYPAD: u8 = 0x10;
}

/// Status module registers
pub mod status {
    pub const HW_ID: u8 = 0x01;
    pub const SWRST: u8 = 0x7F;
}

/// NeoPixel module registers
pub mod neopixel {
    pub const PIN: u8 = 0x01;
    pub const SPEED: u8 = 0x02;
    pub const BUF_LENGTH: u8 = 0x03;
    pub const BUF: u8 = 0x04;
    pub const SHOW: u8 = 0x05;
}

/// Keypad module registers
pub mod keypad {
    pub const EVENT: u8 = 0x01;
    pub const INTENSET: u8 = 0x02;
    pub const COUNT: u8 = 0x04;
    pub const FIFO: u8 = 0x10;
}

/// Value written to SWRST to reset the chip
pub const RESET_MAGIC: u8 = 0xFF;

/// HW_ID reported by the SAMD09 on NeoTrellis boards
pub const SAMD09_HW_ID: u8 = 0x55;

/// Time for the chip to restart after a software reset
pub const RESET_DELAY_MS: u32 = 500;

/// Settle time between a read request and the read
pub const READ_DELAY_US: u32 = 500;

/// Largest data block written in one access
pub const MAX_WRITE_DATA: usize = 6;

/// Keypad edges as numbered by the seesaw firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    High = 0,
    Low = 1,
    Falling = 2,
    Rising = 3,
}

impl Edge {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Edge::High,
            1 => Edge::Low,
            2 => Edge::Falling,
            _ => Edge::Rising,
        }
    }

    /// Second byte of a KEYPAD_EVENT write
    pub fn activation(self, enable: bool) -> u8 {
        ((1 << self as u8) << 1) | enable as u8
    }
}

/// One entry of the keypad FIFO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    /// Raw seesaw key number
    pub number: u8,
    pub edge: Edge,
}

impl KeyEvent {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            number: byte >> 2,
            edge: Edge::from_bits(byte),
        }
    }
}

/// Write `data` to a register
pub fn write<I2C: I2c>(
    i2c: &mut I2C,
    address: u8,
    module: u8,
    register: u8,
    data: &[u8],
) -> Result<(), I2C::Error> {
    let mut frame = [0u8; 2 + MAX_WRITE_DATA];
    let len = 2 + data.len().min(MAX_WRITE_DATA);
    frame[0] = module;
    frame[1] = register;
    frame[2..len].copy_from_slice(&data[..len - 2]);
    i2c.write(address, &frame[..len])
}

/// Read `buf.len()` bytes from a register
pub fn read<I2C: I2c, D: DelayNs>(
    i2c: &mut I2C,
    delay: &mut D,
    address: u8,
    module: u8,
    register: u8,
    buf: &mut [u8],
) -> Result<(), I2C::Error> {
    i2c.write(address, &[module, register])?;
    delay.delay_us(READ_DELAY_US);
    i2c.read(address, buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_byte() {
        assert_eq!(Edge::Rising.activation(true), 0b0001_0001);
        assert_eq!(Edge::Falling.activation(true), 0b0000_1001);
        assert_eq!(Edge::High.activation(false), 0b0000_0010);
    }

    #[test]
    fn test_fifo_byte() {
        let event = KeyEvent::from_byte((13 << 2) | 3);
        assert_eq!(event.number, 13);
        assert_eq!(event.edge, Edge::Rising);
        assert_eq!(KeyEvent::from_byte(0x02).edge, Edge::Falling);
    }
}
