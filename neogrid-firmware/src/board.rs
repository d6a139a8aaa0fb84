//! Board wiring
//!
//! Raspberry Pi Pico with eight NeoTrellis boards on I2C1:
//! - UART0 TX=GPIO0, RX=GPIO1 (host link)
//! - I2C1 SCL=GPIO27, SDA=GPIO26 (NeoTrellis chain)
//! - On-board LED on GPIO25

use embassy_rp::i2c::{self, Blocking};
use embassy_rp::peripherals::I2C1;
use embassy_time::Delay;

use neogrid_drivers::trellis::MultiTrellis;

/// NeoTrellis addresses, row-major: two rows of four boards (8×16 keys)
pub const TRELLIS_ADDRESSES: [u8; 8] = [0x30, 0x31, 0x32, 0x33, 0x36, 0x2E, 0x2F, 0x3E];

/// Boards per row in [`TRELLIS_ADDRESSES`]
pub const TRELLIS_BOARD_COLS: u8 = 4;

/// I2C bus speed for the trellis chain
pub const I2C_FREQUENCY: u32 = 400_000;

/// The concrete trellis driver on this board
pub type Trellis = MultiTrellis<i2c::I2c<'static, I2C1, Blocking>, Delay>;
