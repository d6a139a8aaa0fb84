//! NeoTrellis grid driver
//!
//! A NeoTrellis is a 4×4 board of keys and NeoPixels behind a seesaw
//! microcontroller. Boards tile into a larger grid on one I2C bus; each one
//! needs a distinct address (0x2E–0x3E, set by solder jumpers).
//!
//! Layout: `addresses` lists boards row-major, `board_cols` per row. The
//! board at (bx, by) covers grid columns `bx*4..bx*4+4` and rows
//! `by*4..by*4+4`.
//!
//! Key numbering: the seesaw keypad scans an 8-column matrix, so key
//! (x, y) on a board is seesaw key `y*8 + x`. Pixels are numbered `y*4 + x`.

pub mod seesaw;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use heapless::{Deque, Vec};

use neogrid_core::render::Rgb;
use neogrid_core::traits::{KeyEdge, KeySource, PixelSink};

use self::seesaw::{base, keypad, neopixel, status, Edge, KeyEvent};

/// Keys (and pixels) per side of one board
pub const BOARD_SIZE: u8 = 4;

/// Keys per board
pub const KEYS_PER_BOARD: u8 = BOARD_SIZE * BOARD_SIZE;

/// Maximum boards on one bus (a 16×16 grid)
pub const MAX_BOARDS: usize = 16;

/// NeoPixel data pin on the NeoTrellis seesaw
const NEOPIXEL_PIN: u8 = 3;

/// Bytes per pixel (GRB)
const BYTES_PER_PIXEL: u8 = 3;

/// Key edges buffered between scans
const EDGE_BUFFER: usize = 32;

/// FIFO entries read per board per scan
const MAX_FIFO_READ: usize = 16;

/// Convert a board key index (0-15) to its seesaw key number
pub const fn seesaw_key(index: u8) -> u8 {
    (index / 4) * 8 + index % 4
}

/// Convert a seesaw key number back to a board key index
pub const fn board_key(number: u8) -> u8 {
    (number / 8) * 4 + number % 8
}

/// Errors from the trellis driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrellisError<E> {
    /// Bus transfer failed
    I2c(E),
    /// Board answered with an unexpected hardware id
    ChipId { address: u8, id: u8 },
    /// Address list is empty, too long, or not a whole number of rows
    Layout,
}

/// Several NeoTrellis boards tiled into one logical grid
pub struct MultiTrellis<I2C, D> {
    i2c: I2C,
    delay: D,
    addresses: Vec<u8, MAX_BOARDS>,
    board_cols: u8,
    /// Boards with staged but unshown pixels, one bit per board
    unshown: u16,
    pending: Deque<KeyEdge, EDGE_BUFFER>,
}

impl<I2C: I2c, D: DelayNs> MultiTrellis<I2C, D> {
    /// Create a driver; call [`MultiTrellis::init`] before use
    pub fn new(
        i2c: I2C,
        delay: D,
        addresses: &[u8],
        board_cols: u8,
    ) -> Result<Self, TrellisError<I2C::Error>> {
        let addresses = Vec::from_slice(addresses).map_err(|_| TrellisError::Layout)?;
        if addresses.is_empty() || board_cols == 0 || addresses.len() % board_cols as usize != 0 {
            return Err(TrellisError::Layout);
        }
        Ok(Self {
            i2c,
            delay,
            addresses,
            board_cols,
            unshown: 0,
            pending: Deque::new(),
        })
    }

    /// Grid rows covered by the boards
    pub fn rows(&self) -> u8 {
        (self.addresses.len() as u8 / self.board_cols) * BOARD_SIZE
    }

    /// Grid columns covered by the boards
    pub fn cols(&self) -> u8 {
        self.board_cols * BOARD_SIZE
    }

    /// Reset every board, check its id, then set up pixels and key events
    pub fn init(&mut self) -> Result<(), TrellisError<I2C::Error>> {
        for &address in self.addresses.iter() {
            seesaw::write(
                &mut self.i2c,
                address,
                base::STATUS,
                status::SWRST,
                &[seesaw::RESET_MAGIC],
            )
            .map_err(TrellisError::I2c)?;
        }
        self.delay.delay_ms(seesaw::RESET_DELAY_MS);

        for i in 0..self.addresses.len() {
            let address = self.addresses[i];
            let mut id = [0u8; 1];
            seesaw::read(
                &mut self.i2c,
                &mut self.delay,
                address,
                base::STATUS,
                status::HW_ID,
                &mut id,
            )
            .map_err(TrellisError::I2c)?;
            if id[0] != seesaw::SAMD09_HW_ID {
                return Err(TrellisError::ChipId { address, id: id[0] });
            }
            self.setup_board(address).map_err(TrellisError::I2c)?;
        }
        Ok(())
    }

    fn setup_board(&mut self, address: u8) -> Result<(), I2C::Error> {
        let i2c = &mut self.i2c;
        let buf_len = (KEYS_PER_BOARD * BYTES_PER_PIXEL) as u16;
        seesaw::write(i2c, address, base::NEOPIXEL, neopixel::PIN, &[NEOPIXEL_PIN])?;
        // 800 kHz pixels
        seesaw::write(i2c, address, base::NEOPIXEL, neopixel::SPEED, &[1])?;
        seesaw::write(
            i2c,
            address,
            base::NEOPIXEL,
            neopixel::BUF_LENGTH,
            &buf_len.to_be_bytes(),
        )?;

        // Polled, so no interrupt line
        seesaw::write(i2c, address, base::KEYPAD, keypad::INTENSET, &[0])?;
        for index in 0..KEYS_PER_BOARD {
            for edge in [Edge::Rising, Edge::Falling] {
                seesaw::write(
                    i2c,
                    address,
                    base::KEYPAD,
                    keypad::EVENT,
                    &[seesaw_key(index), edge.activation(true)],
                )?;
            }
        }
        Ok(())
    }

    /// Board slot and local coordinates for a grid cell
    fn locate(&self, x: u8, y: u8) -> Option<(usize, u8, u8)> {
        if x >= self.cols() || y >= self.rows() {
            return None;
        }
        let (bx, by) = (x / BOARD_SIZE, y / BOARD_SIZE);
        let slot = by as usize * self.board_cols as usize + bx as usize;
        Some((slot, x % BOARD_SIZE, y % BOARD_SIZE))
    }

    /// Read every board's keypad FIFO into the edge buffer
    pub fn scan(&mut self) -> Result<(), TrellisError<I2C::Error>> {
        for slot in 0..self.addresses.len() {
            let address = self.addresses[slot];
            let mut count = [0u8; 1];
            seesaw::read(
                &mut self.i2c,
                &mut self.delay,
                address,
                base::KEYPAD,
                keypad::COUNT,
                &mut count,
            )
            .map_err(TrellisError::I2c)?;

            let n = (count[0] as usize).min(MAX_FIFO_READ);
            if n == 0 {
                continue;
            }
            let mut fifo = [0u8; MAX_FIFO_READ];
            seesaw::read(
                &mut self.i2c,
                &mut self.delay,
                address,
                base::KEYPAD,
                keypad::FIFO,
                &mut fifo[..n],
            )
            .map_err(TrellisError::I2c)?;

            let bx = (slot % self.board_cols as usize) as u8;
            let by = (slot / self.board_cols as usize) as u8;
            for &byte in &fifo[..n] {
                let event = KeyEvent::from_byte(byte);
                let index = board_key(event.number);
                if index >= KEYS_PER_BOARD {
                    continue;
                }
                let pressed = match event.edge {
                    Edge::Rising => true,
                    Edge::Falling => false,
                    Edge::High | Edge::Low => continue,
                };
                let edge = KeyEdge {
                    x: bx * BOARD_SIZE + index % BOARD_SIZE,
                    y: by * BOARD_SIZE + index / BOARD_SIZE,
                    pressed,
                };
                if self.pending.is_full() {
                    self.pending.pop_front();
                }
                let _ = self.pending.push_back(edge);
            }
        }
        Ok(())
    }

    /// Release the bus and delay
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C: I2c, D: DelayNs> PixelSink for MultiTrellis<I2C, D> {
    type Error = TrellisError<I2C::Error>;

    fn set_pixel(&mut self, x: u8, y: u8, color: Rgb) -> Result<(), Self::Error> {
        let Some((slot, lx, ly)) = self.locate(x, y) else {
            return Ok(());
        };
        let offset = ((ly * BOARD_SIZE + lx) * BYTES_PER_PIXEL) as u16;
        let [hi, lo] = offset.to_be_bytes();
        seesaw::write(
            &mut self.i2c,
            self.addresses[slot],
            base::NEOPIXEL,
            neopixel::BUF,
            &[hi, lo, color.g, color.r, color.b],
        )
        .map_err(TrellisError::I2c)?;
        self.unshown |= 1 << slot;
        Ok(())
    }

    fn show(&mut self) -> Result<(), Self::Error> {
        for slot in 0..self.addresses.len() {
            if self.unshown & (1 << slot) == 0 {
                continue;
            }
            seesaw::write(
                &mut self.i2c,
                self.addresses[slot],
                base::NEOPIXEL,
                neopixel::SHOW,
                &[],
            )
            .map_err(TrellisError::I2c)?;
            self.unshown &= !(1 << slot);
        }
        Ok(())
    }
}

impl<I2C: I2c, D: DelayNs> KeySource for MultiTrellis<I2C, D> {
    type Error = TrellisError<I2C::Error>;

    /// Buffered edges first; the boards are scanned when the buffer is empty
    fn next_edge(&mut self) -> Result<Option<KeyEdge>, Self::Error> {
        if self.pending.is_empty() {
            self.scan()?;
        }
        Ok(self.pending.pop_front())
    }
}
