//! Gamma rendering of the LED buffer onto RGB pixels
//!
//! Each 0–15 level goes through a perceptual gamma table and scales the
//! configured tint. Only cells whose level changed since the last render
//! are pushed to the sink.

use crate::device::MonomeDevice;
use crate::state::{MAX_COLS, MAX_ROWS};
use crate::traits::PixelSink;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Level → brightness out of 256
pub const GAMMA_TABLE: [u8; 16] = [0, 2, 3, 6, 11, 18, 25, 32, 41, 59, 70, 80, 92, 103, 115, 128];

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Colour for a 0–15 level, each channel `gamma * channel / 256`
    pub fn for_level(self, level: u8) -> Self {
        let gamma = GAMMA_TABLE[(level & 0x0F) as usize] as u16;
        let scale = |c: u8| ((gamma * c as u16) / 256) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

/// Pushes changed grid levels to a [`PixelSink`]
#[derive(Debug, Clone)]
pub struct GridRenderer {
    tint: Rgb,
    shown: [[u8; MAX_COLS]; MAX_ROWS],
    primed: bool,
}

impl GridRenderer {
    pub fn new(tint: Rgb) -> Self {
        Self {
            tint,
            shown: [[0; MAX_COLS]; MAX_ROWS],
            primed: false,
        }
    }

    pub fn tint(&self) -> Rgb {
        self.tint
    }

    /// Change the tint; the next render repaints every pixel
    pub fn set_tint(&mut self, tint: Rgb) {
        self.tint = tint;
        self.invalidate();
    }

    /// Forget what is on the pixels so the next render repaints everything
    pub fn invalidate(&mut self) {
        self.primed = false;
    }

    /// Render if the grid is dirty (or nothing has been drawn yet)
    ///
    /// Returns the number of pixels written. The grid dirty flag is consumed
    /// only after the sink accepted the frame.
    pub fn render<P: PixelSink>(
        &mut self,
        device: &mut MonomeDevice,
        sink: &mut P,
    ) -> Result<usize, P::Error> {
        if !device.state().grid_dirty() && self.primed {
            return Ok(0);
        }

        let mut written = 0;
        for (y, row) in device.leds().grid_rows().enumerate() {
            for (x, &level) in row.iter().enumerate() {
                let shown = &mut self.shown[y][x];
                if self.primed && *shown == level {
                    continue;
                }
                sink.set_pixel(x as u8, y as u8, self.tint.for_level(level))?;
                *shown = level;
                written += 1;
            }
        }

        if written > 0 {
            sink.show()?;
        }
        self.primed = true;
        device.state_mut().take_grid_dirty();
        Ok(written)
    }
}
