//! Pixel output trait

use crate::render::Rgb;

/// Addressable RGB pixels laid out as a logical grid
///
/// Implementations map logical (x, y) onto their physical layout. Writes
/// may be buffered until [`PixelSink::show`].
pub trait PixelSink {
    type Error;

    /// Stage a colour for the pixel at column `x`, row `y`
    fn set_pixel(&mut self, x: u8, y: u8, color: Rgb) -> Result<(), Self::Error>;

    /// Latch staged colours onto the LEDs
    fn show(&mut self) -> Result<(), Self::Error>;
}

impl<T: PixelSink + ?Sized> PixelSink for &mut T {
    type Error = T::Error;

    fn set_pixel(&mut self, x: u8, y: u8, color: Rgb) -> Result<(), Self::Error> {
        T::set_pixel(self, x, y, color)
    }

    fn show(&mut self) -> Result<(), Self::Error> {
        T::show(self)
    }
}
