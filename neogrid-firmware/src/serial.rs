//! Host link over the buffered UART
//!
//! Adapts the embassy-rp UART transmitter to the neogrid serial traits.
//! Receiving stays async in the device task, so only the TX half is wrapped.

use embassy_rp::uart::{BufferedUartTx, Error};
use embedded_io::Write;

use neogrid_hal::{ErrorType, SerialTx};

/// Transmit half of the host link
pub struct UartLink {
    tx: BufferedUartTx,
}

impl UartLink {
    pub fn new(tx: BufferedUartTx) -> Self {
        Self { tx }
    }
}

impl ErrorType for UartLink {
    type Error = Error;
}

impl SerialTx for UartLink {
    fn write_all(&mut self, data: &[u8]) -> Result<(), Error> {
        Write::write_all(&mut self.tx, data)
    }

    fn flush(&mut self) -> Result<(), Error> {
        Write::flush(&mut self.tx)
    }
}
