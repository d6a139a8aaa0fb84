//! Serial byte-stream abstractions
//!
//! The monome protocol has no framing beyond "opcode then payload", so the
//! transport only needs to move raw bytes. Reads are non-blocking: the
//! protocol engine frames commands itself and must never stall the caller.

/// Shared error type for both halves of a serial endpoint
pub trait ErrorType {
    /// Error type for transport operations
    type Error;
}

impl<T: ErrorType + ?Sized> ErrorType for &mut T {
    type Error = T::Error;
}

/// Serial transmitter
pub trait SerialTx: ErrorType {
    /// Write every byte of `data`
    ///
    /// Responses are a handful of bytes, so implementations may block until
    /// the whole slice has been queued.
    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Serial receiver
pub trait SerialRx: ErrorType {
    /// Whether a host is attached (DTR asserted, USB configured, ...)
    ///
    /// Transports without a presence signal report `true`.
    fn is_connected(&self) -> bool;

    /// Copy up to `buf.len()` already-received bytes into `buf`
    ///
    /// Returns `Ok(0)` when nothing is waiting. Never blocks.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Take a single byte if one is waiting
    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        let mut buf = [0u8; 1];
        match self.read_available(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }
}

impl<T: SerialTx + ?Sized> SerialTx for &mut T {
    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        T::write_all(self, data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        T::flush(self)
    }
}

impl<T: SerialRx + ?Sized> SerialRx for &mut T {
    fn is_connected(&self) -> bool {
        T::is_connected(self)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        T::read_available(self, buf)
    }
}

/// Combined serial endpoint
///
/// For transports that provide both directions on a single peripheral.
pub trait SerialPort: SerialTx + SerialRx {}

// Blanket implementation
impl<T: SerialTx + SerialRx> SerialPort for T {}

/// Serial line configuration
///
/// monome grids enumerate as FTDI serial devices running at 115200 8N1;
/// serialosc expects the same rate from compatible hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self { baudrate: 115_200 }
    }
}
