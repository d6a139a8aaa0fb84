//! Messages the device originates
//!
//! Key and encoder edges produced by local hardware, plus the sys/query
//! request. Each message is written whole and then flushed.

use neogrid_hal::SerialTx;
use neogrid_protocol::{DeviceMessage, MAX_MESSAGE_SIZE};

use crate::device::MonomeDevice;
use crate::traits::KeySource;

/// Errors from forwarding key edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanError<K, S> {
    /// Key hardware failed
    Keys(K),
    /// Serial write failed
    Serial(S),
}

/// Encode `message` and write it to `tx`
pub(crate) fn write_message<T: SerialTx + ?Sized>(
    tx: &mut T,
    message: &DeviceMessage<'_>,
) -> Result<(), T::Error> {
    let mut buf = [0u8; MAX_MESSAGE_SIZE];
    let len = match message.encode(&mut buf) {
        Ok(len) => len,
        Err(_) => {
            debug_assert!(false, "{:?} exceeds MAX_MESSAGE_SIZE", message);
            return Ok(());
        }
    };
    tx.write_all(&buf[..len])?;
    tx.flush()
}

/// Report a grid key edge: `[0x21|0x20, x, y]`
pub fn send_grid_key<T: SerialTx + ?Sized>(
    tx: &mut T,
    x: u8,
    y: u8,
    pressed: bool,
) -> Result<(), T::Error> {
    write_message(tx, &DeviceMessage::GridKey { x, y, pressed })
}

/// Report an encoder key edge: `[0x52|0x51, index]`
pub fn send_arc_key<T: SerialTx + ?Sized>(
    tx: &mut T,
    index: u8,
    pressed: bool,
) -> Result<(), T::Error> {
    write_message(tx, &DeviceMessage::ArcKey { index, pressed })
}

/// Report an encoder turn: `[0x50, index, delta]`
pub fn send_arc_delta<T: SerialTx + ?Sized>(
    tx: &mut T,
    index: u8,
    delta: i8,
) -> Result<(), T::Error> {
    write_message(tx, &DeviceMessage::ArcDelta { index, delta })
}

/// Ask the other end to identify itself: `[0x00]`
pub fn request_device_info<T: SerialTx + ?Sized>(tx: &mut T) -> Result<(), T::Error> {
    write_message(tx, &DeviceMessage::InfoRequest)
}

/// Drain `source` and report every in-bounds edge to the host
///
/// Edges outside the device's grid are dropped. Returns the number of edges
/// sent.
pub fn forward_key_edges<K, T>(
    source: &mut K,
    device: &MonomeDevice,
    tx: &mut T,
) -> Result<usize, ScanError<K::Error, T::Error>>
where
    K: KeySource + ?Sized,
    T: SerialTx + ?Sized,
{
    let leds = device.leds();
    let mut sent = 0;
    while let Some(edge) = source.next_edge().map_err(ScanError::Keys)? {
        if edge.x >= leds.cols() || edge.y >= leds.rows() {
            continue;
        }
        send_grid_key(tx, edge.x, edge.y, edge.pressed).map_err(ScanError::Serial)?;
        sent += 1;
    }
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::KeyEdge;
    use neogrid_hal::ErrorType;
    use std::collections::VecDeque;
    use std::vec::Vec;

    #[derive(Default)]
    struct Recorder {
        written: Vec<u8>,
        flushes: usize,
    }

    impl ErrorType for Recorder {
        type Error = ();
    }

    impl SerialTx for Recorder {
        fn write_all(&mut self, data: &[u8]) -> Result<(), ()> {
            self.written.extend_from_slice(data);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            self.flushes += 1;
            Ok(())
        }
    }

    struct Script(VecDeque<Result<KeyEdge, u8>>);

    impl KeySource for Script {
        type Error = u8;

        fn next_edge(&mut self) -> Result<Option<KeyEdge>, u8> {
            self.0.pop_front().transpose()
        }
    }

    fn edge(x: u8, y: u8, pressed: bool) -> KeyEdge {
        KeyEdge { x, y, pressed }
    }

    #[test]
    fn test_outbound_layouts() {
        let mut tx = Recorder::default();
        send_grid_key(&mut tx, 3, 4, true).unwrap();
        send_grid_key(&mut tx, 3, 4, false).unwrap();
        send_arc_key(&mut tx, 1, true).unwrap();
        send_arc_key(&mut tx, 1, false).unwrap();
        send_arc_delta(&mut tx, 2, -5).unwrap();
        request_device_info(&mut tx).unwrap();

        assert_eq!(
            tx.written,
            [0x21, 3, 4, 0x20, 3, 4, 0x52, 1, 0x51, 1, 0x50, 2, 0xFB, 0x00]
        );
        assert_eq!(tx.flushes, 6);
    }

    #[test]
    fn test_forward_key_edges() {
        let device = MonomeDevice::as_grid(8, 16);
        let mut keys = Script(VecDeque::from([
            Ok(edge(0, 0, true)),
            Ok(edge(16, 0, true)),
            Ok(edge(15, 7, false)),
        ]));
        let mut tx = Recorder::default();

        assert_eq!(forward_key_edges(&mut keys, &device, &mut tx), Ok(2));
        assert_eq!(tx.written, [0x21, 0, 0, 0x20, 15, 7]);
    }

    #[test]
    fn test_forward_key_edges_reports_key_errors() {
        let device = MonomeDevice::as_grid(8, 8);
        let mut keys = Script(VecDeque::from([Ok(edge(1, 1, true)), Err(7)]));
        let mut tx = Recorder::default();

        assert_eq!(
            forward_key_edges(&mut keys, &device, &mut tx),
            Err(ScanError::Keys(7))
        );
        assert_eq!(tx.written, [0x21, 1, 1]);
    }
}
