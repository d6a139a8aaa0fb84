//! Key scanning trait

/// A raw key edge in logical grid coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEdge {
    pub x: u8,
    pub y: u8,
    pub pressed: bool,
}

/// Source of key press/release edges
pub trait KeySource {
    type Error;

    /// Next pending edge, or `Ok(None)` when the hardware has nothing queued
    ///
    /// Must not block waiting for input.
    fn next_edge(&mut self) -> Result<Option<KeyEdge>, Self::Error>;
}

impl<T: KeySource + ?Sized> KeySource for &mut T {
    type Error = T::Error;

    fn next_edge(&mut self) -> Result<Option<KeyEdge>, Self::Error> {
        T::next_edge(self)
    }
}
