//! Input events carried by the protocol
//!
//! Key edges from the grid and turns/presses from arc encoders. These are
//! produced either by the host echoing input (0x20/0x21, 0x50–0x52) or by
//! local input hardware, and queued until the application reads them.

/// A grid key edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GridEvent {
    pub x: u8,
    pub y: u8,
    pub pressed: bool,
}

impl GridEvent {
    pub const fn new(x: u8, y: u8, pressed: bool) -> Self {
        Self { x, y, pressed }
    }
}

/// An arc encoder event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArcEvent {
    /// Encoder rotated by a signed number of ticks
    Turn { index: u8, delta: i8 },
    /// Encoder push switch changed
    Press { index: u8, pressed: bool },
}

impl ArcEvent {
    /// Encoder this event belongs to
    pub fn index(&self) -> u8 {
        match *self {
            ArcEvent::Turn { index, .. } | ArcEvent::Press { index, .. } => index,
        }
    }

    /// Returns true if this is a rotation event
    pub fn is_turn(&self) -> bool {
        matches!(self, ArcEvent::Turn { .. })
    }

    /// Signed rotation, or 0 for presses
    pub fn delta(&self) -> i8 {
        match *self {
            ArcEvent::Turn { delta, .. } => delta,
            ArcEvent::Press { .. } => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arc_event_accessors() {
        let turn = ArcEvent::Turn { index: 2, delta: -3 };
        assert_eq!(turn.index(), 2);
        assert!(turn.is_turn());
        assert_eq!(turn.delta(), -3);

        let press = ArcEvent::Press {
            index: 1,
            pressed: true,
        };
        assert_eq!(press.index(), 1);
        assert!(!press.is_turn());
        assert_eq!(press.delta(), 0);
    }
}
