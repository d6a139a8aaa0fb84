//! LED intensity buffer
//!
//! A rows × cols grid of 0–15 levels plus one 64-position ring per encoder.
//! Storage is sized for the largest supported device and allocated once;
//! the configured extent only limits which cells are addressable.

use crate::config::RingFillMode;

/// Maximum grid rows
pub const MAX_ROWS: usize = 16;

/// Maximum grid columns
pub const MAX_COLS: usize = 16;

/// Maximum number of arc rings
pub const MAX_RINGS: usize = 4;

/// LEDs per arc ring
pub const RING_SIZE: usize = 64;

const LEVEL_MASK: u8 = 0x0F;

/// Grid and ring intensities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedBuffer {
    rows: u8,
    cols: u8,
    rings: u8,
    grid: [[u8; MAX_COLS]; MAX_ROWS],
    arc: [[u8; RING_SIZE]; MAX_RINGS],
}

impl LedBuffer {
    /// Create a cleared buffer; dimensions above capacity are clamped
    pub fn new(rows: u8, cols: u8, rings: u8) -> Self {
        Self {
            rows: rows.min(MAX_ROWS as u8),
            cols: cols.min(MAX_COLS as u8),
            rings: rings.min(MAX_RINGS as u8),
            grid: [[0; MAX_COLS]; MAX_ROWS],
            arc: [[0; RING_SIZE]; MAX_RINGS],
        }
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn rings(&self) -> u8 {
        self.rings
    }

    fn in_grid(&self, x: u8, y: u8) -> bool {
        x < self.cols && y < self.rows
    }

    fn in_arc(&self, ring: u8, pos: u8) -> bool {
        ring < self.rings && (pos as usize) < RING_SIZE
    }

    /// Level at column `x`, row `y`, or `None` outside the grid
    pub fn grid_led(&self, x: u8, y: u8) -> Option<u8> {
        self.in_grid(x, y).then(|| self.grid[y as usize][x as usize])
    }

    /// Store `level & 0x0F` at (x, y)
    ///
    /// Returns false and leaves the buffer untouched when (x, y) is outside
    /// the configured grid.
    pub fn set_grid_led(&mut self, x: u8, y: u8, level: u8) -> bool {
        if !self.in_grid(x, y) {
            return false;
        }
        self.grid[y as usize][x as usize] = level & LEVEL_MASK;
        true
    }

    pub fn clear_grid_led(&mut self, x: u8, y: u8) -> bool {
        self.set_grid_led(x, y, 0)
    }

    /// Set every cell of the configured grid
    pub fn set_all_grid_leds(&mut self, value: u8) {
        let value = value & LEVEL_MASK;
        for row in self.grid.iter_mut().take(self.rows as usize) {
            row[..self.cols as usize].fill(value);
        }
    }

    /// Iterate over configured rows as slices of `cols` levels
    pub fn grid_rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.grid
            .iter()
            .take(self.rows as usize)
            .map(move |row| &row[..self.cols as usize])
    }

    /// Level at `pos` on `ring`, or `None` outside the arc
    pub fn arc_led(&self, ring: u8, pos: u8) -> Option<u8> {
        self.in_arc(ring, pos).then(|| self.arc[ring as usize][pos as usize])
    }

    /// Store `level & 0x0F` at `pos` on `ring`
    pub fn set_arc_led(&mut self, ring: u8, pos: u8, level: u8) -> bool {
        if !self.in_arc(ring, pos) {
            return false;
        }
        self.arc[ring as usize][pos as usize] = level & LEVEL_MASK;
        true
    }

    pub fn clear_arc_led(&mut self, ring: u8, pos: u8) -> bool {
        self.set_arc_led(ring, pos, 0)
    }

    /// Zero every position on `ring`
    pub fn clear_arc_ring(&mut self, ring: u8) -> bool {
        self.fill_ring(ring, 0)
    }

    /// Apply "all" to a ring according to `mode`
    pub fn set_all_arc_leds(&mut self, ring: u8, value: u8, mode: RingFillMode) -> bool {
        match mode {
            RingFillMode::Fill => self.fill_ring(ring, value),
            RingFillMode::ZeroRing => self.clear_arc_ring(ring),
        }
    }

    /// Set [start, end) on `ring`, wrapping past 63 when start >= end
    pub fn set_arc_range(&mut self, ring: u8, start: u8, end: u8, level: u8) -> bool {
        if ring >= self.rings {
            return false;
        }
        let leds = &mut self.arc[ring as usize];
        let level = level & LEVEL_MASK;
        let start = (start as usize).min(RING_SIZE);
        let end = (end as usize).min(RING_SIZE);
        if start < end {
            leds[start..end].fill(level);
        } else {
            leds[start..].fill(level);
            leds[..end].fill(level);
        }
        true
    }

    /// Levels of one ring
    pub fn ring(&self, ring: u8) -> Option<&[u8; RING_SIZE]> {
        (ring < self.rings).then(|| &self.arc[ring as usize])
    }

    fn fill_ring(&mut self, ring: u8, value: u8) -> bool {
        if ring >= self.rings {
            return false;
        }
        self.arc[ring as usize].fill(value & LEVEL_MASK);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_read() {
        let mut leds = LedBuffer::new(8, 16, 0);
        assert!(leds.set_grid_led(3, 2, 9));
        assert_eq!(leds.grid_led(3, 2), Some(9));
        assert_eq!(leds.grid_led(2, 3), Some(0));
    }

    #[test]
    fn test_levels_are_masked() {
        let mut leds = LedBuffer::new(8, 8, 1);
        leds.set_grid_led(0, 0, 0xFF);
        assert_eq!(leds.grid_led(0, 0), Some(15));
        leds.set_grid_led(0, 0, 0x13);
        assert_eq!(leds.grid_led(0, 0), Some(3));
        leds.set_arc_led(0, 5, 0x20);
        assert_eq!(leds.arc_led(0, 5), Some(0));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut leds = LedBuffer::new(8, 16, 2);
        let before = leds.clone();
        assert!(!leds.set_grid_led(16, 0, 5));
        assert!(!leds.set_grid_led(0, 8, 5));
        assert!(!leds.set_arc_led(2, 0, 5));
        assert!(!leds.set_arc_led(0, 64, 5));
        assert_eq!(leds, before);
        assert_eq!(leds.grid_led(16, 0), None);
    }

    #[test]
    fn test_all_off_is_idempotent() {
        let mut leds = LedBuffer::new(8, 8, 0);
        leds.set_grid_led(1, 1, 7);
        leds.set_all_grid_leds(0);
        let once = leds.clone();
        leds.set_all_grid_leds(0);
        assert_eq!(leds, once);
        assert!(leds.grid_rows().all(|row| row.iter().all(|&v| v == 0)));
    }

    #[test]
    fn test_single_set_after_set_all() {
        let mut leds = LedBuffer::new(8, 16, 0);
        leds.set_all_grid_leds(7);
        assert!(leds.set_grid_led(2, 3, 1));

        for (y, row) in (0u8..).zip(leds.grid_rows()) {
            for (x, &level) in (0u8..).zip(row.iter()) {
                let expected = if (x, y) == (2, 3) { 1 } else { 7 };
                assert_eq!(level, expected, "cell ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_set_all_only_touches_extent() {
        let mut leds = LedBuffer::new(2, 3, 0);
        leds.set_all_grid_leds(15);
        assert_eq!(leds.grid_rows().count(), 2);
        assert!(leds.grid_rows().all(|row| row == [15, 15, 15]));
    }

    #[test]
    fn test_dimensions_clamped() {
        let leds = LedBuffer::new(32, 40, 9);
        assert_eq!(leds.rows(), 16);
        assert_eq!(leds.cols(), 16);
        assert_eq!(leds.rings(), 4);
    }

    #[test]
    fn test_arc_range_wraps() {
        let mut leds = LedBuffer::new(0, 0, 1);
        assert!(leds.set_arc_range(0, 60, 4, 9));
        let ring = leds.ring(0).unwrap();
        for (pos, &level) in ring.iter().enumerate() {
            let lit = pos >= 60 || pos < 4;
            assert_eq!(level, if lit { 9 } else { 0 }, "pos {}", pos);
        }
    }

    #[test]
    fn test_arc_range_forward() {
        let mut leds = LedBuffer::new(0, 0, 1);
        leds.set_arc_range(0, 10, 13, 4);
        let ring = leds.ring(0).unwrap();
        assert_eq!(&ring[9..14], &[0, 4, 4, 4, 0]);
    }

    #[test]
    fn test_ring_fill_modes() {
        let mut leds = LedBuffer::new(0, 0, 2);
        leds.set_arc_led(1, 3, 8);

        leds.set_all_arc_leds(1, 6, RingFillMode::Fill);
        assert!(leds.ring(1).unwrap().iter().all(|&v| v == 6));

        leds.set_all_arc_leds(1, 6, RingFillMode::ZeroRing);
        assert!(leds.ring(1).unwrap().iter().all(|&v| v == 0));
    }
}
