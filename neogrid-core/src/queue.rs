//! Input event queues
//!
//! Two independent FIFOs, one for grid keys and one for arc encoders.
//! Each holds 64 events; pushing onto a full queue drops the oldest entry
//! and counts the loss instead of failing.

use heapless::Deque;

use neogrid_protocol::{ArcEvent, GridEvent};

/// Capacity of each queue
pub const QUEUE_DEPTH: usize = 64;

/// Bounded FIFO that drops the oldest entry on overflow
#[derive(Debug, Clone)]
struct DropOldest<T> {
    events: Deque<T, QUEUE_DEPTH>,
    dropped: u32,
}

impl<T> DropOldest<T> {
    const fn new() -> Self {
        Self {
            events: Deque::new(),
            dropped: 0,
        }
    }

    fn push(&mut self, event: T) {
        if self.events.is_full() {
            self.events.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        // A slot was just freed if the queue was full
        let _ = self.events.push_back(event);
    }
}

/// Grid and arc event queues
#[derive(Debug, Clone)]
pub struct EventQueue {
    grid: DropOldest<GridEvent>,
    arc: DropOldest<ArcEvent>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            grid: DropOldest::new(),
            arc: DropOldest::new(),
        }
    }

    pub fn add_grid_event(&mut self, x: u8, y: u8, pressed: bool) {
        self.grid.push(GridEvent::new(x, y, pressed));
    }

    pub fn grid_event_available(&self) -> bool {
        !self.grid.events.is_empty()
    }

    pub fn read_grid_event(&mut self) -> Option<GridEvent> {
        self.grid.events.pop_front()
    }

    pub fn add_arc_turn_event(&mut self, index: u8, delta: i8) {
        self.arc.push(ArcEvent::Turn { index, delta });
    }

    pub fn add_arc_press_event(&mut self, index: u8, pressed: bool) {
        self.arc.push(ArcEvent::Press { index, pressed });
    }

    pub fn arc_event_available(&self) -> bool {
        !self.arc.events.is_empty()
    }

    pub fn read_arc_event(&mut self) -> Option<ArcEvent> {
        self.arc.events.pop_front()
    }

    /// Grid events lost to overflow since creation
    pub fn dropped_grid_events(&self) -> u32 {
        self.grid.dropped
    }

    /// Arc events lost to overflow since creation
    pub fn dropped_arc_events(&self) -> u32 {
        self.arc.dropped
    }

    /// Discard all queued events; drop counters are kept
    pub fn clear(&mut self) {
        self.grid.events.clear();
        self.arc.events.clear();
    }
}
