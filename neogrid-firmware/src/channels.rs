//! Inter-task signals and counters

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicU32, Ordering};

/// Raised whenever bytes arrive from the host
pub static HOST_ACTIVITY: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Commands executed since boot
pub static COMMANDS_EXECUTED: AtomicU32 = AtomicU32::new(0);

/// Bytes skipped in opcode position since boot
pub static BYTES_IGNORED: AtomicU32 = AtomicU32::new(0);

/// Partial commands dropped on timeout since boot
pub static COMMANDS_ABORTED: AtomicU32 = AtomicU32::new(0);

/// Bump one of the counters above
pub fn count(counter: &AtomicU32) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Read one of the counters above
pub fn read(counter: &AtomicU32) -> u32 {
    counter.load(Ordering::Relaxed)
}
