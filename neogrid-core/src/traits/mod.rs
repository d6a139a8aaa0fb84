//! Hardware abstraction traits
//!
//! These traits define the interface between the device engine and the
//! board-specific LED and key hardware.

pub mod keypad;
pub mod pixels;

pub use keypad::{KeyEdge, KeySource};
pub use pixels::PixelSink;
