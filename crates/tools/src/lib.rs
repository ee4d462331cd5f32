//! Developer Tooling: field inspector and frame-timing display.
//!
//! # Invariants
//! - Tools only read the field.

mod frame_timer;
mod inspector;

pub use frame_timer::FrameTimer;
pub use inspector::{FieldInspector, FieldSummary, ParticleInfo};
