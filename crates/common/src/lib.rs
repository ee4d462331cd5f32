//! Shared value types for the cube field workspace.

mod types;

pub use types::{ColorParseError, PlaneBounds, Rgb, Transform};
