//! Control surface actions: every named, zero-argument action the panel and
//! keyboard shortcuts can trigger.
//!
//! # Invariants
//! - Panel buttons and shortcuts resolve to the same `ControlAction`.
//! - Hosts interpret actions; this crate holds no state.

pub mod action;

pub use action::ControlAction;
