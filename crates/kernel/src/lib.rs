//! Field Kernel: the particle field generator and its per-tick update.
//!
//! # Invariants
//! - A particle's dimensions, color and base position never change after creation.
//! - The field grows append-only in whole batches and only shrinks on reset.
//! - All randomness comes from an injected `rand::Rng`, so a seeded generator
//!   reproduces a field bit for bit.

pub mod config;
pub mod field;
pub mod particle;
pub mod simulation;

pub use config::{ConfigError, FieldConfig, FieldProfile, ScaleMode, YPolicy};
pub use field::{FieldEvent, FieldState, ParticleField};
pub use particle::{MAX_DIMENSION, Particle, SizeOverride};
pub use simulation::{SimParams, Simulation};
