//! Rendering Adapter: renderer-agnostic interface over the particle field.
//!
//! # Invariants
//! - Renderers read the field; they never mutate it.
//! - Lights, the ground plane and helpers are presentation data owned here,
//!   not by the field.

mod lighting;
mod renderer;

pub use lighting::{LightRig, PointLight, SceneToggles, SpotLight};
pub use renderer::{BoxDescriptor, DebugTextRenderer, Renderer, SceneView, describe_field};
