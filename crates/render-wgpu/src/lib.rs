//! wgpu render backend for the cube field.
//!
//! Draws the field as instanced, Lambert-lit boxes over a ground plane, with
//! optional axes and spot light helpers. The camera orbits the origin.
//!
//! # Invariants
//! - Renderer never mutates the field.
//! - Camera motion is host state, outside the field kernel.

mod camera;
mod gpu;
mod shaders;

pub use camera::OrbitCamera;
pub use gpu::{SceneDecor, WgpuRenderer};
