use crate::config::YPolicy;
use cubefield_common::{PlaneBounds, Rgb, Transform};
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of a sampled box dimension.
pub const MAX_DIMENSION: f32 = 10.0;

/// Caller-supplied dimensions. `None`, zero or negative means "sample it".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SizeOverride {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub depth: Option<f32>,
}

/// A randomly sized, randomly colored box placed over the ground plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    size: Vec3,
    color: Rgb,
    base_position: Vec3,
    transform: Transform,
}

impl Particle {
    /// Sample a particle inside `plane` with no dimension overrides.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, plane: PlaneBounds, y_policy: YPolicy) -> Self {
        Self::sample_with(rng, plane, y_policy, SizeOverride::default())
    }

    /// Sample a particle, taking any positive override verbatim.
    ///
    /// Draw order is width, height, depth, color, x, y, z so a seeded
    /// generator yields the same sequence regardless of policy.
    pub fn sample_with<R: Rng + ?Sized>(
        rng: &mut R,
        plane: PlaneBounds,
        y_policy: YPolicy,
        overrides: SizeOverride,
    ) -> Self {
        let width = dimension(rng, overrides.width);
        let height = dimension(rng, overrides.height);
        let depth = dimension(rng, overrides.depth);
        let color = Rgb(rng.gen_range(0..=Rgb::MAX));

        let x = -plane.half_width() + rng.gen_range(0.0..1.0f32) * plane.width;
        let y = match y_policy {
            YPolicy::Resting => height / 2.0,
            YPolicy::Floating { ceiling } => rng.gen_range(0.0..1.0f32) * ceiling,
        };
        let z = -plane.half_depth() + rng.gen_range(0.0..1.0f32) * plane.depth;

        let position = Vec3::new(x, y, z);
        Self {
            size: Vec3::new(width, height, depth),
            color,
            base_position: position,
            transform: Transform::at(position),
        }
    }

    /// Box extents as `(width, height, depth)`.
    pub fn size(&self) -> Vec3 {
        self.size
    }

    pub fn width(&self) -> f32 {
        self.size.x
    }

    pub fn height(&self) -> f32 {
        self.size.y
    }

    pub fn depth(&self) -> f32 {
        self.size.z
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Position at creation time, before any animation.
    pub fn base_position(&self) -> Vec3 {
        self.base_position
    }

    /// Live transform as displayed.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub(crate) fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}

/// `uniform(0, MAX_DIMENSION]` unless a positive override is given.
fn dimension<R: Rng + ?Sized>(rng: &mut R, value: Option<f32>) -> f32 {
    match value {
        Some(v) if v > 0.0 => v,
        _ => MAX_DIMENSION * (1.0 - rng.gen_range(0.0..1.0f32)),
    }
}
