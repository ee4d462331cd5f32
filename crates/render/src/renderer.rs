use cubefield_common::Rgb;
use cubefield_kernel::ParticleField;
use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl SceneView {
    /// Where the camera starts and where "reset camera" puts it back.
    pub const HOME_EYE: Vec3 = Vec3::new(-380.0, 120.0, 375.0);
}

impl Default for SceneView {
    fn default() -> Self {
        Self {
            eye: Self::HOME_EYE,
            target: Vec3::ZERO,
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// What a rendering surface needs to draw one particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxDescriptor {
    /// Width, height, depth.
    pub size: Vec3,
    pub color: Rgb,
    pub position: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
}

impl BoxDescriptor {
    pub fn model_matrix(&self) -> Mat4 {
        let q = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::from_scale_rotation_translation(self.size, q, self.position)
    }
}

/// Snapshot the field as box descriptors, in field order.
pub fn describe_field(field: &ParticleField) -> Vec<BoxDescriptor> {
    let boxes: Vec<BoxDescriptor> = field
        .iter()
        .map(|p| BoxDescriptor {
            size: p.size(),
            color: p.color(),
            position: p.position(),
            rotation: p.transform().rotation,
        })
        .collect();
    tracing::trace!(count = boxes.len(), "described field");
    boxes
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the field and a view configuration, then produces
/// output. It never mutates the field.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given field and view.
    fn render(&self, field: &ParticleField, view: &SceneView) -> Self::Output;
}

/// Human-readable dump of the field, used for the "output objects" action and
/// the headless CLI.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Maximum particle rows to print; `None` prints all.
    pub max_rows: Option<usize>,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rows(max_rows: usize) -> Self {
        Self {
            max_rows: Some(max_rows),
        }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, field: &ParticleField, view: &SceneView) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Particle Field ===");
        let _ = writeln!(out, "Particles: {}", field.len());
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees
        );

        let rows = self.max_rows.unwrap_or(usize::MAX);
        for (i, b) in describe_field(field).iter().take(rows).enumerate() {
            let _ = writeln!(
                out,
                "  cube-{i} size=({:.2}, {:.2}, {:.2}) color={} pos=({:.2}, {:.2}, {:.2})",
                b.size.x, b.size.y, b.size.z, b.color, b.position.x, b.position.y, b.position.z
            );
        }
        if field.len() > rows {
            let _ = writeln!(out, "  ... {} more", field.len() - rows);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubefield_kernel::FieldConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn field_with_batch() -> ParticleField {
        let mut field = ParticleField::new();
        field
            .add_batch(&mut StdRng::seed_from_u64(3), &FieldConfig::default())
            .unwrap();
        field
    }

    #[test]
    fn debug_renderer_empty_field() {
        let field = ParticleField::new();
        let output = DebugTextRenderer::new().render(&field, &SceneView::default());
        assert!(output.contains("Particles: 0"));
        assert!(output.contains("fov=45"));
    }

    #[test]
    fn debug_renderer_lists_particles() {
        let field = field_with_batch();
        let output = DebugTextRenderer::new().render(&field, &SceneView::default());
        assert!(output.contains("Particles: 100"));
        assert!(output.contains("cube-99"));
        assert!(!output.contains("more"));
    }

    #[test]
    fn debug_renderer_truncates_rows() {
        let field = field_with_batch();
        let output = DebugTextRenderer::with_max_rows(3).render(&field, &SceneView::default());
        assert!(output.contains("cube-2"));
        assert!(!output.contains("cube-3 "));
        assert!(output.contains("... 97 more"));
    }

    #[test]
    fn descriptors_follow_field_order() {
        let field = field_with_batch();
        let boxes = describe_field(&field);
        assert_eq!(boxes.len(), field.len());
        for (b, p) in boxes.iter().zip(field.iter()) {
            assert_eq!(b.size, p.size());
            assert_eq!(b.position, p.position());
            assert_eq!(b.color, p.color());
        }
    }

    #[test]
    fn model_matrix_scales_and_translates() {
        let b = BoxDescriptor {
            size: Vec3::new(2.0, 4.0, 6.0),
            color: Rgb::WHITE,
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::ZERO,
        };
        let m = b.model_matrix();
        assert!(m.transform_point3(Vec3::splat(0.5)).abs_diff_eq(Vec3::new(2.0, 4.0, 6.0), 1e-5));
        assert!(m.transform_point3(Vec3::ZERO).abs_diff_eq(b.position, 1e-5));
    }

    #[test]
    fn scene_view_default_is_home() {
        let view = SceneView::default();
        assert_eq!(view.eye, SceneView::HOME_EYE);
        assert_eq!(view.target, Vec3::ZERO);
        assert_eq!(view.fov_degrees, 45.0);
    }
}
