use cubefield_common::{PlaneBounds, Rgb};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Cone-limited white light that looks at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Rgb,
    /// Half-angle of the cone in radians.
    pub angle: f32,
    pub enabled: bool,
}

/// Colored light with linear falloff to zero at `range`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Rgb,
    pub intensity: f32,
    pub range: f32,
}

/// Every light in the scene plus the fixed scene colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightRig {
    pub ambient: Rgb,
    pub ambient_enabled: bool,
    pub spot: SpotLight,
    pub points: [PointLight; 4],
    pub clear_color: Rgb,
    pub plane_color: Rgb,
}

impl LightRig {
    pub const DEFAULT_AMBIENT: Rgb = Rgb(0x0c0c0c);

    /// Lights laid out over `plane`: one colored point light above each
    /// quarter, a spot light off to one side.
    pub fn for_plane(plane: PlaneBounds) -> Self {
        let qx = plane.width / 4.0;
        let qz = plane.depth / 4.0;
        let point = |x: f32, z: f32, color: u32| PointLight {
            position: Vec3::new(x, 5.0, z),
            color: Rgb(color),
            intensity: 2.0,
            range: 100.0,
        };
        Self {
            ambient: Self::DEFAULT_AMBIENT,
            ambient_enabled: true,
            spot: SpotLight {
                position: Vec3::new(-80.0, 120.0, -10.0),
                target: Vec3::ZERO,
                color: Rgb::WHITE,
                angle: std::f32::consts::FRAC_PI_3,
                enabled: false,
            },
            points: [
                point(-qx, -qz, 0x0033ff),
                point(-qx, qz, 0xff0000),
                point(qx, -qz, 0xffff00),
                point(qx, qz, 0xff00ff),
            ],
            clear_color: Rgb(0x0a0a21),
            plane_color: Rgb(0x4b964b),
        }
    }
}

impl Default for LightRig {
    fn default() -> Self {
        Self::for_plane(PlaneBounds::default())
    }
}

/// Visibility switches for scene decorations and camera motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneToggles {
    pub show_axes: bool,
    pub show_plane: bool,
    pub show_spot_helper: bool,
    pub rotate_camera: bool,
}

impl Default for SceneToggles {
    fn default() -> Self {
        Self {
            show_axes: false,
            show_plane: true,
            show_spot_helper: false,
            rotate_camera: false,
        }
    }
}

impl SceneToggles {
    /// Values restored by "reset all": helpers and plane hidden.
    pub fn reset(&mut self) {
        self.show_axes = false;
        self.show_plane = false;
    }
}
