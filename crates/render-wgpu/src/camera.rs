use cubefield_render::SceneView;
use glam::{Mat4, Vec3};

/// Camera orbiting a target point, driven by mouse drag, wheel zoom and an
/// optional auto-rotation.
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Angle around the Y axis, measured from +Z towards +X.
    pub yaw: f32,
    /// Elevation above the XZ plane.
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    /// Radians per second while auto-rotating.
    pub auto_rotate_speed: f32,
    home: SceneView,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_view(&SceneView::default())
    }
}

impl OrbitCamera {
    pub fn from_view(view: &SceneView) -> Self {
        let mut cam = Self {
            target: view.target,
            distance: 1.0,
            yaw: 0.0,
            pitch: 0.0,
            fov: view.fov_degrees.to_radians(),
            aspect: 16.0 / 9.0,
            near: view.near,
            far: view.far,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            auto_rotate_speed: std::f32::consts::TAU / 30.0,
            home: *view,
        };
        cam.look_from(view.eye);
        cam
    }

    fn look_from(&mut self, eye: Vec3) {
        let offset = eye - self.target;
        self.distance = offset.length().max(f32::EPSILON);
        self.yaw = offset.x.atan2(offset.z);
        self.pitch = (offset.y / self.distance).clamp(-1.0, 1.0).asin();
    }

    pub fn position(&self) -> Vec3 {
        let (sp, cp) = self.pitch.sin_cos();
        let (sy, cy) = self.yaw.sin_cos();
        self.target + self.distance * Vec3::new(cp * sy, sp, cp * cy)
    }

    /// Put the camera back where it started.
    pub fn reset(&mut self) {
        self.target = self.home.target;
        self.look_from(self.home.eye);
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.sensitivity;
        self.pitch += dy * self.sensitivity;
        self.pitch = self
            .pitch
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    /// Positive `steps` move closer.
    pub fn zoom(&mut self, steps: f32) {
        let factor = (1.0 - steps * self.zoom_speed).max(0.1);
        self.distance = (self.distance * factor).clamp(1.0, self.far * 0.9);
    }

    pub fn auto_rotate(&mut self, dt: f32) {
        self.yaw += self.auto_rotate_speed * dt;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Current camera as a renderer-agnostic view.
    pub fn scene_view(&self) -> SceneView {
        SceneView {
            eye: self.position(),
            target: self.target,
            fov_degrees: self.fov.to_degrees(),
            near: self.near,
            far: self.far,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_starts_at_home() {
        let cam = OrbitCamera::default();
        assert!(cam.position().abs_diff_eq(SceneView::HOME_EYE, 1e-2));
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn auto_rotate_keeps_distance() {
        let mut cam = OrbitCamera::default();
        let start = cam.position();
        cam.auto_rotate(1.0);
        assert_ne!(cam.position(), start);
        assert!((cam.position().length() - start.length()).abs() < 1e-2);
    }

    #[test]
    fn reset_restores_home_after_motion() {
        let mut cam = OrbitCamera::default();
        cam.rotate(120.0, -40.0);
        cam.zoom(3.0);
        cam.reset();
        assert!(cam.position().abs_diff_eq(SceneView::HOME_EYE, 1e-2));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = OrbitCamera::default();
        for _ in 0..200 {
            cam.zoom(5.0);
        }
        assert!(cam.distance >= 1.0);
        for _ in 0..200 {
            cam.zoom(-5.0);
        }
        assert!(cam.distance <= cam.far * 0.9);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = OrbitCamera::default();
        cam.rotate(0.0, 1.0e6);
        assert!(cam.pitch <= 89.0_f32.to_radians());
    }
}
