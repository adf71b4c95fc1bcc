// camera.rs
use glam::{Mat4, Vec3};
use crate::config::ViewerConfig;

pub const PITCH_LIMIT: f32 = 89.0;

/// Angles are kept in degrees; `front` is always derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        Self { position, front: front_from_angles(yaw, pitch), up: Vec3::Y, yaw, pitch }
    }

    pub fn from_config(cfg: &ViewerConfig) -> Self {
        Self::new(Vec3::from(cfg.start_position), cfg.start_yaw_deg, cfg.start_pitch_deg)
    }

    /// Applies an already-scaled angular offset. Yaw is unbounded; pitch is clamped.
    pub fn rotate(&mut self, yaw_offset: f32, pitch_offset: f32) {
        self.yaw += yaw_offset;
        self.pitch = (self.pitch + pitch_offset).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.front = front_from_angles(self.yaw, self.pitch);
    }

    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize_or_zero()
    }

    /// Eye sits behind and above `target`. Only the y (height) and z (back
    /// distance) components of `offset` are used.
    pub fn eye_behind(&self, target: Vec3, offset: Vec3) -> Vec3 {
        target - self.front * offset.z + self.up * offset.y
    }

    pub fn view_matrix(&self, target: Vec3) -> Mat4 {
        Mat4::look_at_rh(self.position, target, self.up)
    }
}

pub fn front_from_angles(yaw: f32, pitch: f32) -> Vec3 {
    let (sin_pitch, cos_pitch) = pitch.to_radians().sin_cos();
    let (sin_yaw, cos_yaw) = yaw.to_radians().sin_cos();
    Vec3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize()
}

#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Projection {
    pub fn new(cfg: &ViewerConfig, width: u32, height: u32) -> Self {
        let mut proj = Self { fov_y: cfg.fov_y_deg, aspect: 1.0, z_near: cfg.z_near, z_far: cfg.z_far };
        proj.resize(width, height);
        proj
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect, self.z_near, self.z_far)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view: view.to_cols_array_2d(), projection: projection.to_cols_array_2d() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn default_yaw_looks_down_negative_z() {
        let cam = Camera::new(Vec3::ZERO, -90.0, 0.0);
        assert!(approx(cam.front, Vec3::new(0.0, 0.0, -1.0)));
        assert!(approx(cam.right(), Vec3::X));
    }

    #[test]
    fn pitch_clamps_at_limits() {
        let mut cam = Camera::new(Vec3::ZERO, 0.0, 0.0);
        cam.rotate(0.0, 500.0);
        assert_eq!(cam.pitch, PITCH_LIMIT);
        cam.rotate(0.0, -5000.0);
        assert_eq!(cam.pitch, -PITCH_LIMIT);
        assert!((cam.front.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn yaw_is_unbounded() {
        let mut cam = Camera::new(Vec3::ZERO, 0.0, 0.0);
        cam.rotate(720.0, 0.0);
        assert_eq!(cam.yaw, 720.0);
        assert!(approx(cam.front, Vec3::X));
    }

    #[test]
    fn eye_ignores_offset_x() {
        let cam = Camera::new(Vec3::ZERO, -90.0, 0.0);
        let target = Vec3::new(1.0, 2.0, 3.0);
        let a = cam.eye_behind(target, Vec3::new(10.0, 3.0, 10.0));
        let b = cam.eye_behind(target, Vec3::new(-99.0, 3.0, 10.0));
        assert_eq!(a, b);
        // Looking down -Z, "behind" is +Z.
        assert!(approx(a, Vec3::new(1.0, 5.0, 13.0)));
    }

    #[test]
    fn projection_tracks_viewport() {
        let mut proj = Projection::new(&ViewerConfig::default(), 1920, 1080);
        assert!((proj.aspect - 16.0 / 9.0).abs() < 1e-6);
        proj.resize(0, 600);
        assert!((proj.aspect - 16.0 / 9.0).abs() < 1e-6);
        proj.resize(800, 800);
        assert_eq!(proj.aspect, 1.0);
    }
}
