// scene.rs
use std::time::Instant;
use glam::{Mat4, Vec3};
use crate::{camera::Camera, config::ViewerConfig, input::{CursorTracker, Latch}};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub position: Vec3,
}

/// All per-session mutable state, owned by the frame loop.
#[derive(Debug)]
pub struct SceneState {
    pub camera: Camera,
    pub player: Player,
    pub distance_traveled: f32,
    pub cursor: CursorTracker,
    pub reset_latch: Latch,
    pub report_latch: Latch,
}

impl SceneState {
    pub fn new(cfg: &ViewerConfig) -> Self {
        let camera = Camera::from_config(cfg);
        Self {
            player: Player { position: camera.position },
            camera,
            distance_traveled: 0.0,
            cursor: CursorTracker::default(),
            reset_latch: Latch::default(),
            report_latch: Latch::default(),
        }
    }

    /// Moves the camera behind the player and returns the view looking at it.
    pub fn follow_player(&mut self, offset: Vec3) -> Mat4 {
        let target = self.player.position;
        self.camera.position = self.camera.eye_behind(target, offset);
        self.camera.view_matrix(target)
    }

    /// Translate to the player, face along the camera yaw, then apply the
    /// model's fixed corrective turn.
    pub fn player_transform(&self, yaw_correction_deg: f32) -> Mat4 {
        Mat4::from_translation(self.player.position)
            * Mat4::from_rotation_y((-self.camera.yaw).to_radians())
            * Mat4::from_rotation_y(yaw_correction_deg.to_radians())
    }
}

/// Wall-clock delta between consecutive frames.
#[derive(Debug)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self { last: start }
    }

    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn player_starts_at_camera() {
        let scene = SceneState::new(&ViewerConfig::default());
        assert_eq!(scene.player.position, Vec3::new(30.2, 28.0, 0.0));
        assert_eq!(scene.distance_traveled, 0.0);
    }

    #[test]
    fn player_transform_places_model_at_player() {
        let mut scene = SceneState::new(&ViewerConfig::default());
        scene.player.position = Vec3::new(4.0, 5.0, 6.0);
        let m = scene.player_transform(90.0);
        assert!((m.transform_point3(Vec3::ZERO) - Vec3::new(4.0, 5.0, 6.0)).length() < 1e-5);
    }

    #[test]
    fn player_faces_along_yaw() {
        let mut scene = SceneState::new(&ViewerConfig::default());
        scene.player.position = Vec3::ZERO;
        scene.camera.yaw = 0.0;
        // -yaw + 90 = 90 degrees about Y maps +X onto -Z.
        let v = scene.player_transform(90.0).transform_vector3(Vec3::X);
        assert!((v - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn follow_player_looks_at_player() {
        let mut scene = SceneState::new(&ViewerConfig::default());
        let view = scene.follow_player(Vec3::new(10.0, 3.0, 10.0));
        let eye_to_player = scene.player.position - scene.camera.position;
        assert!((eye_to_player.length() - (10.0f32 * 10.0 + 3.0 * 3.0).sqrt()).abs() < 1e-3);
        // The player lands on the view axis, in front of the camera.
        let p = view.transform_point3(scene.player.position);
        assert!(p.x.abs() < 1e-3 && p.y.abs() < 1e-3 && p.z < 0.0);
    }

    #[test]
    fn clock_measures_elapsed_time() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let dt = clock.tick_at(t0 + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-6);
        let dt = clock.tick_at(t0 + Duration::from_millis(48));
        assert!((dt - 0.032).abs() < 1e-6);
        assert_eq!(clock.tick_at(t0), 0.0);
    }
}
