//! Turns polled keys and cursor motion into camera/player motion.
//!
//! Per frame: translate, accumulate distance, then evaluate the one-shot
//! actions. Because distance is accumulated first, a reset pressed on a
//! moving frame clears a total that already includes that frame.

use std::fmt;
use glam::Vec3;
use crate::config::ViewerConfig;
use crate::input::{Action, KeySource};
use crate::scene::SceneState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelReport {
    pub position: Vec3,
    pub distance: f32,
}

impl fmt::Display for TravelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}\nDistance Traveled: {} units",
            self.position.x, self.position.y, self.position.z, self.distance
        )
    }
}

/// What happened this frame beyond the state mutation itself.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameActions {
    pub quit: bool,
    /// Total that was cleared by a reset, if one fired.
    pub cleared_distance: Option<f32>,
    pub report: Option<TravelReport>,
}

#[derive(Debug, Clone, Copy)]
pub struct Controller {
    pub move_speed: f32,
    pub sensitivity: f32,
}

impl Controller {
    pub fn from_config(cfg: &ViewerConfig) -> Self {
        Self { move_speed: cfg.move_speed, sensitivity: cfg.mouse_sensitivity }
    }

    /// Feeds one absolute cursor position. Returns whether the view rotated.
    pub fn look(&self, scene: &mut SceneState, x: f64, y: f64) -> bool {
        match scene.cursor.offset(x, y) {
            Some((dx, dy)) => {
                scene.camera.rotate(dx * self.sensitivity, dy * self.sensitivity);
                true
            }
            None => false,
        }
    }

    pub fn update(&self, scene: &mut SceneState, keys: &impl KeySource, dt: f32) -> FrameActions {
        let step = self.move_speed * dt;
        let front = scene.camera.front;
        let right = scene.camera.right();
        let up = scene.camera.up;

        let mut delta = Vec3::ZERO;
        for (action, dir) in [
            (Action::Forward, front),
            (Action::Backward, -front),
            (Action::StrafeRight, right),
            (Action::StrafeLeft, -right),
            (Action::Ascend, up),
            (Action::Descend, -up),
        ] {
            if keys.is_held(action) {
                delta += dir * step;
            }
        }
        scene.camera.position += delta;
        scene.player.position += delta;
        scene.distance_traveled += delta.length();

        let mut actions = FrameActions::default();
        if scene.reset_latch.poll(keys.is_held(Action::ResetDistance)) {
            actions.cleared_distance = Some(scene.distance_traveled);
            scene.distance_traveled = 0.0;
        }
        if scene.report_latch.poll(keys.is_held(Action::Report)) {
            let report = TravelReport { position: scene.camera.position, distance: scene.distance_traveled };
            log::info!("{report}");
            actions.report = Some(report);
        }
        actions.quit = keys.is_held(Action::Quit);
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Held(Vec<Action>);

    impl KeySource for Held {
        fn is_held(&self, action: Action) -> bool {
            self.0.contains(&action)
        }
    }

    fn setup() -> (Controller, SceneState) {
        let cfg = ViewerConfig::default();
        (Controller::from_config(&cfg), SceneState::new(&cfg))
    }

    #[test]
    fn first_look_event_does_not_rotate() {
        let (ctl, mut scene) = setup();
        let before = scene.camera.clone();
        assert!(!ctl.look(&mut scene, 12345.0, -678.0));
        assert_eq!(scene.camera, before);
        assert!(ctl.look(&mut scene, 12355.0, -678.0));
        assert!((scene.camera.yaw - (before.yaw + 1.0)).abs() < 1e-4);
    }

    #[test]
    fn moving_cursor_down_pitches_down() {
        let (ctl, mut scene) = setup();
        ctl.look(&mut scene, 0.0, 0.0);
        ctl.look(&mut scene, 0.0, 50.0);
        assert!((scene.camera.pitch + 5.0).abs() < 1e-4);
    }

    #[test]
    fn pitch_stays_clamped_under_large_input() {
        let (ctl, mut scene) = setup();
        ctl.look(&mut scene, 0.0, 0.0);
        for i in 1..100 {
            ctl.look(&mut scene, 0.0, -1.0e5 * i as f64);
            assert!(scene.camera.pitch <= 89.0 && scene.camera.pitch >= -89.0);
        }
        assert_eq!(scene.camera.pitch, 89.0);
    }

    #[test]
    fn camera_and_player_move_together() {
        let (ctl, mut scene) = setup();
        let offset = scene.camera.position - scene.player.position;
        ctl.update(&mut scene, &Held(vec![Action::Forward, Action::StrafeLeft, Action::Ascend]), 0.1);
        assert_eq!(scene.camera.position - scene.player.position, offset);
    }

    #[test]
    fn forward_moves_along_front() {
        let (ctl, mut scene) = setup();
        let start = scene.player.position;
        ctl.update(&mut scene, &Held(vec![Action::Forward]), 0.5);
        let moved = scene.player.position - start;
        assert!((moved - scene.camera.front * 5.0).length() < 1e-4);
    }

    #[test]
    fn opposite_keys_cancel() {
        let (ctl, mut scene) = setup();
        let start = scene.player.position;
        ctl.update(&mut scene, &Held(vec![Action::Ascend, Action::Descend]), 1.0);
        assert!((scene.player.position - start).length() < 1e-5);
    }

    #[test]
    fn movement_scales_with_delta_time() {
        let (ctl, mut a) = setup();
        let (_, mut b) = setup();
        let keys = Held(vec![Action::Forward, Action::StrafeRight]);
        ctl.update(&mut a, &keys, 0.01);
        ctl.update(&mut b, &keys, 0.03);
        assert!((b.distance_traveled - 3.0 * a.distance_traveled).abs() < 1e-4);
    }

    #[test]
    fn distance_is_monotonic_until_reset() {
        let (ctl, mut scene) = setup();
        let keys = Held(vec![Action::Backward]);
        let mut last = 0.0;
        for _ in 0..10 {
            ctl.update(&mut scene, &keys, 0.016);
            assert!(scene.distance_traveled >= last);
            last = scene.distance_traveled;
        }
        ctl.update(&mut scene, &Held(vec![]), 0.016);
        assert_eq!(scene.distance_traveled, last);
        ctl.update(&mut scene, &Held(vec![Action::ResetDistance]), 0.016);
        assert_eq!(scene.distance_traveled, 0.0);
    }

    #[test]
    fn reset_counts_same_frame_movement_first() {
        let (ctl, mut scene) = setup();
        ctl.update(&mut scene, &Held(vec![Action::Forward]), 0.1);
        let actions = ctl.update(&mut scene, &Held(vec![Action::Forward, Action::ResetDistance]), 0.1);
        let cleared = actions.cleared_distance.unwrap();
        assert!((cleared - 2.0).abs() < 1e-4);
        assert_eq!(scene.distance_traveled, 0.0);
    }

    #[test]
    fn held_reset_fires_once() {
        let (ctl, mut scene) = setup();
        let fired: Vec<bool> = (0..5)
            .map(|_| ctl.update(&mut scene, &Held(vec![Action::ResetDistance, Action::Forward]), 0.1))
            .map(|a| a.cleared_distance.is_some())
            .collect();
        assert_eq!(fired, [true, false, false, false, false]);
        assert!((scene.distance_traveled - 4.0).abs() < 1e-4);
        ctl.update(&mut scene, &Held(vec![]), 0.1);
        let again = ctl.update(&mut scene, &Held(vec![Action::ResetDistance]), 0.1);
        assert!(again.cleared_distance.is_some());
    }

    #[test]
    fn report_carries_position_and_distance() {
        let (ctl, mut scene) = setup();
        ctl.update(&mut scene, &Held(vec![Action::Ascend]), 0.2);
        let actions = ctl.update(&mut scene, &Held(vec![Action::Report]), 0.2);
        let report = actions.report.unwrap();
        assert_eq!(report.position, scene.camera.position);
        assert!((report.distance - 2.0).abs() < 1e-4);
        assert!(report.to_string().contains("Distance Traveled: "));
        let held = ctl.update(&mut scene, &Held(vec![Action::Report]), 0.2);
        assert!(held.report.is_none());
    }

    #[test]
    fn quit_is_not_latched() {
        let (ctl, mut scene) = setup();
        assert!(ctl.update(&mut scene, &Held(vec![Action::Quit]), 0.0).quit);
        assert!(ctl.update(&mut scene, &Held(vec![Action::Quit]), 0.0).quit);
        assert!(!ctl.update(&mut scene, &Held(vec![]), 0.0).quit);
    }
}
