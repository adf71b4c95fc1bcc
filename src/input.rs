//! Input primitives shared by the platform loop and the controller.
//!
//! Keys are polled as held/released once per frame. Edge-triggered actions
//! go through a [`Latch`] so that holding a key fires only once.

use std::collections::HashSet;
use glam::DVec2;
use winit::event::*;
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
    Ascend,
    Descend,
    ResetDistance,
    Report,
    Quit,
}

impl Action {
    pub fn key(self) -> KeyCode {
        match self {
            Action::Forward => KeyCode::KeyW,
            Action::Backward => KeyCode::KeyS,
            Action::StrafeLeft => KeyCode::KeyA,
            Action::StrafeRight => KeyCode::KeyD,
            Action::Ascend => KeyCode::Space,
            Action::Descend => KeyCode::ShiftLeft,
            Action::ResetDistance => KeyCode::KeyT,
            Action::Report => KeyCode::KeyP,
            Action::Quit => KeyCode::Escape,
        }
    }
}

/// Anything that can answer "is this action's key down right now".
pub trait KeySource {
    fn is_held(&self, action: Action) -> bool;
}

/// Held-key set maintained from window events.
#[derive(Debug, Default)]
pub struct KeyboardState {
    held: HashSet<KeyCode>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(key), state, .. }, ..
            } => {
                self.set(*key, *state == ElementState::Pressed);
                true
            }
            _ => false,
        }
    }

    pub fn set(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}

impl KeySource for KeyboardState {
    fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action.key())
    }
}

/// One-shot trigger: fires on the first frame a key is seen held, re-arms on release.
#[derive(Debug, Clone, Copy)]
pub struct Latch {
    armed: bool,
}

impl Default for Latch {
    fn default() -> Self {
        Self { armed: true }
    }
}

impl Latch {
    pub fn poll(&mut self, held: bool) -> bool {
        if !held {
            self.armed = true;
            return false;
        }
        std::mem::replace(&mut self.armed, false)
    }
}

/// Turns absolute cursor positions into per-event offsets.
///
/// The first position after a reset only becomes the reference point and
/// yields no offset, so re-capturing the pointer never snaps the view.
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorTracker {
    last: Option<DVec2>,
}

impl CursorTracker {
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Returns `(dx, dy)` with y flipped so that moving up is positive.
    pub fn offset(&mut self, x: f64, y: f64) -> Option<(f32, f32)> {
        let prev = self.last.replace(DVec2::new(x, y))?;
        Some(((x - prev.x) as f32, (prev.y - y) as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_fires_once_per_press() {
        let mut latch = Latch::default();
        let frames = [true, true, true, false, false, true, true];
        let fired: Vec<bool> = frames.iter().map(|&held| latch.poll(held)).collect();
        assert_eq!(fired, [true, false, false, false, false, true, false]);
    }

    #[test]
    fn first_cursor_event_is_reference_only() {
        let mut tracker = CursorTracker::default();
        assert_eq!(tracker.offset(5000.0, -3000.0), None);
        assert_eq!(tracker.offset(5010.0, -3004.0), Some((10.0, 4.0)));
        tracker.reset();
        assert_eq!(tracker.offset(0.0, 0.0), None);
        assert_eq!(tracker.offset(0.0, 2.0), Some((0.0, -2.0)));
    }

    #[test]
    fn keyboard_tracks_held_keys() {
        let mut keys = KeyboardState::new();
        keys.set(KeyCode::KeyW, true);
        keys.set(KeyCode::KeyT, true);
        assert!(keys.is_held(Action::Forward));
        assert!(keys.is_held(Action::ResetDistance));
        keys.set(KeyCode::KeyW, false);
        assert!(!keys.is_held(Action::Forward));
        keys.clear();
        assert!(!keys.is_held(Action::ResetDistance));
    }
}
