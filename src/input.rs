//! Input collection and the per-frame snapshot.
//!
//! Window events accumulate into an [`InputCollector`]; once per frame the
//! app drains it into an [`InputSnapshot`], a plain value handed to whoever
//! needs input that frame. Consumers never read live input state, so a
//! frame's input cannot change underneath it.

use std::collections::HashSet;

use glam::{Vec2, Vec3};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Input for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputSnapshot {
    /// Movement axes in [-1, 1]: x strafe, y vertical, z forward.
    pub movement: Vec3,
    /// Mouse travel in pixels since the previous snapshot.
    pub mouse_delta: Vec2,
    /// Whether mouse look is engaged (right button held).
    pub look_active: bool,
}

/// Accumulates winit events between frames.
#[derive(Default)]
pub struct InputCollector {
    keys_down: HashSet<KeyCode>,
    look_active: bool,
    mouse_position: Vec2,
    mouse_delta: Vec2,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a window event into the pending state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            self.keys_down.insert(key);
                        }
                        ElementState::Released => {
                            self.keys_down.remove(&key);
                        }
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if *button == MouseButton::Right {
                    self.look_active = *state == ElementState::Pressed;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);
                self.mouse_delta += new_pos - self.mouse_position;
                self.mouse_position = new_pos;
            }
            _ => {}
        }
    }

    /// Produce this frame's snapshot and reset the per-frame accumulators.
    pub fn snapshot(&mut self) -> InputSnapshot {
        let axis = |neg: KeyCode, pos: KeyCode| {
            let mut v = 0.0;
            if self.keys_down.contains(&neg) {
                v -= 1.0;
            }
            if self.keys_down.contains(&pos) {
                v += 1.0;
            }
            v
        };

        let snapshot = InputSnapshot {
            movement: Vec3::new(
                axis(KeyCode::KeyA, KeyCode::KeyD),
                axis(KeyCode::KeyE, KeyCode::KeyQ),
                axis(KeyCode::KeyS, KeyCode::KeyW),
            ),
            mouse_delta: self.mouse_delta,
            look_active: self.look_active,
        };
        self.mouse_delta = Vec2::ZERO;
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(collector: &mut InputCollector, key: KeyCode) {
        collector.keys_down.insert(key);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut collector = InputCollector::new();
        press(&mut collector, KeyCode::KeyW);
        press(&mut collector, KeyCode::KeyS);
        assert_eq!(collector.snapshot().movement.z, 0.0);
    }

    #[test]
    fn forward_is_positive_z_axis() {
        let mut collector = InputCollector::new();
        press(&mut collector, KeyCode::KeyW);
        assert_eq!(collector.snapshot().movement.z, 1.0);
    }

    #[test]
    fn mouse_delta_drains_on_snapshot() {
        let mut collector = InputCollector::new();
        collector.mouse_delta = Vec2::new(12.0, -4.0);
        assert_eq!(collector.snapshot().mouse_delta, Vec2::new(12.0, -4.0));
        assert_eq!(collector.snapshot().mouse_delta, Vec2::ZERO);
    }

    #[test]
    fn held_keys_persist_across_snapshots() {
        let mut collector = InputCollector::new();
        press(&mut collector, KeyCode::KeyD);
        assert_eq!(collector.snapshot().movement.x, 1.0);
        assert_eq!(collector.snapshot().movement.x, 1.0);
    }
}
