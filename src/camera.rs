//! First-person perspective camera.
//!
//! The camera's orientation is driven by yaw and pitch in degrees; the
//! forward/right/up basis is re-derived and re-orthonormalized after every
//! orientation change, so drift cannot accumulate. View and projection
//! matrices are computed on demand from the current state.

use glam::{Mat4, Vec3};

use crate::input::InputSnapshot;

const PITCH_LIMIT: f32 = 89.0;

/// A yaw/pitch perspective camera with WASD+QE movement.
#[derive(Clone, Copy, Debug)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub front: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    /// Horizontal angle in degrees. -90 looks down -Z.
    pub yaw: f32,
    /// Vertical angle in degrees, clamped to (-90, 90).
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    /// Degrees of rotation per pixel of mouse travel.
    pub sensitivity: f32,
}

impl PerspectiveCamera {
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
            speed: 2.0,
            sensitivity: 0.1,
        };
        camera.update_vectors();
        camera
    }

    /// Recompute the orthonormal basis from yaw and pitch.
    pub fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(Vec3::Y).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    /// Apply mouse movement to yaw and pitch, clamping pitch away from the
    /// poles.
    pub fn process_mouse(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw += delta_x * self.sensitivity;
        self.pitch = (self.pitch - delta_y * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Apply this frame's movement axes.
    pub fn process_movement(&mut self, snapshot: &InputSnapshot, dt: f32) {
        let step = self.speed * dt;
        self.position += self.front * snapshot.movement.z * step;
        self.position += self.right * snapshot.movement.x * step;
        self.position += Vec3::Y * snapshot.movement.y * step;
        if snapshot.look_active {
            self.process_mouse(snapshot.mouse_delta.x, snapshot.mouse_delta.y);
        }
    }

    /// A copy of this camera moved to a different position.
    ///
    /// Orientation, projection, and control parameters are untouched; the
    /// water reflection pass renders through one of these so the shared
    /// camera is never mutated.
    pub fn at(&self, position: Vec3) -> Self {
        Self { position, ..*self }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_orientation_looks_down_negative_z() {
        let camera = PerspectiveCamera::new(Vec3::ZERO);
        assert_relative_eq!(camera.front.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(camera.front.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(camera.front.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn basis_stays_orthonormal_after_look() {
        let mut camera = PerspectiveCamera::new(Vec3::ZERO);
        camera.process_mouse(250.0, -120.0);
        assert_relative_eq!(camera.front.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.right.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.up.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.front.dot(camera.right), 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.front.dot(camera.up), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn pitch_is_clamped_short_of_the_poles() {
        let mut camera = PerspectiveCamera::new(Vec3::ZERO);
        camera.process_mouse(0.0, -10_000.0);
        assert_eq!(camera.pitch, 89.0);
        camera.process_mouse(0.0, 10_000.0);
        assert_eq!(camera.pitch, -89.0);
    }

    #[test]
    fn movement_follows_the_view_basis() {
        let mut camera = PerspectiveCamera::new(Vec3::ZERO);
        let snapshot = InputSnapshot {
            movement: Vec3::new(0.0, 0.0, 1.0),
            ..Default::default()
        };
        camera.process_movement(&snapshot, 0.5);
        // speed 2.0 for half a second straight ahead
        assert_relative_eq!(camera.position.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn repositioned_copy_keeps_orientation() {
        let mut camera = PerspectiveCamera::new(Vec3::new(0.0, 2.0, 5.0));
        camera.process_mouse(90.0, 30.0);
        let moved = camera.at(Vec3::new(0.0, -2.0, 5.0));
        assert_eq!(moved.front, camera.front);
        assert_eq!(moved.yaw, camera.yaw);
        assert_eq!(moved.position, Vec3::new(0.0, -2.0, 5.0));
    }
}
