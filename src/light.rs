//! Scene lights.

use glam::Vec3;

use crate::mesh::Transform;

/// A point light with position, color, and intensity.
///
/// Intensity is in the same photometric scale the shader's inverse-square
/// falloff expects, so useful values are in the hundreds.
#[derive(Clone, Debug)]
pub struct PointLight {
    pub transform: Transform,
    pub color: Vec3,
    pub intensity: f32,
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            transform: Transform::from_position(position),
            color,
            intensity,
        }
    }
}

/// A light source. Point lights only for now; the enum is the seam where
/// directional lights would land.
#[derive(Clone, Debug)]
pub enum Light {
    Point(PointLight),
}

impl Light {
    pub fn as_point(&self) -> &PointLight {
        match self {
            Light::Point(light) => light,
        }
    }
}
