//! Surface materials.
//!
//! A material property is either a constant value or a sampled texture, and
//! the distinction is a tagged enum rather than a runtime type check: uniform
//! packing matches on it exhaustively. Constant-valued properties still bind
//! a shared 1x1 white fallback texture so every mesh uses one pipeline; the
//! packed flags tell the shader which source to read.

use std::sync::Arc;

use glam::Vec3;

use crate::texture::Texture;

/// A material input: constant scalar, constant color, or sampled texture.
#[derive(Clone, Debug)]
pub enum MaterialProperty {
    Scalar(f32),
    Color(Vec3),
    Texture(Arc<Texture>),
}

impl MaterialProperty {
    /// The constant scalar value, or `default` when the property is a color
    /// or texture.
    pub fn scalar_or(&self, default: f32) -> f32 {
        match self {
            MaterialProperty::Scalar(v) => *v,
            MaterialProperty::Color(_) | MaterialProperty::Texture(_) => default,
        }
    }

    /// The constant color value, or `default` when the property is a scalar
    /// or texture.
    pub fn color_or(&self, default: Vec3) -> Vec3 {
        match self {
            MaterialProperty::Color(c) => *c,
            MaterialProperty::Scalar(_) | MaterialProperty::Texture(_) => default,
        }
    }

    /// The sampled texture, if any.
    pub fn texture(&self) -> Option<&Arc<Texture>> {
        match self {
            MaterialProperty::Texture(t) => Some(t),
            MaterialProperty::Scalar(_) | MaterialProperty::Color(_) => None,
        }
    }
}

/// A physically based surface description.
#[derive(Clone, Debug)]
pub struct PhysicalMaterial {
    pub albedo: MaterialProperty,
    pub metallic: MaterialProperty,
    pub roughness: MaterialProperty,
    pub ao: MaterialProperty,
    pub emission: f32,
}

impl Default for PhysicalMaterial {
    fn default() -> Self {
        Self {
            albedo: MaterialProperty::Color(Vec3::new(0.3, 0.1, 1.0)),
            metallic: MaterialProperty::Scalar(0.3),
            roughness: MaterialProperty::Scalar(0.8),
            ao: MaterialProperty::Scalar(0.2),
            emission: 0.0,
        }
    }
}

/// Packed material block for the mesh shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniforms {
    pub albedo: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub ao: f32,
    pub emission: f32,
    pub use_albedo_map: f32,
    pub use_metallic_map: f32,
    pub use_roughness_map: f32,
    pub use_ao_map: f32,
    pub _pad: f32,
}

fn flag(sampled: bool) -> f32 {
    if sampled { 1.0 } else { 0.0 }
}

impl PhysicalMaterial {
    /// Pack this material for upload: constants inline, per-property flags
    /// marking which slots the shader should sample instead.
    pub fn uniforms(&self) -> MaterialUniforms {
        MaterialUniforms {
            albedo: self.albedo.color_or(Vec3::ONE).to_array(),
            metallic: self.metallic.scalar_or(1.0),
            roughness: self.roughness.scalar_or(1.0),
            ao: self.ao.scalar_or(1.0),
            emission: self.emission,
            use_albedo_map: flag(self.albedo.texture().is_some()),
            use_metallic_map: flag(self.metallic.texture().is_some()),
            use_roughness_map: flag(self.roughness.texture().is_some()),
            use_ao_map: flag(self.ao.texture().is_some()),
            _pad: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material_matches_reference_values() {
        let mat = PhysicalMaterial::default();
        let u = mat.uniforms();
        assert_eq!(u.albedo, [0.3, 0.1, 1.0]);
        assert_eq!(u.metallic, 0.3);
        assert_eq!(u.roughness, 0.8);
        assert_eq!(u.ao, 0.2);
        assert_eq!(u.emission, 0.0);
    }

    #[test]
    fn constant_properties_clear_sample_flags() {
        let u = PhysicalMaterial::default().uniforms();
        assert_eq!(u.use_albedo_map, 0.0);
        assert_eq!(u.use_metallic_map, 0.0);
        assert_eq!(u.use_roughness_map, 0.0);
        assert_eq!(u.use_ao_map, 0.0);
    }

    #[test]
    fn scalar_slot_holding_a_color_falls_back() {
        let mat = PhysicalMaterial {
            metallic: MaterialProperty::Color(Vec3::splat(0.5)),
            ..Default::default()
        };
        assert_eq!(mat.uniforms().metallic, 1.0);
    }

    #[test]
    fn uniform_block_is_pod_sized() {
        // 3 + 1 floats, then 8 more: 48 bytes, a multiple of 16.
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 48);
    }
}
