//! Transforms and renderable meshes.
//!
//! [`Transform`] stores translation, rotation, and scale separately; the
//! model matrix is derived from them on demand and never persisted, so
//! editing a component can never leave a stale matrix behind. Composition is
//! scale, then rotate, then translate.
//!
//! A [`Mesh`] ties shared [`Geometry`] to a [`PhysicalMaterial`] and a
//! transform, and owns the per-mesh uniform buffer and bind group the mesh
//! pipeline draws with.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::command::{DrawFunction, Shape};
use crate::geometry::Geometry;
use crate::gpu::RenderDevice;
use crate::material::{MaterialUniforms, PhysicalMaterial};
use crate::texture::Texture;

/// Position, rotation, and scale of an object.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn position(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// The model matrix, recomputed from the components every call.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Whether a draw descriptor can go through the mesh pipeline, which is
/// built for triangle lists only.
pub(crate) fn mesh_pipeline_compatible(draw: &DrawFunction) -> bool {
    draw.shape == Shape::Triangles
}

/// Per-mesh uniform block: model matrix plus packed material.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniforms {
    pub model: [[f32; 4]; 4],
    pub material: MaterialUniforms,
}

/// A renderable object: geometry, material, and placement.
pub struct Mesh {
    pub geometry: Arc<Geometry>,
    pub material: PhysicalMaterial,
    pub transform: Transform,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Mesh {
    /// Create a mesh and its GPU-side uniform buffer and bind group.
    ///
    /// `layout` is the mesh pipeline's per-mesh bind group layout and
    /// `fallback` the shared 1x1 white texture bound in any material slot
    /// that holds a constant instead of a texture.
    ///
    /// # Panics
    ///
    /// Panics if the geometry is not triangle-list shaped; the mesh pipeline
    /// has a fixed topology, so any other shape would draw wrong silently.
    pub fn new(
        device: &RenderDevice,
        layout: &wgpu::BindGroupLayout,
        fallback: &Arc<Texture>,
        geometry: Arc<Geometry>,
        material: PhysicalMaterial,
        transform: Transform,
    ) -> Self {
        assert!(
            mesh_pipeline_compatible(&geometry.draw_function()),
            "mesh geometry must be triangle lists, got {:?}",
            geometry.draw_function().shape
        );

        let uniform_buffer = device.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mesh Uniforms"),
            size: std::mem::size_of::<MeshUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let albedo = material.albedo.texture().unwrap_or(fallback);
        let metallic = material.metallic.texture().unwrap_or(fallback);
        let roughness = material.roughness.texture().unwrap_or(fallback);
        let ao = material.ao.texture().unwrap_or(fallback);

        let bind_group = device.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&albedo.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&metallic.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&roughness.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&ao.view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&albedo.sampler),
                },
            ],
        });

        Self {
            geometry,
            material,
            transform,
            uniform_buffer,
            bind_group,
        }
    }

    /// Re-derive the model matrix, repack the material, and upload both.
    ///
    /// Called once per frame before the scene passes; all passes in the frame
    /// share the same mesh state.
    pub fn upload_uniforms(&self, device: &RenderDevice) {
        let uniforms = MeshUniforms {
            model: self.transform.matrix().to_cols_array_2d(),
            material: self.material.uniforms(),
        };
        device
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Bind the per-mesh group and draw the geometry.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(1, &self.bind_group, &[]);
        self.geometry.draw(pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn default_transform_is_identity() {
        let t = Transform::new();
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn scale_applies_before_translation() {
        let t = Transform::new()
            .position(Vec3::new(0.0, -0.6, 0.0))
            .scale(Vec3::new(100.0, 0.1, 100.0));
        // A corner of the unit cube lands at scale * corner + translation.
        let p = t.matrix() * Vec4::new(0.5, 0.5, 0.5, 1.0);
        approx::assert_relative_eq!(p.x, 50.0);
        approx::assert_relative_eq!(p.y, -0.55);
        approx::assert_relative_eq!(p.z, 50.0);
    }

    #[test]
    fn only_triangle_geometry_fits_the_mesh_pipeline() {
        use crate::geometry;
        assert!(mesh_pipeline_compatible(&geometry::cube().draw_function()));
        assert!(mesh_pipeline_compatible(
            &geometry::sphere(1.0, 8, 12).draw_function()
        ));
        assert!(mesh_pipeline_compatible(&geometry::plane(4.0).draw_function()));
        assert!(!mesh_pipeline_compatible(
            &geometry::screen_quad().draw_function()
        ));
    }

    #[test]
    fn matrix_tracks_component_edits() {
        let mut t = Transform::from_position(Vec3::X);
        let before = t.matrix();
        t.translation = Vec3::new(5.0, 0.0, 0.0);
        assert_ne!(before, t.matrix());
        assert_eq!(t.matrix().w_axis, Vec4::new(5.0, 0.0, 0.0, 1.0));
    }
}
