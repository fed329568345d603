//! Water surface with planar reflection and refraction.
//!
//! The water owns two HDR side targets. Each frame the scene renders itself
//! twice into them: once with the unmodified camera (refraction) and once
//! through a camera whose position is mirrored across the water plane
//! (reflection). The surface shader then samples both in screen space,
//! perturbed by a scrolling normal map.
//!
//! The mirror is a point reflection of the camera position about the plane
//! origin; orientation is left alone. That is a deliberate approximation,
//! and because the mirrored camera is a derived copy the shared scene camera
//! is never touched. Refraction renders the full scene with no clip plane,
//! also deliberate.

use glam::Vec3;

use crate::buffer::Vertex;
use crate::assets::Assets;
use crate::camera::PerspectiveCamera;
use crate::error::EngineError;
use crate::geometry::{self, Geometry};
use crate::gpu::{DEPTH_FORMAT, HDR_FORMAT, RenderDevice};
use crate::mesh::Transform;
use crate::target::OffscreenTarget;
use crate::texture::{ImageConfig, Texture};

/// Camera position mirrored through the water plane origin.
///
/// `mirror(mirror(p)) == p` exactly, and a camera already on the plane point
/// maps to itself.
pub fn reflected_position(camera_pos: Vec3, plane_point: Vec3) -> Vec3 {
    plane_point - (camera_pos - plane_point)
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct WaterUniforms {
    model: [[f32; 4]; 4],
    time: f32,
    distortion: f32,
    tiling: f32,
    _pad: f32,
}

/// The water subsystem: surface mesh, side targets, and pipeline.
pub struct Water {
    pub transform: Transform,
    /// Screen-space distortion applied from the normal map.
    pub distortion: f32,
    /// Normal map repeats across the surface.
    pub tiling: f32,
    pub reflection: OffscreenTarget,
    pub refraction: OffscreenTarget,
    geometry: Geometry,
    normal_map: Texture,
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Water {
    /// Build the water surface and its side targets at the given resolution.
    ///
    /// The `water_normal` asset is load-bearing; a missing normal map is a
    /// hard error rather than a flat-looking fallback.
    pub fn new(
        device: &RenderDevice,
        pass_layout: &wgpu::BindGroupLayout,
        assets: &Assets,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        let normal_img = assets.require("water_normal")?;
        let normal_map = Texture::from_image(
            device,
            normal_img,
            wgpu::AddressMode::Repeat,
            "Water Normal Map",
        )?;

        let side_config = ImageConfig::render_target(width, height, HDR_FORMAT);
        let reflection = OffscreenTarget::new(device, side_config, true, "Water Reflection")?;
        let refraction = OffscreenTarget::new(device, side_config, true, "Water Refraction")?;

        let geometry = Geometry::new(device, &geometry::plane(100.0), "Water Surface");

        let shader = device
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Water Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/water.wgsl").into()),
            });

        let uniform_buffer = device.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Water Uniforms"),
            size: std::mem::size_of::<WaterUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Water Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // Reflection, refraction, and normal map sit on three
                    // consecutive bindings.
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 4,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 5,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Water Pipeline Layout"),
                bind_group_layouts: &[pass_layout, &layout],
                push_constant_ranges: &[],
            });

        let pipeline = device
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Water Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: HDR_FORMAT,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let bind_group = make_bind_group(
            device,
            &layout,
            &uniform_buffer,
            &reflection,
            &refraction,
            &normal_map,
        );

        Ok(Self {
            transform: Transform::new(),
            distortion: 0.02,
            tiling: 6.0,
            reflection,
            refraction,
            geometry,
            normal_map,
            pipeline,
            layout,
            uniform_buffer,
            bind_group,
        })
    }

    /// The camera the reflection pass renders through.
    pub fn reflection_camera(&self, camera: &PerspectiveCamera) -> PerspectiveCamera {
        camera.at(reflected_position(
            camera.position,
            self.transform.translation,
        ))
    }

    /// Upload this frame's surface uniforms.
    pub fn upload(&self, device: &RenderDevice, time: f32) {
        let uniforms = WaterUniforms {
            model: self.transform.matrix().to_cols_array_2d(),
            time,
            distortion: self.distortion,
            tiling: self.tiling,
            _pad: 0.0,
        };
        device
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Draw the surface into the main pass. Group 0 must already hold the
    /// pass uniforms.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(1, &self.bind_group, &[]);
        self.geometry.draw(pass);
    }

    /// Reallocate both side targets at new dimensions and rebind them.
    pub fn resize(
        &mut self,
        device: &RenderDevice,
        width: u32,
        height: u32,
    ) -> Result<(), EngineError> {
        self.reflection.resize(device, width, height)?;
        self.refraction.resize(device, width, height)?;
        self.bind_group = make_bind_group(
            device,
            &self.layout,
            &self.uniform_buffer,
            &self.reflection,
            &self.refraction,
            &self.normal_map,
        );
        Ok(())
    }
}

fn make_bind_group(
    device: &RenderDevice,
    layout: &wgpu::BindGroupLayout,
    uniform_buffer: &wgpu::Buffer,
    reflection: &OffscreenTarget,
    refraction: &OffscreenTarget,
    normal_map: &Texture,
) -> wgpu::BindGroup {
    device.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Water Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&reflection.color.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&refraction.color.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&normal_map.view),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(&reflection.color.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::Sampler(&normal_map.sampler),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_is_an_involution() {
        let camera = Vec3::new(3.5, 7.25, -2.0);
        let plane = Vec3::new(0.0, 0.5, 0.0);
        assert_eq!(
            reflected_position(reflected_position(camera, plane), plane),
            camera
        );
    }

    #[test]
    fn plane_point_is_a_fixed_point() {
        let plane = Vec3::new(1.0, -0.25, 4.0);
        assert_eq!(reflected_position(plane, plane), plane);
    }

    #[test]
    fn repeated_frames_accumulate_no_drift() {
        let camera = Vec3::new(0.3, 1.7, -4.2);
        let plane = Vec3::new(0.0, -0.05, 0.0);
        let mut p = camera;
        for _ in 0..1000 {
            let mirrored = reflected_position(p, plane);
            p = reflected_position(mirrored, plane);
        }
        assert_eq!(p, camera);
    }

    #[test]
    fn mirror_crosses_the_plane_height() {
        let camera = Vec3::new(0.0, 2.0, 5.0);
        let plane = Vec3::ZERO;
        assert_eq!(reflected_position(camera, plane), Vec3::new(0.0, -2.0, -5.0));
    }
}
