//! Equirectangular-to-cube-map environment bake.
//!
//! Runs once at load time: a unit cube is rendered six times, once per cube
//! face, with a 90 degree capture camera looking down each axis, and the
//! fragment shader samples the equirectangular source by direction. The
//! resulting cube map feeds the sky dome.

use glam::{Mat4, Vec3};

use crate::buffer::Vertex;
use crate::error::EngineError;
use crate::geometry::{self, Geometry};
use crate::gpu::{HDR_FORMAT, RenderDevice};
use crate::target::{RenderConfig, begin_pass};
use crate::texture::{CubeTexture, Texture};

/// Edge length of each baked cube face.
pub const FACE_SIZE: u32 = 1024;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CaptureUniforms {
    view_proj: [[f32; 4]; 4],
}

/// View-projection matrices for the six capture directions, in cube face
/// order (+X, -X, +Y, -Y, +Z, -Z).
pub(crate) fn capture_views() -> [Mat4; 6] {
    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 10.0);
    let look = |dir: Vec3, up: Vec3| proj * Mat4::look_at_rh(Vec3::ZERO, dir, up);
    [
        look(Vec3::X, Vec3::NEG_Y),
        look(Vec3::NEG_X, Vec3::NEG_Y),
        look(Vec3::Y, Vec3::Z),
        look(Vec3::NEG_Y, Vec3::NEG_Z),
        look(Vec3::Z, Vec3::NEG_Y),
        look(Vec3::NEG_Z, Vec3::NEG_Y),
    ]
}

/// Bake an equirectangular image into a cube map.
///
/// Submits its own command encoder; by the time this returns the capture
/// work is queued and the cube map is safe to sample in later frames.
pub fn bake(device: &RenderDevice, equirect: &Texture) -> Result<CubeTexture, EngineError> {
    let cube = CubeTexture::empty(device, FACE_SIZE, HDR_FORMAT, "Environment Cube")?;
    let cube_geometry = Geometry::new(device, &geometry::cube(), "Environment Capture Cube");

    let shader = device
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Environment Capture Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("shaders/equirect_to_cube.wgsl").into(),
            ),
        });

    let layout = device
        .device
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Environment Capture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
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
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

    let pipeline_layout = device
        .device
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Environment Capture Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

    let pipeline = device
        .device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Environment Capture Pipeline"),
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
                // Capture from inside the cube.
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

    // One uniform buffer and bind group per face: all six passes live in a
    // single submission, so a shared buffer would be clobbered by the last
    // write before any pass ran.
    let views = capture_views();
    let face_resources: Vec<(wgpu::Buffer, wgpu::BindGroup)> = views
        .iter()
        .map(|view_proj| {
            use wgpu::util::DeviceExt;
            let buffer = device
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Environment Capture Uniforms"),
                    contents: bytemuck::cast_slice(&[CaptureUniforms {
                        view_proj: view_proj.to_cols_array_2d(),
                    }]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
            let bind_group = device.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Environment Capture Bind Group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&equirect.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&equirect.sampler),
                    },
                ],
            });
            (buffer, bind_group)
        })
        .collect();

    let mut encoder = device
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Environment Bake Encoder"),
        });

    for (face, (_, bind_group)) in face_resources.iter().enumerate() {
        let mut pass = begin_pass(
            &mut encoder,
            &cube.face_views[face],
            None,
            &RenderConfig::fullscreen(),
            "Environment Capture Pass",
        );
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        cube_geometry.draw(&mut pass);
    }

    device.queue.submit(std::iter::once(encoder.finish()));
    log::info!("baked environment cube map at {FACE_SIZE}x{FACE_SIZE} per face");

    Ok(cube)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_distinct_capture_views() {
        let views = capture_views();
        for i in 0..6 {
            for j in (i + 1)..6 {
                assert_ne!(views[i], views[j]);
            }
        }
    }
}
