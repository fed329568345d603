//! Sky dome rendering.
//!
//! The sky is a sphere drawn around the camera after the opaque meshes, with
//! depth writes disabled and a less-equal depth test so it only fills
//! background pixels. The shader either evaluates an analytic atmosphere
//! from [`SkyParams`] or, when an environment map was baked at load time,
//! samples the cube map instead.

use glam::{Mat4, Vec3};

use crate::error::EngineError;
use crate::gpu::{DEPTH_FORMAT, HDR_FORMAT, RenderDevice};
use crate::buffer::Vertex;
use crate::camera::PerspectiveCamera;
use crate::geometry::{self, Geometry};
use crate::texture::CubeTexture;

/// Analytic atmosphere parameters.
#[derive(Clone, Copy, Debug)]
pub struct SkyParams {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    /// Direction toward the sun (normalized at upload).
    pub sun_position: Vec3,
}

impl Default for SkyParams {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 3.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.7,
            sun_position: Vec3::new(0.4, 0.25, -1.0),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SkyUniforms {
    view_rot_proj: [[f32; 4]; 4],
    sun_dir: [f32; 3],
    turbidity: f32,
    rayleigh: f32,
    mie_coefficient: f32,
    mie_directional_g: f32,
    use_environment: f32,
}

/// The sky dome pass.
pub struct Sky {
    pub params: SkyParams,
    environment: Option<CubeTexture>,
    #[allow(dead_code)]
    fallback_cube: CubeTexture,
    geometry: Geometry,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Sky {
    /// Build the dome geometry and pipeline. `environment` is the optional
    /// baked cube map; without it the analytic shader path is used.
    pub fn new(
        device: &RenderDevice,
        params: SkyParams,
        environment: Option<CubeTexture>,
    ) -> Result<Self, EngineError> {
        let geometry = Geometry::new(device, &geometry::sphere(1.0, 16, 32), "Sky Dome");

        let shader = device
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Sky Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sky.wgsl").into()),
            });

        let uniform_buffer = device.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sky Uniforms"),
            size: std::mem::size_of::<SkyUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Sky Bind Group Layout"),
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
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::Cube,
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

        // An unused 1x1 cube keeps the bind group valid on the analytic path.
        let fallback_cube = CubeTexture::empty(device, 1, HDR_FORMAT, "Sky Fallback Cube")?;

        let env_ref = environment.as_ref().unwrap_or(&fallback_cube);
        let bind_group = device.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sky Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&env_ref.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&env_ref.sampler),
                },
            ],
        });

        let pipeline_layout = device
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Sky Pipeline Layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });

        let pipeline = device
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Sky Pipeline"),
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
                    // The camera sits inside the dome.
                    cull_mode: Some(wgpu::Face::Front),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        Ok(Self {
            params,
            environment,
            fallback_cube,
            geometry,
            pipeline,
            uniform_buffer,
            bind_group,
        })
    }

    pub fn has_environment(&self) -> bool {
        self.environment.is_some()
    }

    /// Upload this frame's uniforms. The view matrix is reduced to its
    /// rotation so the dome follows the camera without translating.
    pub fn upload(&self, device: &RenderDevice, camera: &PerspectiveCamera, aspect: f32) {
        let rot_view = Mat4::look_at_rh(Vec3::ZERO, camera.front, camera.up);
        let uniforms = SkyUniforms {
            view_rot_proj: (camera.projection(aspect) * rot_view).to_cols_array_2d(),
            sun_dir: self.params.sun_position.normalize().to_array(),
            turbidity: self.params.turbidity,
            rayleigh: self.params.rayleigh,
            mie_coefficient: self.params.mie_coefficient,
            mie_directional_g: self.params.mie_directional_g,
            use_environment: if self.environment.is_some() { 1.0 } else { 0.0 },
        };
        device
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Draw the dome. Rebinds group 0; callers restore their own bindings
    /// afterwards if they keep drawing.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        self.geometry.draw(pass);
    }
}
