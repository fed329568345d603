//! Scene contents and the three scene passes.
//!
//! A [`Scene`] owns the camera, the mesh list, the lights, the sky dome, and
//! the water subsystem, plus the HDR target the post-processing chain reads
//! from. Each frame it renders the world three times: into the water's
//! refraction target with the live camera, into the water's reflection target
//! with a camera mirrored across the water plane, and finally into its own
//! output target where the water surface itself is drawn last.
//!
//! Every pass binds the same group layout at slot 0 (view-projection, camera
//! position, light, time). The three passes run inside one submission, so
//! each has its own uniform buffer; sharing one buffer across them would let
//! the last `write_buffer` win before any pass executed.

use std::sync::Arc;

use glam::Vec3;

use crate::assets::Assets;
use crate::buffer::Vertex;
use crate::camera::PerspectiveCamera;
use crate::environment;
use crate::error::EngineError;
use crate::geometry::{self, Geometry};
use crate::gpu::{DEPTH_FORMAT, HDR_FORMAT, RenderDevice};
use crate::input::InputSnapshot;
use crate::light::{Light, PointLight};
use crate::material::PhysicalMaterial;
use crate::mesh::{Mesh, Transform};
use crate::sky::{Sky, SkyParams};
use crate::target::{OffscreenTarget, RenderConfig};
use crate::texture::{ImageConfig, Texture};
use crate::water::Water;

/// The light the scene passes shade with. The light list is public and may
/// be emptied between frames; an empty list degrades to an unlit scene
/// instead of failing the frame.
fn first_point_light(lights: &[Light]) -> PointLight {
    lights
        .first()
        .map(|light| light.as_point().clone())
        .unwrap_or_else(|| PointLight::new(Vec3::ZERO, Vec3::ZERO, 0.0))
}

/// Per-pass uniform block bound at group 0 by every scene pipeline.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PassUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 3],
    time: f32,
    light_pos: [f32; 3],
    light_intensity: f32,
    light_color: [f32; 3],
    _pad: f32,
}

/// The group 0 layout shared by the mesh and water pipelines.
pub(crate) fn pass_bind_group_layout(device: &RenderDevice) -> wgpu::BindGroupLayout {
    device
        .device
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Pass Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
}

/// One pass's uniform buffer and bind group.
struct PassSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl PassSlot {
    fn new(device: &RenderDevice, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<PassUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    fn upload(
        &self,
        device: &RenderDevice,
        camera: &PerspectiveCamera,
        aspect: f32,
        light: &PointLight,
        time: f32,
    ) {
        let uniforms = PassUniforms {
            view_proj: camera.view_projection(aspect).to_cols_array_2d(),
            camera_pos: camera.position.to_array(),
            time,
            light_pos: light.transform.translation.to_array(),
            light_intensity: light.intensity,
            light_color: light.color.to_array(),
            _pad: 0.0,
        };
        device
            .queue
            .write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }
}

/// The physically based mesh pipeline and its shared resources.
pub struct MeshPipeline {
    pipeline: wgpu::RenderPipeline,
    mesh_layout: wgpu::BindGroupLayout,
    /// 1x1 white texture bound in material slots that hold constants.
    fallback: Arc<Texture>,
}

impl MeshPipeline {
    pub fn new(
        device: &RenderDevice,
        pass_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, EngineError> {
        let fallback = Arc::new(Texture::from_pixels(
            device,
            ImageConfig::render_target(1, 1, wgpu::TextureFormat::Rgba8Unorm),
            &[255, 255, 255, 255],
            "Material Fallback",
        )?);

        let shader = device
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Mesh Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/pbr.wgsl").into()),
            });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let mesh_layout = device
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Mesh Bind Group Layout"),
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
                    texture_entry(1),
                    texture_entry(2),
                    texture_entry(3),
                    texture_entry(4),
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
                label: Some("Mesh Pipeline Layout"),
                bind_group_layouts: &[pass_layout, &mesh_layout],
                push_constant_ranges: &[],
            });

        let pipeline = device
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Mesh Pipeline"),
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
                    cull_mode: Some(wgpu::Face::Back),
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

        Ok(Self {
            pipeline,
            mesh_layout,
            fallback,
        })
    }

    /// The per-mesh bind group layout meshes are built against.
    pub fn mesh_layout(&self) -> &wgpu::BindGroupLayout {
        &self.mesh_layout
    }

    pub fn fallback(&self) -> &Arc<Texture> {
        &self.fallback
    }
}

/// The world and everything needed to render it.
pub struct Scene {
    pub camera: PerspectiveCamera,
    pub meshes: Vec<Mesh>,
    pub lights: Vec<Light>,
    pub sky: Sky,
    pub water: Water,
    pub clear_color: wgpu::Color,
    mesh_pipeline: MeshPipeline,
    output: OffscreenTarget,
    main_slot: PassSlot,
    reflection_slot: PassSlot,
    refraction_slot: PassSlot,
}

impl Scene {
    /// Build the default world: a cube above a wide floor slab, a point
    /// light, the sky dome, and the water plane.
    ///
    /// `width`/`height` are the supersampled intermediate dimensions. The
    /// optional `environment` asset feeds the cube map bake; when absent the
    /// sky falls back to its analytic shader.
    pub fn new(
        device: &RenderDevice,
        assets: &Assets,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        let pass_layout = pass_bind_group_layout(device);
        let mesh_pipeline = MeshPipeline::new(device, &pass_layout)?;

        let cube_geometry = Arc::new(Geometry::new(device, &geometry::cube(), "Cube"));

        let cube = Mesh::new(
            device,
            mesh_pipeline.mesh_layout(),
            mesh_pipeline.fallback(),
            cube_geometry.clone(),
            PhysicalMaterial::default(),
            Transform::from_position(Vec3::new(-1.0, 0.55, 0.0)),
        );

        let floor = Mesh::new(
            device,
            mesh_pipeline.mesh_layout(),
            mesh_pipeline.fallback(),
            cube_geometry,
            PhysicalMaterial::default(),
            Transform::new()
                .position(Vec3::new(0.0, -0.6, 0.0))
                .scale(Vec3::new(100.0, 0.1, 100.0)),
        );

        let lights = vec![Light::Point(PointLight::new(
            Vec3::new(1.0, 100.0, 2.0),
            Vec3::new(0.0, 0.0, 0.2),
            1000.0,
        ))];

        let environment = match assets.get("environment") {
            Some(img) => {
                let equirect = Texture::from_image(
                    device,
                    img,
                    wgpu::AddressMode::ClampToEdge,
                    "Environment Equirect",
                )?;
                Some(environment::bake(device, &equirect)?)
            }
            None => {
                log::info!("no environment asset, using analytic sky");
                None
            }
        };
        let sky = Sky::new(device, SkyParams::default(), environment)?;

        let water = Water::new(device, &pass_layout, assets, width, height)?;

        let output = OffscreenTarget::new(
            device,
            ImageConfig::render_target(width, height, HDR_FORMAT),
            true,
            "Scene Output",
        )?;

        Ok(Self {
            camera: PerspectiveCamera::new(Vec3::new(0.0, 1.0, 5.0)),
            meshes: vec![cube, floor],
            lights,
            sky,
            water,
            clear_color: wgpu::Color {
                r: 0.01,
                g: 0.01,
                b: 0.01,
                a: 1.0,
            },
            mesh_pipeline,
            output,
            main_slot: PassSlot::new(device, &pass_layout, "Main Pass Uniforms"),
            reflection_slot: PassSlot::new(device, &pass_layout, "Reflection Pass Uniforms"),
            refraction_slot: PassSlot::new(device, &pass_layout, "Refraction Pass Uniforms"),
        })
    }

    /// Advance camera state from this frame's input.
    pub fn update(&mut self, snapshot: &InputSnapshot, dt: f32) {
        self.camera.process_movement(snapshot, dt);
    }

    /// Encode the three scene passes.
    ///
    /// Pass order matters: both water side targets must be rendered before
    /// the main pass samples them.
    pub fn render(&self, device: &RenderDevice, encoder: &mut wgpu::CommandEncoder, time: f32) {
        let aspect = self.output.aspect();
        let light = first_point_light(&self.lights);

        self.main_slot
            .upload(device, &self.camera, aspect, &light, time);
        self.refraction_slot
            .upload(device, &self.camera, aspect, &light, time);
        let mirrored = self.water.reflection_camera(&self.camera);
        self.reflection_slot
            .upload(device, &mirrored, aspect, &light, time);

        for mesh in &self.meshes {
            mesh.upload_uniforms(device);
        }
        self.sky.upload(device, &self.camera, aspect);
        self.water.upload(device, time);

        let config = RenderConfig::scene(self.clear_color);

        {
            let mut pass =
                self.water
                    .refraction
                    .begin_pass(encoder, &config, "Refraction Pass");
            self.draw_world(&mut pass, &self.refraction_slot);
        }
        {
            let mut pass = self
                .water
                .reflection
                .begin_pass(encoder, &config, "Reflection Pass");
            self.draw_world(&mut pass, &self.reflection_slot);
        }
        {
            let mut pass = self.output.begin_pass(encoder, &config, "Main Pass");
            self.draw_world(&mut pass, &self.main_slot);
            // The sky rebinds group 0; restore the pass uniforms before the
            // water surface samples the side targets.
            pass.set_bind_group(0, &self.main_slot.bind_group, &[]);
            self.water.draw(&mut pass);
        }
    }

    /// Draw the meshes and then the sky into an open pass.
    fn draw_world(&self, pass: &mut wgpu::RenderPass<'_>, slot: &PassSlot) {
        pass.set_pipeline(&self.mesh_pipeline.pipeline);
        pass.set_bind_group(0, &slot.bind_group, &[]);
        for mesh in &self.meshes {
            mesh.draw(pass);
        }
        self.sky.draw(pass);
    }

    /// The HDR target the post chain reads.
    pub fn output(&self) -> &OffscreenTarget {
        &self.output
    }

    /// Reallocate the scene output and water side targets.
    pub fn resize(
        &mut self,
        device: &RenderDevice,
        width: u32,
        height: u32,
    ) -> Result<(), EngineError> {
        self.output.resize(device, width, height)?;
        self.water.resize(device, width, height)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_light_list_degrades_to_an_unlit_frame() {
        let light = first_point_light(&[]);
        assert_eq!(light.intensity, 0.0);
        assert_eq!(light.color, Vec3::ZERO);
        assert_eq!(light.transform.translation, Vec3::ZERO);
    }

    #[test]
    fn first_light_drives_the_passes() {
        let lights = vec![
            Light::Point(PointLight::new(
                Vec3::new(1.0, 100.0, 2.0),
                Vec3::new(0.0, 0.0, 0.2),
                1000.0,
            )),
            Light::Point(PointLight::new(Vec3::ONE, Vec3::ONE, 5.0)),
        ];
        let light = first_point_light(&lights);
        assert_eq!(light.intensity, 1000.0);
        assert_eq!(light.transform.translation, Vec3::new(1.0, 100.0, 2.0));
    }
}
