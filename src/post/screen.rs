//! Final composite to the window.
//!
//! Mixes the bloom chain over the scene output, applies exposure tonemapping,
//! and writes to the surface. The surface format is sRGB, so the shader works
//! in linear light and leaves gamma to the hardware.

use wgpu::util::DeviceExt;

use crate::command::Blend;
use crate::error::EngineError;
use crate::geometry::{self, Geometry};
use crate::gpu::RenderDevice;
use crate::post::bloom::fullscreen_pipeline;
use crate::post::{PassInput, RenderPass};
use crate::target::{OffscreenTarget, RenderConfig, begin_pass};
use crate::tweaks::{Shared, Tweaks};

/// Tonemap-and-composite pass. Must be registered last.
pub struct ScreenPass {
    quad: Geometry,
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    exposure: Shared<f32>,
    bloom_strength: Shared<f32>,
}

impl ScreenPass {
    pub fn new(device: &RenderDevice, tweaks: &mut Tweaks) -> Self {
        let exposure = tweaks.register("exposure", 0.0, 8.0, 1.0);
        let bloom_strength = tweaks.register("bloom_strength", 0.0, 1.0, 0.04);

        let quad = Geometry::new(device, &geometry::screen_quad(), "Screen Quad");

        let uniform_buffer = device
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Screen Uniforms"),
                contents: bytemuck::cast_slice(&[1.0f32, 0.04, 0.0, 0.0]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
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

        let layout = device
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Screen Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    texture_entry(1),
                    texture_entry(2),
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline = fullscreen_pipeline(
            device,
            &layout,
            include_str!("../shaders/screen.wgsl"),
            Blend::Replace,
            device.config.format,
            "Screen Pipeline",
        );

        Self {
            quad,
            layout,
            pipeline,
            uniform_buffer,
            exposure,
            bloom_strength,
        }
    }
}

impl RenderPass for ScreenPass {
    fn render(
        &self,
        device: &RenderDevice,
        encoder: &mut wgpu::CommandEncoder,
        input: PassInput<'_>,
        screen: Option<&wgpu::TextureView>,
    ) {
        let Some(screen) = screen else {
            log::warn!("screen pass is not last in the chain, skipping");
            return;
        };

        device.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.exposure.get(), self.bloom_strength.get(), 0.0, 0.0]),
        );

        let bind_group = device.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Screen Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&input.scene.color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&input.previous.color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&input.scene.color.sampler),
                },
            ],
        });

        let mut pass = begin_pass(
            encoder,
            screen,
            None,
            &RenderConfig::fullscreen(),
            "Screen Pass",
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        self.quad.draw(&mut pass);
    }

    fn output(&self) -> Option<&OffscreenTarget> {
        None
    }

    fn resize(
        &mut self,
        _device: &RenderDevice,
        _width: u32,
        _height: u32,
    ) -> Result<(), EngineError> {
        Ok(())
    }
}
