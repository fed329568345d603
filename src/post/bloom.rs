//! Physically based bloom.
//!
//! The scene output is walked down a mip chain with a 13-tap downsample
//! filter, then walked back up with a 9-tap tent filter blended additively
//! into each larger mip, and finally blitted into a full-resolution output
//! the screen pass mixes over the scene. The chain starts at half resolution;
//! each mip is an independent texture so every level can be both sampled and
//! rendered to within one frame.

use wgpu::util::DeviceExt;

use crate::buffer::Vertex;
use crate::command::{Blend, Shape};
use crate::error::EngineError;
use crate::geometry::{self, Geometry};
use crate::gpu::{HDR_FORMAT, RenderDevice};
use crate::post::{PassInput, RenderPass};
use crate::target::{OffscreenTarget, RenderConfig, begin_pass};
use crate::texture::{ImageConfig, Texture};
use crate::tweaks::{Shared, Tweaks};

const MIP_COUNT: usize = 6;

/// Mip dimensions for a chain under a full-resolution source, starting at
/// half resolution and clamping at 1x1.
pub(crate) fn mip_chain_sizes(width: u32, height: u32, count: usize) -> Vec<(u32, u32)> {
    let (mut w, mut h) = (width, height);
    (0..count)
        .map(|_| {
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            (w, h)
        })
        .collect()
}

fn make_mips(device: &RenderDevice, width: u32, height: u32) -> Result<Vec<Texture>, EngineError> {
    mip_chain_sizes(width, height, MIP_COUNT)
        .into_iter()
        .map(|(w, h)| {
            Ok(Texture::empty(
                device,
                ImageConfig::render_target(w, h, HDR_FORMAT),
                "Bloom Mip",
            )?)
        })
        .collect()
}

/// The bloom pass.
pub struct BloomPass {
    mips: Vec<Texture>,
    output: OffscreenTarget,
    quad: Geometry,
    sample_layout: wgpu::BindGroupLayout,
    up_layout: wgpu::BindGroupLayout,
    down_pipeline: wgpu::RenderPipeline,
    up_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    radius_buffer: wgpu::Buffer,
    filter_radius: Shared<f32>,
}

impl BloomPass {
    pub fn new(
        device: &RenderDevice,
        tweaks: &mut Tweaks,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        let filter_radius = tweaks.register("filter_radius", 0.0, 0.01, 0.002);

        let mips = make_mips(device, width, height)?;
        let output = OffscreenTarget::new(
            device,
            ImageConfig::render_target(width, height, HDR_FORMAT),
            false,
            "Bloom Output",
        )?;

        let quad = Geometry::new(device, &geometry::screen_quad(), "Bloom Quad");

        let sample_layout = sample_bind_group_layout(device, "Bloom Sample Layout", false);
        let up_layout = sample_bind_group_layout(device, "Bloom Upsample Layout", true);

        let radius_buffer = device
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bloom Radius"),
                contents: bytemuck::cast_slice(&[0.002f32, 0.0, 0.0, 0.0]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let down_pipeline = fullscreen_pipeline(
            device,
            &sample_layout,
            include_str!("../shaders/downsample.wgsl"),
            Blend::Replace,
            HDR_FORMAT,
            "Bloom Downsample Pipeline",
        );
        let up_pipeline = fullscreen_pipeline(
            device,
            &up_layout,
            include_str!("../shaders/upsample.wgsl"),
            Blend::Additive,
            HDR_FORMAT,
            "Bloom Upsample Pipeline",
        );
        let blit_pipeline = fullscreen_pipeline(
            device,
            &sample_layout,
            include_str!("../shaders/blit.wgsl"),
            Blend::Replace,
            HDR_FORMAT,
            "Bloom Blit Pipeline",
        );

        Ok(Self {
            mips,
            output,
            quad,
            sample_layout,
            up_layout,
            down_pipeline,
            up_pipeline,
            blit_pipeline,
            radius_buffer,
            filter_radius,
        })
    }

    fn sample_group(&self, device: &RenderDevice, src: &Texture) -> wgpu::BindGroup {
        device.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Sample Bind Group"),
            layout: &self.sample_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&src.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&src.sampler),
                },
            ],
        })
    }

    fn upsample_group(&self, device: &RenderDevice, src: &Texture) -> wgpu::BindGroup {
        device.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bloom Upsample Bind Group"),
            layout: &self.up_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&src.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&src.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.radius_buffer.as_entire_binding(),
                },
            ],
        })
    }
}

impl RenderPass for BloomPass {
    fn render(
        &self,
        device: &RenderDevice,
        encoder: &mut wgpu::CommandEncoder,
        input: PassInput<'_>,
        _screen: Option<&wgpu::TextureView>,
    ) {
        let radius = self.filter_radius.get();
        device.queue.write_buffer(
            &self.radius_buffer,
            0,
            bytemuck::cast_slice(&[radius, 0.0, 0.0, 0.0]),
        );

        // Walk down the chain, each mip filtering the one above it.
        for (i, mip) in self.mips.iter().enumerate() {
            let src = if i == 0 {
                &input.previous.color
            } else {
                &self.mips[i - 1]
            };
            let bind_group = self.sample_group(device, src);
            let mut pass = begin_pass(
                encoder,
                &mip.view,
                None,
                &RenderConfig::fullscreen(),
                "Bloom Downsample Pass",
            );
            pass.set_pipeline(&self.down_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            self.quad.draw(&mut pass);
        }

        // Walk back up, tent-filtering each mip additively into the larger
        // one above it.
        for i in (0..self.mips.len() - 1).rev() {
            let bind_group = self.upsample_group(device, &self.mips[i + 1]);
            let mut pass = begin_pass(
                encoder,
                &self.mips[i].view,
                None,
                &RenderConfig::accumulate(),
                "Bloom Upsample Pass",
            );
            pass.set_pipeline(&self.up_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            self.quad.draw(&mut pass);
        }

        let bind_group = self.sample_group(device, &self.mips[0]);
        let mut pass = begin_pass(
            encoder,
            &self.output.color.view,
            None,
            &RenderConfig::fullscreen(),
            "Bloom Blit Pass",
        );
        pass.set_pipeline(&self.blit_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        self.quad.draw(&mut pass);
    }

    fn output(&self) -> Option<&OffscreenTarget> {
        Some(&self.output)
    }

    fn resize(
        &mut self,
        device: &RenderDevice,
        width: u32,
        height: u32,
    ) -> Result<(), EngineError> {
        self.mips = make_mips(device, width, height)?;
        self.output.resize(device, width, height)?;
        Ok(())
    }
}

fn sample_bind_group_layout(
    device: &RenderDevice,
    label: &str,
    with_uniform: bool,
) -> wgpu::BindGroupLayout {
    let mut entries = vec![
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ];
    if with_uniform {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
    }
    device
        .device
        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &entries,
        })
}

/// A full-screen quad pipeline over a single bind group.
pub(crate) fn fullscreen_pipeline(
    device: &RenderDevice,
    layout: &wgpu::BindGroupLayout,
    shader_src: &str,
    blend: Blend,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    let shader = device
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

    let pipeline_layout = device
        .device
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });

    device
        .device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
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
                    format,
                    blend: Some(blend.state()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: Shape::TriangleStrip.topology(),
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_starts_at_half_resolution() {
        let sizes = mip_chain_sizes(1600, 1200, 6);
        assert_eq!(sizes[0], (800, 600));
        assert_eq!(sizes.len(), 6);
    }

    #[test]
    fn each_level_halves_the_previous() {
        let sizes = mip_chain_sizes(1024, 512, 5);
        for pair in sizes.windows(2) {
            assert_eq!(pair[1].0, pair[0].0 / 2);
            assert_eq!(pair[1].1, pair[0].1 / 2);
        }
    }

    #[test]
    fn tiny_sources_clamp_at_one_pixel() {
        let sizes = mip_chain_sizes(4, 4, 6);
        assert_eq!(*sizes.last().unwrap(), (1, 1));
        assert!(sizes.iter().all(|&(w, h)| w >= 1 && h >= 1));
    }

    #[test]
    fn odd_dimensions_floor_cleanly() {
        let sizes = mip_chain_sizes(1601, 1201, 2);
        assert_eq!(sizes[0], (800, 600));
        assert_eq!(sizes[1], (400, 300));
    }
}
