//! Core GPU device and surface management.
//!
//! This module provides [`RenderDevice`], the struct that owns all wgpu
//! resources needed for rendering: the device, queue, surface, and surface
//! configuration. It is created once at startup and passed by reference to
//! every subsystem that touches the GPU.
//!
//! # Initialization
//!
//! A `RenderDevice` is created from a winit window and handles all the wgpu
//! boilerplate: instance creation, adapter selection, device/queue creation,
//! and surface configuration. Construction is guarded so that a second device
//! in the same process is reported as [`DeviceError::AlreadyInitialized`]
//! rather than silently creating duplicate GPU state.
//!
//! # Supersampling
//!
//! Scene and post-processing targets render at the window size multiplied by
//! `max(scale_factor, 2)`. The final screen pass samples that down to the
//! surface. Use [`RenderDevice::render_width`] / [`RenderDevice::render_height`]
//! when sizing intermediate targets and [`RenderDevice::width`] /
//! [`RenderDevice::height`] for the surface itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use winit::window::Window;

use crate::error::DeviceError;

/// Format used for every HDR intermediate target (scene output, water side
/// targets, bloom chain).
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Format used for depth attachments.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

static DEVICE_CREATED: AtomicBool = AtomicBool::new(false);

/// Owns the wgpu device, queue, surface, and surface configuration.
///
/// All fields are public so subsystems can reach the raw wgpu API directly.
pub struct RenderDevice {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    /// Supersample factor applied to intermediate render targets.
    pub supersample: f32,
}

impl RenderDevice {
    /// Create the render device for a window.
    ///
    /// Performs instance/adapter/device creation, configures the surface with
    /// an sRGB format and Fifo present mode, and verifies that the adapter can
    /// render to and filter [`HDR_FORMAT`]. Returns
    /// [`DeviceError::AlreadyInitialized`] if a device was already created in
    /// this process.
    pub fn new(window: Arc<Window>) -> Result<Self, DeviceError> {
        if DEVICE_CREATED.swap(true, Ordering::SeqCst) {
            return Err(DeviceError::AlreadyInitialized);
        }

        let size = window.inner_size();
        let scale_factor = window.scale_factor() as f32;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| DeviceError::NoAdapter(e.to_string()))?;

        log::info!("using adapter: {}", adapter.get_info().name);

        // The whole HDR pipeline leans on rendering to and linearly sampling
        // the intermediate format, so fail early if the adapter cannot do it.
        let hdr_features = adapter.get_texture_format_features(HDR_FORMAT);
        let hdr_ok = hdr_features
            .allowed_usages
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING)
            && hdr_features
                .flags
                .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE);
        if !hdr_ok {
            return Err(DeviceError::UnsupportedFormat(HDR_FORMAT));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Lagoon Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))
        .map_err(|e| DeviceError::RequestDevice(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            supersample: supersample_factor(scale_factor),
        })
    }

    /// Resize the surface to new dimensions.
    ///
    /// Ignores zero-sized dimensions to avoid wgpu validation errors during
    /// window minimize.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Width for supersampled intermediate targets.
    pub fn render_width(&self) -> u32 {
        (self.config.width as f32 * self.supersample).round() as u32
    }

    /// Height for supersampled intermediate targets.
    pub fn render_height(&self) -> u32 {
        (self.config.height as f32 * self.supersample).round() as u32
    }

    /// Aspect ratio of the surface (width / height).
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }
}

/// Supersample factor for a given window scale factor.
pub(crate) fn supersample_factor(scale_factor: f32) -> f32 {
    scale_factor.max(2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supersample_is_at_least_two() {
        assert_eq!(supersample_factor(1.0), 2.0);
        assert_eq!(supersample_factor(1.5), 2.0);
        assert_eq!(supersample_factor(2.0), 2.0);
    }

    #[test]
    fn supersample_follows_high_dpi_scale() {
        assert_eq!(supersample_factor(3.0), 3.0);
    }
}
