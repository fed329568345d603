//! GPU texture wrappers.
//!
//! [`ImageConfig`] describes a texture allocation and is validated before any
//! GPU call; resize paths reuse the same config with new dimensions.
//! [`Texture`] covers 2D textures (loaded assets and render target storage),
//! [`CubeTexture`] covers six-face cube maps with per-face render views for
//! the environment bake.

use crate::error::TextureError;
use crate::gpu::RenderDevice;

/// Allocation parameters for a texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageConfig {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub wrap: wgpu::AddressMode,
    pub filter: wgpu::FilterMode,
}

impl ImageConfig {
    /// Config for an HDR or color render target: clamped, linearly filtered.
    pub fn render_target(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            wrap: wgpu::AddressMode::ClampToEdge,
            filter: wgpu::FilterMode::Linear,
        }
    }

    /// Config for a tiling surface detail map (water normals).
    pub fn repeating(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            wrap: wgpu::AddressMode::Repeat,
            filter: wgpu::FilterMode::Linear,
        }
    }

    /// Same config at different dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Reject zero-sized allocations before they hit wgpu validation.
    pub fn validate(&self) -> Result<(), TextureError> {
        if self.width == 0 || self.height == 0 {
            return Err(TextureError::InvalidConfig {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// A 2D GPU texture with its view and sampler.
#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub config: ImageConfig,
    label: String,
}

impl Texture {
    /// Allocate an empty texture usable as both render attachment and shader
    /// binding. Contents are undefined until first rendered to.
    pub fn empty(
        device: &RenderDevice,
        config: ImageConfig,
        label: &str,
    ) -> Result<Self, TextureError> {
        config.validate()?;

        let texture = device.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Self::make_sampler(device, &config, label);

        Ok(Self {
            texture,
            view,
            sampler,
            config,
            label: label.to_string(),
        })
    }

    /// Create a texture from raw RGBA8 pixel data.
    pub fn from_pixels(
        device: &RenderDevice,
        config: ImageConfig,
        data: &[u8],
        label: &str,
    ) -> Result<Self, TextureError> {
        use wgpu::util::DeviceExt;

        config.validate()?;

        let texture = device.device.create_texture_with_data(
            &device.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: config.width,
                    height: config.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: config.format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Self::make_sampler(device, &config, label);

        Ok(Self {
            texture,
            view,
            sampler,
            config,
            label: label.to_string(),
        })
    }

    /// Create a texture from a decoded image, with the given wrap mode.
    pub fn from_image(
        device: &RenderDevice,
        img: &image::RgbaImage,
        wrap: wgpu::AddressMode,
        label: &str,
    ) -> Result<Self, TextureError> {
        let (width, height) = img.dimensions();
        let config = ImageConfig {
            width,
            height,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            wrap,
            filter: wgpu::FilterMode::Linear,
        };
        Self::from_pixels(device, config, img, label)
    }

    /// Drop the allocation and recreate it at new dimensions.
    ///
    /// Format and sampling parameters are preserved; contents are not.
    pub fn resize(
        &mut self,
        device: &RenderDevice,
        width: u32,
        height: u32,
    ) -> Result<(), TextureError> {
        let label = std::mem::take(&mut self.label);
        *self = Self::empty(device, self.config.with_size(width, height), &label)?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    fn make_sampler(device: &RenderDevice, config: &ImageConfig, label: &str) -> wgpu::Sampler {
        device.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: config.wrap,
            address_mode_v: config.wrap,
            address_mode_w: config.wrap,
            mag_filter: config.filter,
            min_filter: config.filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        })
    }
}

/// A cube map texture with one render view per face.
#[derive(Debug)]
pub struct CubeTexture {
    pub texture: wgpu::Texture,
    /// Cube view for sampling in shaders.
    pub view: wgpu::TextureView,
    /// One 2D view per face, in +X, -X, +Y, -Y, +Z, -Z order, for use as
    /// render attachments during capture.
    pub face_views: [wgpu::TextureView; 6],
    pub sampler: wgpu::Sampler,
    pub size: u32,
}

impl CubeTexture {
    /// Allocate an empty cube map of `size`x`size` faces.
    pub fn empty(
        device: &RenderDevice,
        size: u32,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Result<Self, TextureError> {
        if size == 0 {
            return Err(TextureError::InvalidConfig {
                width: size,
                height: size,
            });
        }

        let texture = device.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{label} Cube View")),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let face_views = std::array::from_fn(|face| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(&format!("{label} Face {face}")),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_array_layer: face as u32,
                array_layer_count: Some(1),
                ..Default::default()
            })
        });

        let sampler = device.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            face_views,
            sampler,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_configs_are_rejected() {
        let config = ImageConfig::render_target(0, 600, wgpu::TextureFormat::Rgba16Float);
        assert!(config.validate().is_err());

        let config = ImageConfig::render_target(800, 0, wgpu::TextureFormat::Rgba16Float);
        assert!(config.validate().is_err());
    }

    #[test]
    fn with_size_preserves_format_and_sampling() {
        let config = ImageConfig::repeating(64, 64, wgpu::TextureFormat::Rgba8UnormSrgb);
        let resized = config.with_size(128, 256);
        assert_eq!(resized.width, 128);
        assert_eq!(resized.height, 256);
        assert_eq!(resized.format, config.format);
        assert_eq!(resized.wrap, wgpu::AddressMode::Repeat);
        assert!(resized.validate().is_ok());
    }
}
