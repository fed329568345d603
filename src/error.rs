//! Error types for every engine subsystem.
//!
//! Each resource family has its own error enum so failures carry the context
//! of the layer that detected them. [`EngineError`] is the umbrella type that
//! setup code propagates with `?`.

use thiserror::Error;

/// Errors raised while creating or configuring the render device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A second [`RenderDevice`](crate::RenderDevice) was constructed in the
    /// same process.
    #[error("render device is already initialized")]
    AlreadyInitialized,

    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(String),

    #[error("failed to create logical device: {0}")]
    RequestDevice(String),

    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// The adapter cannot render to and filter the HDR intermediate format.
    #[error("texture format {0:?} is not renderable and filterable on this adapter")]
    UnsupportedFormat(wgpu::TextureFormat),
}

/// Errors raised by texture allocation and upload.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("invalid image config: {width}x{height} (dimensions must be non-zero)")]
    InvalidConfig { width: u32, height: u32 },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Errors raised when assembling an off-screen render target.
#[derive(Debug, Error)]
pub enum TargetError {
    /// The depth attachment does not match the color attachment dimensions.
    #[error(
        "incomplete render target: color is {color_width}x{color_height}, \
         depth is {depth_width}x{depth_height}"
    )]
    Incomplete {
        color_width: u32,
        color_height: u32,
        depth_width: u32,
        depth_height: u32,
    },
}

/// Errors raised by the asset registry.
#[derive(Debug, Error)]
pub enum AssetError {
    /// A load-bearing asset was requested but never registered.
    #[error("required asset `{0}` is missing")]
    Missing(String),

    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Umbrella error for engine setup and resize paths.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}
