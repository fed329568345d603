//! Off-screen render targets and render pass setup.
//!
//! [`OffscreenTarget`] pairs a color texture with an optional depth texture
//! and verifies at attach time that the two agree on dimensions; a mismatch
//! is the one way a target can be incomplete and it is reported as
//! [`TargetError::Incomplete`] instead of producing undefined sampling later.
//!
//! Passes that can draw either off-screen or to the window express the
//! destination as `Option<&OffscreenTarget>`: `None` means the visible
//! surface.

use crate::error::TargetError;
use crate::gpu::{DEPTH_FORMAT, RenderDevice};
use crate::texture::{ImageConfig, Texture};

/// Clear/depth behavior for a render pass.
#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    pub depth_test: bool,
    /// `Some` clears the color attachment to this value, `None` keeps the
    /// existing contents.
    pub clear_color: Option<wgpu::Color>,
    pub clear_depth: bool,
}

impl RenderConfig {
    /// Clear color and depth, depth testing on. The standard scene pass
    /// configuration.
    pub fn scene(clear_color: wgpu::Color) -> Self {
        Self {
            depth_test: true,
            clear_color: Some(clear_color),
            clear_depth: true,
        }
    }

    /// No depth, clear to transparent black. The standard full-screen pass
    /// configuration.
    pub fn fullscreen() -> Self {
        Self {
            depth_test: false,
            clear_color: Some(wgpu::Color::TRANSPARENT),
            clear_depth: false,
        }
    }

    /// Keep existing color contents (additive accumulation passes).
    pub fn accumulate() -> Self {
        Self {
            depth_test: false,
            clear_color: None,
            clear_depth: false,
        }
    }

    fn color_ops(&self) -> wgpu::Operations<wgpu::Color> {
        wgpu::Operations {
            load: match self.clear_color {
                Some(color) => wgpu::LoadOp::Clear(color),
                None => wgpu::LoadOp::Load,
            },
            store: wgpu::StoreOp::Store,
        }
    }
}

/// Dimension agreement between color and depth attachments.
pub(crate) fn check_complete(
    color: (u32, u32),
    depth: Option<(u32, u32)>,
) -> Result<(), TargetError> {
    if let Some((dw, dh)) = depth {
        if (dw, dh) != color {
            return Err(TargetError::Incomplete {
                color_width: color.0,
                color_height: color.1,
                depth_width: dw,
                depth_height: dh,
            });
        }
    }
    Ok(())
}

/// A color texture plus optional depth texture that scene and post passes
/// render into and later sample from.
pub struct OffscreenTarget {
    pub color: Texture,
    pub depth: Option<Texture>,
}

impl OffscreenTarget {
    /// Allocate a fresh target from a color config, with a matching depth
    /// texture when `with_depth` is set.
    pub fn new(
        device: &RenderDevice,
        config: ImageConfig,
        with_depth: bool,
        label: &str,
    ) -> Result<Self, crate::error::EngineError> {
        let color = Texture::empty(device, config, label)?;
        let depth = if with_depth {
            Some(Texture::empty(
                device,
                ImageConfig::render_target(config.width, config.height, DEPTH_FORMAT),
                &format!("{label} Depth"),
            )?)
        } else {
            None
        };
        Ok(Self::attach(color, depth)?)
    }

    /// Assemble a target from existing attachments, verifying completeness.
    pub fn attach(color: Texture, depth: Option<Texture>) -> Result<Self, TargetError> {
        check_complete(
            (color.width(), color.height()),
            depth.as_ref().map(|d| (d.width(), d.height())),
        )?;
        Ok(Self { color, depth })
    }

    /// Drop and reallocate both attachments at new dimensions.
    pub fn resize(
        &mut self,
        device: &RenderDevice,
        width: u32,
        height: u32,
    ) -> Result<(), crate::error::EngineError> {
        self.color.resize(device, width, height)?;
        if let Some(depth) = &mut self.depth {
            depth.resize(device, width, height)?;
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }

    pub fn aspect(&self) -> f32 {
        self.color.width() as f32 / self.color.height() as f32
    }

    /// Begin a render pass into this target.
    pub fn begin_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        config: &RenderConfig,
        label: &str,
    ) -> wgpu::RenderPass<'e> {
        begin_pass(
            encoder,
            &self.color.view,
            if config.depth_test {
                self.depth.as_ref().map(|d| &d.view)
            } else {
                None
            },
            config,
            label,
        )
    }
}

/// Begin a render pass against arbitrary attachment views.
///
/// Used directly for surface passes (where there is no [`OffscreenTarget`])
/// and for per-face cube map capture.
pub fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    color_view: &wgpu::TextureView,
    depth_view: Option<&wgpu::TextureView>,
    config: &RenderConfig,
    label: &str,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: config.color_ops(),
            depth_slice: None,
        })],
        depth_stencil_attachment: depth_view.map(|view| wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: if config.clear_depth {
                    wgpu::LoadOp::Clear(1.0)
                } else {
                    wgpu::LoadOp::Load
                },
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_attachments_are_complete() {
        assert!(check_complete((800, 600), Some((800, 600))).is_ok());
    }

    #[test]
    fn missing_depth_is_complete() {
        assert!(check_complete((800, 600), None).is_ok());
    }

    #[test]
    fn mismatched_depth_is_incomplete() {
        let err = check_complete((800, 600), Some((400, 300))).unwrap_err();
        match err {
            TargetError::Incomplete {
                color_width,
                depth_width,
                ..
            } => {
                assert_eq!(color_width, 800);
                assert_eq!(depth_width, 400);
            }
        }
    }
}
