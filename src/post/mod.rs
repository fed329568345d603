//! Post-processing chain.
//!
//! Passes implement [`RenderPass`] and are run in registration order by
//! [`PostProcessor`]. Each pass sees the scene's HDR output and the output of
//! the last pass before it that produced one; the final pass in the chain is
//! handed the surface view and draws to the window.

mod bloom;
mod screen;

pub use bloom::BloomPass;
pub use screen::ScreenPass;

use crate::error::EngineError;
use crate::gpu::RenderDevice;
use crate::target::OffscreenTarget;

/// What a pass reads from.
pub struct PassInput<'a> {
    /// The scene's HDR output, unchanged through the whole chain.
    pub scene: &'a OffscreenTarget,
    /// Output of the nearest earlier pass that produced one, or the scene
    /// output for the first pass.
    pub previous: &'a OffscreenTarget,
}

/// One stage of the post chain.
pub trait RenderPass {
    /// Encode this pass. `screen` is `Some` only for the final pass in the
    /// chain, which draws to the window instead of an off-screen target.
    fn render(
        &self,
        device: &RenderDevice,
        encoder: &mut wgpu::CommandEncoder,
        input: PassInput<'_>,
        screen: Option<&wgpu::TextureView>,
    );

    /// The target this pass rendered into, if it has one.
    fn output(&self) -> Option<&OffscreenTarget>;

    /// Reallocate intermediate targets for new scene dimensions.
    fn resize(&mut self, device: &RenderDevice, width: u32, height: u32)
    -> Result<(), EngineError>;
}

/// Runs registered passes in order, threading outputs between them.
#[derive(Default)]
pub struct PostProcessor {
    passes: Vec<Box<dyn RenderPass>>,
}

impl PostProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pass: Box<dyn RenderPass>) {
        self.passes.push(pass);
    }

    /// Encode every pass. The last pass receives the surface view.
    pub fn run(
        &self,
        device: &RenderDevice,
        encoder: &mut wgpu::CommandEncoder,
        scene: &OffscreenTarget,
        screen: &wgpu::TextureView,
    ) {
        let mut previous = scene;
        let last = self.passes.len().saturating_sub(1);
        for (i, pass) in self.passes.iter().enumerate() {
            let screen_arg = (i == last).then_some(screen);
            pass.render(device, encoder, PassInput { scene, previous }, screen_arg);
            if let Some(output) = pass.output() {
                previous = output;
            }
        }
    }

    pub fn resize(
        &mut self,
        device: &RenderDevice,
        width: u32,
        height: u32,
    ) -> Result<(), EngineError> {
        for pass in &mut self.passes {
            pass.resize(device, width, height)?;
        }
        Ok(())
    }
}
