//! Frame orchestration.
//!
//! [`Renderer`] wires the scene to the post chain and encodes one frame per
//! call: scene passes into the HDR output, bloom over that, and the screen
//! pass onto the acquired surface texture. Surface errors are returned to the
//! app, which decides whether to reconfigure or quit.

use crate::assets::Assets;
use crate::error::EngineError;
use crate::gpu::RenderDevice;
use crate::input::InputSnapshot;
use crate::post::{BloomPass, PostProcessor, ScreenPass};
use crate::scene::Scene;
use crate::tweaks::Tweaks;

/// Owns the scene and post chain, drives a frame end to end.
pub struct Renderer {
    pub scene: Scene,
    pub tweaks: Tweaks,
    post: PostProcessor,
}

impl Renderer {
    pub fn new(device: &RenderDevice, assets: &Assets) -> Result<Self, EngineError> {
        let mut tweaks = Tweaks::new();
        let (width, height) = (device.render_width(), device.render_height());

        let scene = Scene::new(device, assets, width, height)?;

        let mut post = PostProcessor::new();
        post.push(Box::new(BloomPass::new(device, &mut tweaks, width, height)?));
        post.push(Box::new(ScreenPass::new(device, &mut tweaks)));

        log::info!("renderer ready at {width}x{height} internal resolution");

        Ok(Self {
            scene,
            tweaks,
            post,
        })
    }

    /// Update, encode, and present one frame.
    pub fn render_frame(
        &mut self,
        device: &RenderDevice,
        snapshot: &InputSnapshot,
        dt: f32,
        time: f32,
    ) -> Result<(), wgpu::SurfaceError> {
        self.scene.update(snapshot, dt);

        let frame = device.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = device
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.scene.render(device, &mut encoder, time);
        self.post.run(device, &mut encoder, self.scene.output(), &view);

        device.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Reallocate every intermediate target at the device's current internal
    /// resolution.
    pub fn resize(&mut self, device: &RenderDevice) -> Result<(), EngineError> {
        let (width, height) = (device.render_width(), device.render_height());
        self.scene.resize(device, width, height)?;
        self.post.resize(device, width, height)
    }
}
