//! Window lifecycle and the event loop.
//!
//! The winit application model creates the window lazily, so [`App`] starts
//! empty and builds its GPU state on the first `resumed` call. After that the
//! event loop is a plain redraw-driven frame pump with continuous polling.

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::assets::Assets;
use crate::gpu::RenderDevice;
use crate::input::InputCollector;
use crate::renderer::Renderer;

struct Running {
    window: Arc<Window>,
    device: RenderDevice,
    renderer: Renderer,
    input: InputCollector,
    start: Instant,
    last_frame: Instant,
}

/// The application shell. Holds assets until the window exists, then the
/// live engine state.
pub struct App {
    assets: Assets,
    running: Option<Running>,
}

impl App {
    pub fn new(assets: Assets) -> Self {
        Self {
            assets,
            running: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        let attributes = Window::default_attributes().with_title("Lagoon");
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        let device = match RenderDevice::new(window.clone()) {
            Ok(device) => device,
            Err(err) => {
                log::error!("failed to create render device: {err}");
                event_loop.exit();
                return;
            }
        };

        let renderer = match Renderer::new(&device, &self.assets) {
            Ok(renderer) => renderer,
            Err(err) => {
                log::error!("failed to build renderer: {err}");
                event_loop.exit();
                return;
            }
        };

        let now = Instant::now();
        self.running = Some(Running {
            window,
            device,
            renderer,
            input: InputCollector::new(),
            start: now,
            last_frame: now,
        });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        running.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                running.device.resize(size.width, size.height);
                if let Err(err) = running.renderer.resize(&running.device) {
                    log::error!("resize failed: {err}");
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - running.last_frame).as_secs_f32();
                let time = (now - running.start).as_secs_f32();
                running.last_frame = now;

                let snapshot = running.input.snapshot();
                match running
                    .renderer
                    .render_frame(&running.device, &snapshot, dt, time)
                {
                    Ok(()) => {}
                    // The surface comes back after reconfiguration.
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let (w, h) = (running.device.width(), running.device.height());
                        running.device.resize(w, h);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("surface out of memory");
                        event_loop.exit();
                    }
                    Err(err) => log::warn!("frame skipped: {err}"),
                }

                running.window.request_redraw();
            }
            _ => {}
        }
    }
}

/// Run the engine until the window closes.
pub fn run(assets: Assets) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(assets);
    event_loop.run_app(&mut app)
}
