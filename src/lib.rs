//! Lagoon is a small real-time renderer built on wgpu.
//!
//! The scene renders into supersampled HDR targets, with a water plane that
//! reflects and refracts the world through two extra scene passes, a sky dome
//! with an analytic atmosphere or a baked environment cube map, and a bloom
//! plus exposure-tonemap post chain that composites to the window.
//!
//! Entry point is [`app::run`], which takes an [`assets::Assets`] registry
//! and drives the winit event loop until the window closes.

pub mod app;
pub mod assets;
pub mod buffer;
pub mod camera;
pub mod command;
pub mod environment;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod input;
pub mod light;
pub mod material;
pub mod mesh;
pub mod post;
pub mod renderer;
pub mod scene;
pub mod sky;
pub mod target;
pub mod texture;
pub mod tweaks;
pub mod water;

pub use assets::Assets;
pub use camera::PerspectiveCamera;
pub use error::EngineError;
pub use gpu::RenderDevice;
pub use light::{Light, PointLight};
pub use material::{MaterialProperty, PhysicalMaterial};
pub use mesh::{Mesh, Transform};
pub use renderer::Renderer;
pub use scene::Scene;
pub use water::Water;

pub use glam;
pub use wgpu;
pub use winit;
