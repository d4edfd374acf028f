//! wgpu implementation of `lumen_render::RenderBackend` and
//! `lumen_scene::GpuResources`.
//!
//! # Invariants
//! - All GPU objects are owned here; the scene only holds handles.
//! - Draws recorded during a frame are replayed in call order.
//! - Wireframe is ignored unless the device supports line polygon mode.

mod gpu;
mod shaders;
mod state;

pub use gpu::WgpuBackend;
