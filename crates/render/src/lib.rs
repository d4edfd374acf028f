//! Backend-agnostic frame pipeline.
//!
//! The renderer talks to a `RenderBackend`, a small state-machine interface
//! of uniforms, bindings and indexed draws. The wgpu implementation lives in
//! `lumen-render-wgpu`; `RecordingBackend` captures calls for tests and for
//! the CLI `trace` command.
//!
//! # Invariants
//! - Models are drawn farthest-first from the camera every frame.
//! - Each mesh pass binds only textures whose transparency matches the pass.
//! - Blending is disabled again after every transparent draw.
//! - The skybox is drawn last and leaves the depth test at `Less`.

pub mod backend;
pub mod camera;
pub mod draw;
pub mod lighting;
pub mod recording;
pub mod renderer;
pub mod schedule;
pub mod skybox;

pub use backend::{Blend, DepthCompare, Program, RenderBackend};
pub use camera::Camera;
pub use draw::{Drawable, Pass, draw_mesh_pass};
pub use lighting::LightingParameters;
pub use recording::{Command, DrawRecord, RecordingBackend};
pub use renderer::{FrameStats, FrameToggles, SceneRenderer};
pub use schedule::{FIXED_TICK_HZ, FixedTicker, FpsCounter};
pub use skybox::{SKYBOX_UNIT, Skybox};
