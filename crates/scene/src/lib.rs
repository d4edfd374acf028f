//! Scene model: vertices, textures, meshes, models and the model collection.
//!
//! # Invariants
//! - A model's id never changes, and no two models share one.
//! - A model's mesh list is fixed after load; only its transform is mutable.
//! - All scene mutations from outside the render thread arrive as `SceneCommand`s.

pub mod command;
pub mod description;
pub mod gpu;
pub mod mesh;
pub mod model;
pub mod scene;

pub use command::{CommandOutput, ObjectInfo, SceneCommand};
pub use description::{DescriptionError, ObjectDescription, SceneDescription};
pub use gpu::{CubemapHandle, GpuResources, ImageData, MeshHandle, TextureHandle};
pub use mesh::{Mesh, Texture, TextureKind, Vertex};
pub use model::Model;
pub use scene::{Scene, SceneError};
