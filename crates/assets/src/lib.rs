//! Asset pipeline: OBJ import, image decoding, cubemap faces and scene loading.
//!
//! Everything here runs before the frame loop starts. Uploads go through
//! `lumen_scene::GpuResources`, so the pipeline works the same against the
//! wgpu backend and the recording backend.
//!
//! # Invariants
//! - A texture file is uploaded at most once per `ModelLoader`.
//! - A model is either fully uploaded or not uploaded at all.
//! - Scene object `i` gets `ModelId(i)`, whether or not earlier objects loaded.

pub mod error;
pub mod import;
pub mod loader;
pub mod texture;

pub use error::AssetError;
pub use import::{ImportedMesh, ImportedModel, TextureRef, import_obj};
pub use loader::{ModelLoader, SceneLoad, load_missing_texture, load_scene, load_skybox_cubemap};
pub use texture::{CUBEMAP_FACES, decode, load_cubemap_faces};
