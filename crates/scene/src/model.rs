use crate::gpu::GpuResources;
use crate::mesh::Mesh;
use glam::{Mat4, Vec3};
use lumen_common::{ModelId, Rotation, Transform};

/// A named, transformable collection of meshes placed in the scene.
///
/// The id and the mesh list are fixed at construction; only the transform
/// changes afterwards.
#[derive(Debug)]
pub struct Model {
    id: ModelId,
    name: String,
    meshes: Vec<Mesh>,
    transform: Transform,
}

impl Model {
    pub fn new(id: ModelId, name: impl Into<String>, meshes: Vec<Mesh>, transform: Transform) -> Self {
        Self {
            id,
            name: name.into(),
            meshes,
            transform,
        }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// World matrix for the model uniform.
    pub fn world_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.transform.rotation = rotation;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Free the GPU buffers of every mesh.
    pub fn release(self, gpu: &mut dyn GpuResources) {
        for mesh in self.meshes {
            mesh.release(gpu);
        }
    }
}
