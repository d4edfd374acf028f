use crate::gpu::{GpuResources, MeshHandle, TextureHandle};
use bytemuck::{Pod, Zeroable};
use std::path::PathBuf;

/// Interleaved vertex as laid out in the vertex buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

/// What a texture is sampled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    pub const ALL: [TextureKind; 4] = [
        TextureKind::Diffuse,
        TextureKind::Specular,
        TextureKind::Normal,
        TextureKind::Height,
    ];

    /// Sampler name stem; the shader expects `material.<stem><n>`.
    pub fn uniform_stem(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Normal => "texture_normal",
            TextureKind::Height => "texture_height",
        }
    }
}

/// A texture attached to a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub handle: TextureHandle,
    pub kind: TextureKind,
    /// Source path, used to de-duplicate uploads.
    pub path: PathBuf,
    /// Any texel has alpha below fully opaque.
    pub transparent: bool,
}

/// One GPU-drawable group of vertices, indices and textures.
///
/// Owns exactly one uploaded buffer pair. Contents are fixed after creation.
#[derive(Debug)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    textures: Vec<Texture>,
    buffers: MeshHandle,
}

impl Mesh {
    /// Upload the vertex and index data and take ownership of the buffers.
    pub fn upload(
        gpu: &mut dyn GpuResources,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<Texture>,
    ) -> Self {
        let buffers = gpu.upload_mesh(&vertices, &indices);
        Self {
            vertices,
            indices,
            textures,
            buffers,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn buffers(&self) -> MeshHandle {
        self.buffers
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Free the GPU buffers.
    pub fn release(self, gpu: &mut dyn GpuResources) {
        gpu.release_mesh(self.buffers);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::gpu::{CubemapHandle, ImageData};

    /// Hands out sequential handles and remembers releases.
    #[derive(Default)]
    pub struct CountingGpu {
        pub meshes: u32,
        pub textures: u32,
        pub released: Vec<MeshHandle>,
    }

    impl GpuResources for CountingGpu {
        fn upload_mesh(&mut self, _vertices: &[Vertex], _indices: &[u32]) -> MeshHandle {
            self.meshes += 1;
            MeshHandle(self.meshes - 1)
        }

        fn release_mesh(&mut self, mesh: MeshHandle) {
            self.released.push(mesh);
        }

        fn upload_texture(&mut self, _image: &ImageData) -> TextureHandle {
            self.textures += 1;
            TextureHandle(self.textures - 1)
        }

        fn upload_cubemap(&mut self, _faces: &[ImageData; 6]) -> CubemapHandle {
            CubemapHandle(0)
        }
    }

    pub fn triangle(gpu: &mut CountingGpu) -> Mesh {
        let vertices = vec![
            Vertex {
                position: [0.0, 0.0, 0.0],
                ..Vertex::default()
            },
            Vertex {
                position: [1.0, 0.0, 0.0],
                ..Vertex::default()
            },
            Vertex {
                position: [0.0, 1.0, 0.0],
                ..Vertex::default()
            },
        ];
        Mesh::upload(gpu, vertices, vec![0, 1, 2], Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 8 * std::mem::size_of::<f32>());
    }

    #[test]
    fn upload_allocates_one_buffer_pair() {
        let mut gpu = CountingGpu::default();
        let mesh = triangle(&mut gpu);
        assert_eq!(gpu.meshes, 1);
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.vertices().len(), 3);
    }

    #[test]
    fn release_frees_the_buffers() {
        let mut gpu = CountingGpu::default();
        let mesh = triangle(&mut gpu);
        let handle = mesh.buffers();
        mesh.release(&mut gpu);
        assert_eq!(gpu.released, vec![handle]);
    }

    #[test]
    fn uniform_stems() {
        assert_eq!(TextureKind::Diffuse.uniform_stem(), "texture_diffuse");
        assert_eq!(TextureKind::Height.uniform_stem(), "texture_height");
    }
}
