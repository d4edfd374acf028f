use crate::mesh::Vertex;
use serde::{Deserialize, Serialize};

/// Handle to an uploaded vertex/index buffer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

/// Handle to an uploaded 2D texture.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TextureHandle(pub u32);

/// Handle to an uploaded six-face cubemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CubemapHandle(pub u32);

/// Decoded RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Tightly packed rows, 4 bytes per pixel.
    pub rgba: Vec<u8>,
}

impl ImageData {
    /// A single opaque white pixel.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        }
    }

    /// True when any pixel's alpha is below fully opaque.
    pub fn has_transparency(&self) -> bool {
        self.rgba.chunks_exact(4).any(|px| px[3] < u8::MAX)
    }
}

/// GPU resource creation.
///
/// Implemented by the real backend and by the recording backend used in
/// tests. Uploads happen before the frame loop starts.
pub trait GpuResources {
    fn upload_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshHandle;
    fn release_mesh(&mut self, mesh: MeshHandle);
    fn upload_texture(&mut self, image: &ImageData) -> TextureHandle;
    /// Faces in +X, -X, +Y, -Y, +Z, -Z order, all the same size.
    fn upload_cubemap(&mut self, faces: &[ImageData; 6]) -> CubemapHandle;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_image_has_no_transparency() {
        assert!(!ImageData::white().has_transparency());
    }

    #[test]
    fn single_translucent_pixel_marks_image_transparent() {
        let image = ImageData {
            width: 2,
            height: 1,
            rgba: vec![10, 20, 30, 255, 10, 20, 30, 254],
        };
        assert!(image.has_transparency());
    }
}
