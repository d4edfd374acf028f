use crate::backend::{DepthCompare, Program, RenderBackend};
use glam::{Mat3, Mat4};
use lumen_scene::{CubemapHandle, GpuResources, MeshHandle, Vertex};

/// Texture unit the cubemap is sampled from.
pub const SKYBOX_UNIT: u32 = 11;

/// Unit cube, 12 triangles, wound to be seen from inside.
const CUBE: [[f32; 3]; 36] = [
    [-1.0, 1.0, -1.0], [-1.0, -1.0, -1.0], [1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [-1.0, -1.0, 1.0],
    [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0],
    [-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [1.0, -1.0, 1.0],
];

/// Background cube drawn after everything else.
#[derive(Debug)]
pub struct Skybox {
    mesh: MeshHandle,
    cubemap: CubemapHandle,
}

impl Skybox {
    /// Upload the cube geometry for an already uploaded cubemap.
    pub fn new(gpu: &mut dyn GpuResources, cubemap: CubemapHandle) -> Self {
        let vertices: Vec<Vertex> = CUBE
            .iter()
            .map(|&position| Vertex {
                position,
                ..Vertex::default()
            })
            .collect();
        let indices: Vec<u32> = (0..CUBE.len() as u32).collect();
        let mesh = gpu.upload_mesh(&vertices, &indices);
        Self { mesh, cubemap }
    }

    pub fn cubemap(&self) -> CubemapHandle {
        self.cubemap
    }

    /// Draw with the camera translation stripped, so the box never moves
    /// relative to the viewer.
    pub fn draw(&self, backend: &mut dyn RenderBackend, view: Mat4, projection: Mat4) {
        backend.set_depth_compare(DepthCompare::LessEqual);
        backend.use_program(Program::Skybox);
        backend.set_mat4("view", Mat4::from_mat3(Mat3::from_mat4(view)));
        backend.set_mat4("projection", projection);
        backend.bind_cubemap(SKYBOX_UNIT, self.cubemap);
        backend.set_int("skybox", SKYBOX_UNIT as i32);
        backend.draw_indexed(self.mesh, CUBE.len() as u32);
        backend.set_depth_compare(DepthCompare::Less);
    }

    pub fn release(self, gpu: &mut dyn GpuResources) {
        gpu.release_mesh(self.mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingBackend;
    use glam::Vec3;

    #[test]
    fn draws_with_rotation_only_view_and_restores_depth() {
        let mut backend = RecordingBackend::new();
        let cubemap = backend.upload_cubemap(&std::array::from_fn(|_| lumen_scene::ImageData::white()));
        let skybox = Skybox::new(&mut backend, cubemap);

        let view = Mat4::look_at_rh(Vec3::new(5.0, 1.0, 2.0), Vec3::ZERO, Vec3::Y);
        skybox.draw(&mut backend, view, Mat4::IDENTITY);

        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].program, Some(Program::Skybox));
        assert_eq!(draws[0].depth, DepthCompare::LessEqual);
        assert_eq!(draws[0].index_count, 36);
        assert_eq!(draws[0].cubemaps, vec![(SKYBOX_UNIT, cubemap)]);

        let stripped = backend.mat4_uniform("view").unwrap();
        assert_eq!(stripped.w_axis, glam::Vec4::W);
        assert_eq!(backend.current_depth(), DepthCompare::Less);
    }
}
