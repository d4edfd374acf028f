//! A backend that records instead of rendering.
//!
//! Used by tests and by `lumen-cli trace` to inspect exactly which state
//! changes and draw calls a frame produces.

use crate::backend::{Blend, DepthCompare, Program, RenderBackend};
use glam::{Mat4, Vec3};
use lumen_scene::{CubemapHandle, GpuResources, ImageData, MeshHandle, TextureHandle, Vertex};
use std::collections::BTreeMap;
use std::fmt::Write;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    UseProgram(Program),
    SetBool(String, bool),
    SetInt(String, i32),
    SetFloat(String, f32),
    SetVec3(String, Vec3),
    SetMat4(String, Mat4),
    BindTexture(u32, TextureHandle),
    BindCubemap(u32, CubemapHandle),
    SetBlend(Blend),
    SetDepthCompare(DepthCompare),
    SetWireframe(bool),
    DrawIndexed(MeshHandle, u32),
}

/// State in effect at one draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub mesh: MeshHandle,
    pub index_count: u32,
    pub program: Option<Program>,
    pub blend: Blend,
    pub depth: DepthCompare,
    pub wireframe: bool,
    /// Texture bindings issued since the previous draw, in call order.
    pub textures: Vec<(u32, TextureHandle)>,
    /// Cubemap bindings issued since the previous draw, in call order.
    pub cubemaps: Vec<(u32, CubemapHandle)>,
    /// Integer uniforms in effect.
    pub ints: BTreeMap<String, i32>,
    /// Boolean uniforms in effect.
    pub bools: BTreeMap<String, bool>,
    /// `model` uniform in effect.
    pub model: Option<Mat4>,
}

/// Uploaded mesh sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRecord {
    pub vertices: usize,
    pub indices: usize,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<Command>,
    draws: Vec<DrawRecord>,

    program: Option<Program>,
    blend: Blend,
    depth: DepthCompare,
    wireframe: bool,
    pending_textures: Vec<(u32, TextureHandle)>,
    pending_cubemaps: Vec<(u32, CubemapHandle)>,
    bools: BTreeMap<String, bool>,
    ints: BTreeMap<String, i32>,
    floats: BTreeMap<String, f32>,
    vec3s: BTreeMap<String, Vec3>,
    mat4s: BTreeMap<String, Mat4>,

    meshes: BTreeMap<MeshHandle, MeshRecord>,
    next_mesh: u32,
    released: Vec<MeshHandle>,
    textures: Vec<(u32, u32)>,
    cubemaps: u32,
    missing: TextureHandle,
}

impl RecordingBackend {
    /// Texture handle 0 is reserved for the fallback texture; uploads start
    /// at 1.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_missing_texture(&mut self, texture: TextureHandle) {
        self.missing = texture;
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    /// Forget recorded calls but keep uploads and current state.
    pub fn clear_frame(&mut self) {
        self.commands.clear();
        self.draws.clear();
        self.pending_textures.clear();
        self.pending_cubemaps.clear();
    }

    pub fn current_blend(&self) -> Blend {
        self.blend
    }

    pub fn current_depth(&self) -> DepthCompare {
        self.depth
    }

    pub fn bool_uniform(&self, name: &str) -> Option<bool> {
        self.bools.get(name).copied()
    }

    pub fn int_uniform(&self, name: &str) -> Option<i32> {
        self.ints.get(name).copied()
    }

    pub fn float_uniform(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }

    pub fn vec3_uniform(&self, name: &str) -> Option<Vec3> {
        self.vec3s.get(name).copied()
    }

    pub fn mat4_uniform(&self, name: &str) -> Option<Mat4> {
        self.mat4s.get(name).copied()
    }

    /// Meshes still uploaded.
    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<MeshRecord> {
        self.meshes.get(&handle).copied()
    }

    pub fn released_meshes(&self) -> &[MeshHandle] {
        &self.released
    }

    /// Uploaded texture sizes, in upload order.
    pub fn uploaded_textures(&self) -> &[(u32, u32)] {
        &self.textures
    }

    pub fn uploaded_cubemaps(&self) -> u32 {
        self.cubemaps
    }

    /// Human-readable draw trace, one line per draw call.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Frame: {} draw calls ===", self.draws.len());
        for (i, draw) in self.draws.iter().enumerate() {
            let program = draw
                .program
                .map_or_else(|| "none".to_string(), |p| format!("{p:?}"));
            let _ = write!(
                out,
                "  [{i:>3}] mesh={} indices={} program={program} blend={:?} depth={:?}",
                draw.mesh.0, draw.index_count, draw.blend, draw.depth
            );
            if draw.wireframe {
                out.push_str(" wireframe");
            }
            for (unit, texture) in &draw.textures {
                let _ = write!(out, " t{unit}={}", texture.0);
            }
            for (unit, cubemap) in &draw.cubemaps {
                let _ = write!(out, " c{unit}={}", cubemap.0);
            }
            if let Some(model) = draw.model {
                let p = model.w_axis;
                let _ = write!(out, " at=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
            }
            out.push('\n');
        }
        out
    }
}

impl RenderBackend for RecordingBackend {
    fn use_program(&mut self, program: Program) {
        self.program = Some(program);
        self.commands.push(Command::UseProgram(program));
    }

    fn set_bool(&mut self, name: &str, value: bool) {
        self.bools.insert(name.to_string(), value);
        self.commands.push(Command::SetBool(name.to_string(), value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.ints.insert(name.to_string(), value);
        self.commands.push(Command::SetInt(name.to_string(), value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.floats.insert(name.to_string(), value);
        self.commands.push(Command::SetFloat(name.to_string(), value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.vec3s.insert(name.to_string(), value);
        self.commands.push(Command::SetVec3(name.to_string(), value));
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.mat4s.insert(name.to_string(), value);
        self.commands.push(Command::SetMat4(name.to_string(), value));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.pending_textures.push((unit, texture));
        self.commands.push(Command::BindTexture(unit, texture));
    }

    fn bind_cubemap(&mut self, unit: u32, cubemap: CubemapHandle) {
        self.pending_cubemaps.push((unit, cubemap));
        self.commands.push(Command::BindCubemap(unit, cubemap));
    }

    fn set_blend(&mut self, blend: Blend) {
        self.blend = blend;
        self.commands.push(Command::SetBlend(blend));
    }

    fn set_depth_compare(&mut self, compare: DepthCompare) {
        self.depth = compare;
        self.commands.push(Command::SetDepthCompare(compare));
    }

    fn set_wireframe(&mut self, enabled: bool) {
        self.wireframe = enabled;
        self.commands.push(Command::SetWireframe(enabled));
    }

    fn missing_texture(&self) -> TextureHandle {
        self.missing
    }

    fn draw_indexed(&mut self, mesh: MeshHandle, index_count: u32) {
        self.commands.push(Command::DrawIndexed(mesh, index_count));
        self.draws.push(DrawRecord {
            mesh,
            index_count,
            program: self.program,
            blend: self.blend,
            depth: self.depth,
            wireframe: self.wireframe,
            textures: std::mem::take(&mut self.pending_textures),
            cubemaps: std::mem::take(&mut self.pending_cubemaps),
            ints: self.ints.clone(),
            bools: self.bools.clone(),
            model: self.mat4s.get("model").copied(),
        });
    }
}

impl GpuResources for RecordingBackend {
    fn upload_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshHandle {
        let handle = MeshHandle(self.next_mesh);
        self.next_mesh += 1;
        self.meshes.insert(
            handle,
            MeshRecord {
                vertices: vertices.len(),
                indices: indices.len(),
            },
        );
        handle
    }

    fn release_mesh(&mut self, mesh: MeshHandle) {
        self.meshes.remove(&mesh);
        self.released.push(mesh);
    }

    fn upload_texture(&mut self, image: &ImageData) -> TextureHandle {
        self.textures.push((image.width, image.height));
        TextureHandle(self.textures.len() as u32)
    }

    fn upload_cubemap(&mut self, _faces: &[ImageData; 6]) -> CubemapHandle {
        self.cubemaps += 1;
        CubemapHandle(self.cubemaps - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_captures_state_and_pending_bindings() {
        let mut backend = RecordingBackend::new();
        backend.use_program(Program::Lighting);
        backend.bind_texture(0, TextureHandle(4));
        backend.set_int("material.texture_diffuse1", 0);
        backend.draw_indexed(MeshHandle(2), 6);
        backend.draw_indexed(MeshHandle(3), 3);

        let draws = backend.draws();
        assert_eq!(draws[0].textures, vec![(0, TextureHandle(4))]);
        assert!(draws[1].textures.is_empty());
        // Uniforms stay in effect until overwritten.
        assert_eq!(draws[1].ints.get("material.texture_diffuse1"), Some(&0));
        assert_eq!(draws[1].program, Some(Program::Lighting));
    }

    #[test]
    fn uploads_hand_out_distinct_handles() {
        let mut backend = RecordingBackend::new();
        let a = backend.upload_mesh(&[Vertex::default(); 3], &[0, 1, 2]);
        let b = backend.upload_mesh(&[Vertex::default(); 4], &[0, 1, 2, 2, 3, 0]);
        assert_ne!(a, b);
        assert_eq!(backend.mesh(b).unwrap().indices, 6);

        let t = backend.upload_texture(&ImageData::white());
        assert_ne!(t, backend.missing_texture());

        backend.release_mesh(a);
        assert_eq!(backend.live_meshes(), 1);
        assert_eq!(backend.released_meshes(), &[a]);
    }

    #[test]
    fn summary_lists_each_draw() {
        let mut backend = RecordingBackend::new();
        backend.use_program(Program::Skybox);
        backend.bind_cubemap(11, CubemapHandle(0));
        backend.draw_indexed(MeshHandle(9), 36);
        let text = backend.summary();
        assert!(text.contains("1 draw calls"));
        assert!(text.contains("mesh=9 indices=36 program=Skybox"));
        assert!(text.contains("c11=0"));
    }
}
