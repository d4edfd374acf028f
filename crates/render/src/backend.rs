use glam::{Mat4, Vec3};
use lumen_scene::{CubemapHandle, MeshHandle, TextureHandle};

/// Shader program selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    /// Textured meshes with directional and spot lighting.
    Lighting,
    /// Cubemap background.
    Skybox,
}

/// Color blending for subsequent draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Blend {
    #[default]
    Disabled,
    /// `src_alpha, one_minus_src_alpha, add`.
    AlphaOver,
}

/// Depth test for subsequent draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthCompare {
    #[default]
    Less,
    LessEqual,
}

/// State-machine style draw interface.
///
/// Uniform and binding calls affect the draws that follow them, until
/// overwritten. Uniform names follow the shader's GLSL-style paths such as
/// `material.texture_diffuse1` or `spotLight.cutOff`.
pub trait RenderBackend {
    fn use_program(&mut self, program: Program);

    fn set_bool(&mut self, name: &str, value: bool);
    fn set_int(&mut self, name: &str, value: i32);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_mat4(&mut self, name: &str, value: Mat4);

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);
    fn bind_cubemap(&mut self, unit: u32, cubemap: CubemapHandle);

    fn set_blend(&mut self, blend: Blend);
    fn set_depth_compare(&mut self, compare: DepthCompare);
    /// Line polygon mode. Backends without support ignore it.
    fn set_wireframe(&mut self, enabled: bool);

    /// Fallback texture bound after a mesh's own textures.
    fn missing_texture(&self) -> TextureHandle;

    fn draw_indexed(&mut self, mesh: MeshHandle, index_count: u32);
}
