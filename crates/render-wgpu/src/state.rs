//! CPU side of the wgpu backend: turns the state-machine calls of
//! `RenderBackend` into one uniform block and one texture set per draw.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use lumen_render::{Blend, DepthCompare, Program};
use lumen_scene::{CubemapHandle, TextureHandle};
use std::collections::HashMap;

/// Uniform block shared by both shader programs, one copy per draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct Uniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_pos: [f32; 4],
    pub dir_direction: [f32; 4],
    pub dir_ambient: [f32; 4],
    pub dir_diffuse: [f32; 4],
    pub dir_specular: [f32; 4],
    pub spot_position: [f32; 4],
    pub spot_direction: [f32; 4],
    pub spot_ambient: [f32; 4],
    pub spot_diffuse: [f32; 4],
    pub spot_specular: [f32; 4],
    pub spot_attenuation: [f32; 4],
    pub flags: [u32; 4],
}

impl Default for Uniforms {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            model: identity,
            view: identity,
            projection: identity,
            ..Zeroable::zeroed()
        }
    }
}

/// Distance between consecutive uniform blocks in the uniform buffer.
/// Meets the default `min_uniform_buffer_offset_alignment` of 256.
pub(crate) const UNIFORM_STRIDE: u64 = 512;

/// Sampled texture slots of the lighting program, in binding order.
pub(crate) const MATERIAL_SLOTS: usize = 5;
const SLOT_SPECULAR: usize = 1;
const SLOT_MISSING: usize = 4;

fn material_slot(name: &str) -> Option<usize> {
    match name {
        "material.texture_diffuse1" => Some(0),
        "material.texture_specular1" => Some(SLOT_SPECULAR),
        "material.texture_normal1" => Some(2),
        "material.texture_height1" => Some(3),
        "material.missing_texture" => Some(SLOT_MISSING),
        _ => None,
    }
}

/// Pipeline variant required by a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub program: Program,
    pub blend: Blend,
    pub depth: DepthCompare,
    pub wireframe: bool,
}

impl PipelineKey {
    /// Blended draws test against depth but leave it untouched, so
    /// transparent meshes of one model do not hide each other.
    pub fn depth_writes(&self) -> bool {
        self.blend == Blend::Disabled
    }
}

/// Resources group 1 needs for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrawTextures {
    Material([TextureHandle; MATERIAL_SLOTS]),
    Cubemap(CubemapHandle),
}

/// Current pipeline state, uniforms and bindings.
#[derive(Debug, Default)]
pub(crate) struct FrameState {
    pub program: Option<Program>,
    pub blend: Blend,
    pub depth: DepthCompare,
    pub wireframe: bool,
    uniforms: Uniforms,
    units: HashMap<u32, TextureHandle>,
    slots: [Option<u32>; MATERIAL_SLOTS],
    cubemap: Option<CubemapHandle>,
}

fn write_xyz(target: &mut [f32; 4], value: Vec3) {
    target[..3].copy_from_slice(&value.to_array());
}

impl FrameState {
    pub fn set_bool(&mut self, name: &str, value: bool) {
        let u = &mut self.uniforms;
        match name {
            "material.has_diffuse" => u.flags[0] = value as u32,
            "spotLight.enabled" => u.spot_position[3] = if value { 1.0 } else { 0.0 },
            _ => tracing::trace!(name, "unused bool uniform"),
        }
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        if let Some(slot) = material_slot(name) {
            self.slots[slot] = u32::try_from(value).ok();
            return;
        }
        match name {
            "pointLightCount" => self.uniforms.flags[2] = value.max(0) as u32,
            // The cubemap binding itself carries the unit.
            "skybox" => {}
            _ => tracing::trace!(name, "unused int uniform"),
        }
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        let u = &mut self.uniforms;
        match name {
            "material.shininess" => u.view_pos[3] = value,
            "spotLight.constant" => u.spot_attenuation[0] = value,
            "spotLight.linear" => u.spot_attenuation[1] = value,
            "spotLight.quadratic" => u.spot_attenuation[2] = value,
            "spotLight.cutOff" => u.spot_direction[3] = value,
            "spotLight.outerCutOff" => u.spot_ambient[3] = value,
            _ => tracing::trace!(name, "unused float uniform"),
        }
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) {
        let u = &mut self.uniforms;
        let target = match name {
            "viewPos" => &mut u.view_pos,
            "dirLight.direction" => &mut u.dir_direction,
            "dirLight.ambient" => &mut u.dir_ambient,
            "dirLight.diffuse" => &mut u.dir_diffuse,
            "dirLight.specular" => &mut u.dir_specular,
            "spotLight.position" => &mut u.spot_position,
            "spotLight.direction" => &mut u.spot_direction,
            "spotLight.ambient" => &mut u.spot_ambient,
            "spotLight.diffuse" => &mut u.spot_diffuse,
            "spotLight.specular" => &mut u.spot_specular,
            _ => {
                tracing::trace!(name, "unused vec3 uniform");
                return;
            }
        };
        write_xyz(target, value);
    }

    pub fn set_mat4(&mut self, name: &str, value: Mat4) {
        let cols = value.to_cols_array_2d();
        match name {
            "model" => self.uniforms.model = cols,
            "view" => self.uniforms.view = cols,
            "projection" => self.uniforms.projection = cols,
            _ => tracing::trace!(name, "unused mat4 uniform"),
        }
    }

    pub fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.units.insert(unit, texture);
    }

    pub fn bind_cubemap(&mut self, cubemap: CubemapHandle) {
        self.cubemap = Some(cubemap);
    }

    pub fn pipeline_key(&self) -> PipelineKey {
        PipelineKey {
            program: self.program.unwrap_or(Program::Lighting),
            blend: self.blend,
            depth: self.depth,
            wireframe: self.wireframe,
        }
    }

    /// Snapshot uniforms and textures for one draw. Sampler slots are
    /// cleared afterwards, since every mesh pass rebinds its own.
    pub fn take_draw(&mut self, missing: TextureHandle) -> Option<(Uniforms, DrawTextures)> {
        let textures = match self.program.unwrap_or(Program::Lighting) {
            Program::Skybox => DrawTextures::Cubemap(self.cubemap?),
            Program::Lighting => {
                let resolved = self
                    .slots
                    .map(|unit| unit.and_then(|u| self.units.get(&u).copied()));
                self.uniforms.flags[1] = resolved[SLOT_SPECULAR].is_some() as u32;
                DrawTextures::Material(resolved.map(|t| t.unwrap_or(missing)))
            }
        };
        let uniforms = self.uniforms;
        self.slots = [None; MATERIAL_SLOTS];
        self.units.clear();
        Some((uniforms, textures))
    }
}
