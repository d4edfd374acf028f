//! Two-pass mesh draw and per-model draw.

use crate::backend::{Blend, RenderBackend};
use lumen_scene::{Mesh, Model, TextureKind};

/// Which textures a pass binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Opaque,
    Transparent,
}

impl Pass {
    pub const ORDER: [Pass; 2] = [Pass::Opaque, Pass::Transparent];

    fn accepts(self, transparent: bool) -> bool {
        transparent == (self == Pass::Transparent)
    }
}

/// Something that issues draw calls against a backend.
pub trait Drawable {
    /// Issue every draw call. Returns the number of indexed draws.
    fn draw(&self, backend: &mut dyn RenderBackend) -> u32;
}

/// Per-kind sampler ordinals, each starting at 1.
#[derive(Default)]
struct KindCounters([u32; 4]);

impl KindCounters {
    fn next(&mut self, kind: TextureKind) -> u32 {
        let slot = &mut self.0[kind as usize];
        *slot += 1;
        *slot
    }

    fn count(&self, kind: TextureKind) -> u32 {
        self.0[kind as usize]
    }
}

/// Draw the part of `mesh` that belongs to `pass`. Returns whether a draw
/// call was issued.
pub fn draw_mesh_pass(mesh: &Mesh, backend: &mut dyn RenderBackend, pass: Pass) -> bool {
    let textures = mesh.textures();
    if textures.is_empty() && pass == Pass::Transparent {
        return false;
    }

    let mut unit = 0;
    let mut counters = KindCounters::default();
    for texture in textures.iter().filter(|t| pass.accepts(t.transparent)) {
        let ordinal = counters.next(texture.kind);
        backend.bind_texture(unit, texture.handle);
        backend.set_int(
            &format!("material.{}{ordinal}", texture.kind.uniform_stem()),
            unit as i32,
        );
        unit += 1;
    }
    if unit == 0 && !textures.is_empty() {
        return false;
    }
    backend.set_bool("material.has_diffuse", counters.count(TextureKind::Diffuse) > 0);

    let missing = backend.missing_texture();
    backend.bind_texture(unit, missing);
    backend.set_int("material.missing_texture", unit as i32);

    if pass == Pass::Transparent {
        backend.set_blend(Blend::AlphaOver);
    }
    backend.draw_indexed(mesh.buffers(), mesh.index_count());
    if pass == Pass::Transparent {
        backend.set_blend(Blend::Disabled);
    }
    true
}

impl Drawable for Mesh {
    fn draw(&self, backend: &mut dyn RenderBackend) -> u32 {
        Pass::ORDER
            .into_iter()
            .map(|pass| draw_mesh_pass(self, backend, pass) as u32)
            .sum()
    }
}

impl Drawable for Model {
    fn draw(&self, backend: &mut dyn RenderBackend) -> u32 {
        backend.set_mat4("model", self.world_matrix());
        self.meshes().iter().map(|mesh| mesh.draw(backend)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Command, RecordingBackend};
    use lumen_common::{ModelId, Transform};
    use lumen_scene::{Texture, TextureHandle, Vertex};
    use std::path::PathBuf;

    fn texture(handle: u32, kind: TextureKind, transparent: bool) -> Texture {
        Texture {
            handle: TextureHandle(handle),
            kind,
            path: PathBuf::from(format!("t{handle}.png")),
            transparent,
        }
    }

    fn mesh(backend: &mut RecordingBackend, textures: Vec<Texture>) -> Mesh {
        let vertices = vec![Vertex::default(); 3];
        Mesh::upload(backend, vertices, vec![0, 1, 2], textures)
    }

    #[test]
    fn opaque_only_mesh_draws_once_without_blending() {
        let mut backend = RecordingBackend::new();
        let mesh = mesh(
            &mut backend,
            vec![
                texture(1, TextureKind::Diffuse, false),
                texture(2, TextureKind::Specular, false),
            ],
        );
        assert_eq!(mesh.draw(&mut backend), 1);

        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].blend, Blend::Disabled);
        assert_eq!(
            draws[0].textures,
            vec![(0, TextureHandle(1)), (1, TextureHandle(2)), (2, backend.missing_texture())]
        );
        assert!(!backend.commands().contains(&Command::SetBlend(Blend::AlphaOver)));
    }

    #[test]
    fn transparent_only_mesh_draws_once_blended() {
        let mut backend = RecordingBackend::new();
        let mesh = mesh(&mut backend, vec![texture(5, TextureKind::Diffuse, true)]);
        assert_eq!(mesh.draw(&mut backend), 1);

        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].blend, Blend::AlphaOver);
        // Blending is switched off again right after the draw.
        assert_eq!(backend.commands().last(), Some(&Command::SetBlend(Blend::Disabled)));
        assert_eq!(backend.current_blend(), Blend::Disabled);
    }

    #[test]
    fn mixed_mesh_draws_once_per_pass_with_matching_textures() {
        let mut backend = RecordingBackend::new();
        let mesh = mesh(
            &mut backend,
            vec![
                texture(1, TextureKind::Diffuse, false),
                texture(2, TextureKind::Diffuse, true),
                texture(3, TextureKind::Specular, false),
            ],
        );
        assert_eq!(mesh.draw(&mut backend), 2);

        let draws = backend.draws();
        let missing = backend.missing_texture();
        assert_eq!(draws[0].blend, Blend::Disabled);
        assert_eq!(
            draws[0].textures,
            vec![(0, TextureHandle(1)), (1, TextureHandle(3)), (2, missing)]
        );
        assert_eq!(draws[1].blend, Blend::AlphaOver);
        assert_eq!(draws[1].textures, vec![(0, TextureHandle(2)), (1, missing)]);
        // Ordinals restart per pass.
        assert_eq!(draws[1].ints.get("material.texture_diffuse1"), Some(&0));
        assert_eq!(draws[1].ints.get("material.missing_texture"), Some(&1));
    }

    #[test]
    fn textureless_mesh_draws_only_in_opaque_pass() {
        let mut backend = RecordingBackend::new();
        let mesh = mesh(&mut backend, Vec::new());
        assert_eq!(mesh.draw(&mut backend), 1);
        let draws = backend.draws();
        assert_eq!(draws[0].blend, Blend::Disabled);
        assert_eq!(draws[0].textures, vec![(0, backend.missing_texture())]);
        assert_eq!(draws[0].bools.get("material.has_diffuse"), Some(&false));
    }

    #[test]
    fn per_kind_ordinals_count_independently() {
        let mut backend = RecordingBackend::new();
        let mesh = mesh(
            &mut backend,
            vec![
                texture(1, TextureKind::Diffuse, false),
                texture(2, TextureKind::Specular, false),
                texture(3, TextureKind::Diffuse, false),
                texture(4, TextureKind::Height, false),
            ],
        );
        mesh.draw(&mut backend);
        let ints = &backend.draws()[0].ints;
        assert_eq!(ints.get("material.texture_diffuse1"), Some(&0));
        assert_eq!(ints.get("material.texture_specular1"), Some(&1));
        assert_eq!(ints.get("material.texture_diffuse2"), Some(&2));
        assert_eq!(ints.get("material.texture_height1"), Some(&3));
        assert_eq!(ints.get("material.missing_texture"), Some(&4));
    }

    #[test]
    fn has_diffuse_is_reset_between_passes() {
        let mut backend = RecordingBackend::new();
        let mesh = mesh(
            &mut backend,
            vec![
                texture(1, TextureKind::Diffuse, false),
                texture(2, TextureKind::Specular, true),
            ],
        );
        mesh.draw(&mut backend);
        let draws = backend.draws();
        assert_eq!(draws[0].bools.get("material.has_diffuse"), Some(&true));
        assert_eq!(draws[1].bools.get("material.has_diffuse"), Some(&false));
    }

    #[test]
    fn model_sets_world_matrix_before_meshes() {
        let mut backend = RecordingBackend::new();
        let meshes = vec![mesh(&mut backend, Vec::new()), mesh(&mut backend, Vec::new())];
        let transform = Transform {
            position: glam::Vec3::new(1.0, 2.0, 3.0),
            ..Transform::default()
        };
        let model = Model::new(ModelId(0), "pair", meshes, transform);
        assert_eq!(model.draw(&mut backend), 2);
        assert_eq!(
            backend.commands()[0],
            Command::SetMat4("model".into(), transform.matrix())
        );
        assert_eq!(backend.draws().len(), 2);
    }
}
