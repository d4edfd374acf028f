//! OBJ import through `tobj`.
//!
//! Faces are triangulated and indexed with a single index buffer. Missing
//! normals are generated from face geometry and the V texture coordinate is
//! flipped so image row 0 maps to the top of the texture.

use crate::error::AssetError;
use glam::Vec3;
use lumen_scene::{TextureKind, Vertex};
use std::path::{Path, PathBuf};

/// A texture referenced by a material, resolved against the model directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRef {
    pub kind: TextureKind,
    pub path: PathBuf,
}

/// Flattened mesh data, not yet uploaded.
#[derive(Debug, Clone)]
pub struct ImportedMesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub textures: Vec<TextureRef>,
}

/// Every mesh of one asset file, in file order.
#[derive(Debug, Clone)]
pub struct ImportedModel {
    pub meshes: Vec<ImportedMesh>,
}

/// Import an OBJ file and its material library.
pub fn import_obj(path: impl AsRef<Path>) -> Result<ImportedModel, AssetError> {
    let path = path.as_ref();
    let _span = tracing::debug_span!("import_obj", path = %path.display()).entered();

    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj(path, &options).map_err(|e| AssetError::Import {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let materials = materials.unwrap_or_else(|e| {
        tracing::warn!("no usable material library for {}: {e}", path.display());
        Vec::new()
    });

    if models.is_empty() {
        return Err(AssetError::NoMeshes {
            path: path.to_path_buf(),
        });
    }

    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    let meshes = models
        .into_iter()
        .map(|model| {
            tracing::debug!(mesh = %model.name, "processing mesh");
            let textures = model
                .mesh
                .material_id
                .and_then(|i| materials.get(i))
                .map(|m| material_textures(m, directory))
                .unwrap_or_default();
            let vertices = flatten_vertices(
                &model.mesh.positions,
                &model.mesh.normals,
                &model.mesh.texcoords,
                &model.mesh.indices,
            );
            ImportedMesh {
                name: model.name,
                vertices,
                indices: model.mesh.indices,
                textures,
            }
        })
        .collect();

    Ok(ImportedModel { meshes })
}

/// Textures of a material in diffuse, specular, normal, height order.
fn material_textures(material: &tobj::Material, directory: &Path) -> Vec<TextureRef> {
    let height = material
        .unknown_param
        .get("map_disp")
        .or_else(|| material.unknown_param.get("disp"));
    [
        (TextureKind::Diffuse, material.diffuse_texture.as_ref()),
        (TextureKind::Specular, material.specular_texture.as_ref()),
        (TextureKind::Normal, material.normal_texture.as_ref()),
        (TextureKind::Height, height),
    ]
    .into_iter()
    .filter_map(|(kind, file)| {
        file.map(|f| TextureRef {
            kind,
            path: directory.join(f),
        })
    })
    .collect()
}

/// Build interleaved vertices from tobj's flat attribute arrays.
pub(crate) fn flatten_vertices(
    positions: &[f32],
    normals: &[f32],
    texcoords: &[f32],
    indices: &[u32],
) -> Vec<Vertex> {
    let count = positions.len() / 3;
    let generated;
    let normals = if normals.len() == positions.len() {
        normals
    } else {
        generated = generate_normals(positions, indices);
        &generated
    };

    (0..count)
        .map(|i| {
            let tex_coords = if texcoords.len() >= (i + 1) * 2 {
                [texcoords[i * 2], 1.0 - texcoords[i * 2 + 1]]
            } else {
                [0.0, 0.0]
            };
            Vertex {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
                tex_coords,
            }
        })
        .collect()
}

/// Area-weighted smooth normals from triangle faces.
fn generate_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let at = |i: u32| {
        let i = i as usize * 3;
        Vec3::new(positions[i], positions[i + 1], positions[i + 2])
    };
    let mut acc = vec![Vec3::ZERO; positions.len() / 3];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (at(tri[0]), at(tri[1]), at(tri[2]));
        let face = (b - a).cross(c - a);
        for &i in tri {
            acc[i as usize] += face;
        }
    }
    acc.into_iter()
        .flat_map(|n| n.normalize_or_zero().to_array())
        .collect()
}
