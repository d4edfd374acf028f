//! Turning scene descriptions into uploaded models.

use crate::error::AssetError;
use crate::import::{ImportedMesh, TextureRef, import_obj};
use crate::texture::{decode, load_cubemap_faces};
use lumen_common::{ModelId, Transform};
use lumen_scene::{
    CubemapHandle, GpuResources, ImageData, Mesh, Model, Scene, SceneDescription, Texture,
    TextureHandle,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Uploads models through a GPU resource sink.
///
/// Textures are cached by source path for the lifetime of the loader, so a
/// file shared by several meshes or models is decoded and uploaded once.
pub struct ModelLoader<'a> {
    gpu: &'a mut dyn GpuResources,
    textures: HashMap<PathBuf, Texture>,
}

impl<'a> ModelLoader<'a> {
    pub fn new(gpu: &'a mut dyn GpuResources) -> Self {
        Self {
            gpu,
            textures: HashMap::new(),
        }
    }

    /// Number of distinct textures uploaded so far.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Import, upload and wrap one asset file as a model.
    ///
    /// Nothing is uploaded unless every mesh and texture decodes.
    pub fn load_model(
        &mut self,
        id: ModelId,
        name: impl Into<String>,
        path: &Path,
        transform: Transform,
    ) -> Result<Model, AssetError> {
        let imported = import_obj(path)?;
        self.upload_new_textures(imported.meshes.iter().flat_map(|m| &m.textures))?;
        let meshes = imported
            .meshes
            .into_iter()
            .map(|mesh| self.upload_mesh(mesh))
            .collect();
        Ok(Model::new(id, name, meshes, transform))
    }

    /// Decode every texture not yet cached, then upload them together.
    fn upload_new_textures<'r>(
        &mut self,
        refs: impl IntoIterator<Item = &'r TextureRef>,
    ) -> Result<(), AssetError> {
        let mut decoded: Vec<(&TextureRef, ImageData)> = Vec::new();
        for texture in refs {
            if self.textures.contains_key(&texture.path)
                || decoded.iter().any(|(t, _)| t.path == texture.path)
            {
                continue;
            }
            decoded.push((texture, decode(&texture.path)?));
        }
        for (texture, image) in decoded {
            let handle = self.gpu.upload_texture(&image);
            self.textures.insert(
                texture.path.clone(),
                Texture {
                    handle,
                    kind: texture.kind,
                    path: texture.path.clone(),
                    transparent: image.has_transparency(),
                },
            );
        }
        Ok(())
    }

    fn upload_mesh(&mut self, mesh: ImportedMesh) -> Mesh {
        let textures = mesh
            .textures
            .iter()
            .filter_map(|r| {
                self.textures.get(&r.path).map(|cached| Texture {
                    kind: r.kind,
                    ..cached.clone()
                })
            })
            .collect();
        tracing::trace!(
            mesh = %mesh.name,
            vertices = mesh.vertices.len(),
            indices = mesh.indices.len(),
            "uploading mesh"
        );
        Mesh::upload(&mut *self.gpu, mesh.vertices, mesh.indices, textures)
    }
}

/// Outcome of loading a scene description.
#[derive(Debug)]
pub struct SceneLoad {
    pub scene: Scene,
    /// Objects that failed to load, with the reason.
    pub skipped: Vec<(ModelId, AssetError)>,
}

/// Load every object of a description, in list order.
///
/// Object `i` receives id `i`. An object that fails to load is skipped with
/// a warning and its id stays unused.
pub fn load_scene(description: &SceneDescription, gpu: &mut dyn GpuResources) -> SceneLoad {
    let _span = tracing::info_span!("load_scene", objects = description.objects.len()).entered();
    let mut loader = ModelLoader::new(gpu);
    let mut scene = Scene::new();
    let mut skipped = Vec::new();

    for (index, object) in description.objects.iter().enumerate() {
        let id = ModelId(index as u32);
        let name = object.display_name();
        match loader.load_model(id, name.as_str(), &object.path, object.transform()) {
            Ok(model) => {
                // Ids come from list positions and cannot collide.
                if let Err(e) = scene.insert(model) {
                    tracing::warn!("{e}");
                }
            }
            Err(e) => {
                tracing::warn!(%id, path = %object.path.display(), "skipping object: {e}");
                skipped.push((id, e));
            }
        }
    }

    tracing::info!(
        models = scene.len(),
        skipped = skipped.len(),
        textures = loader.texture_count(),
        "scene loaded"
    );
    SceneLoad { scene, skipped }
}

/// Decode and upload the fallback texture.
pub fn load_missing_texture(
    path: impl AsRef<Path>,
    gpu: &mut dyn GpuResources,
) -> Result<TextureHandle, AssetError> {
    let image = decode(path)?;
    Ok(gpu.upload_texture(&image))
}

/// Decode and upload a cubemap directory.
pub fn load_skybox_cubemap(
    dir: impl AsRef<Path>,
    gpu: &mut dyn GpuResources,
) -> Result<CubemapHandle, AssetError> {
    let faces = load_cubemap_faces(dir)?;
    Ok(gpu.upload_cubemap(&faces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::CUBEMAP_FACES;
    use crate::texture::test_support::write_png;
    use lumen_scene::{MeshHandle, TextureKind, Vertex};
    use std::fs;

    #[derive(Default)]
    struct FakeGpu {
        meshes: u32,
        textures: Vec<(u32, u32)>,
        cubemaps: u32,
    }

    impl GpuResources for FakeGpu {
        fn upload_mesh(&mut self, _vertices: &[Vertex], _indices: &[u32]) -> MeshHandle {
            self.meshes += 1;
            MeshHandle(self.meshes - 1)
        }

        fn release_mesh(&mut self, _mesh: MeshHandle) {}

        fn upload_texture(&mut self, image: &ImageData) -> TextureHandle {
            self.textures.push((image.width, image.height));
            TextureHandle(self.textures.len() as u32 - 1)
        }

        fn upload_cubemap(&mut self, _faces: &[ImageData; 6]) -> CubemapHandle {
            self.cubemaps += 1;
            CubemapHandle(self.cubemaps - 1)
        }
    }

    const TRIANGLE: &str = "mtllib shared.mtl\no tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nusemtl mixed\nf 1/1 2/2 3/3\n";

    /// A directory with two OBJ files sharing one material library.
    fn asset_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("shared.mtl"),
            "newmtl mixed\nmap_Kd wood.png\nmap_Ks glass.png\n",
        )
        .unwrap();
        write_png(&dir.path().join("wood.png"), 2, 2, [120, 80, 40, 255]);
        write_png(&dir.path().join("glass.png"), 2, 2, [200, 220, 255, 100]);
        fs::write(dir.path().join("a.obj"), TRIANGLE).unwrap();
        fs::write(dir.path().join("b.obj"), TRIANGLE).unwrap();
        dir
    }

    fn describe(dir: &Path, files: &[&str]) -> SceneDescription {
        let objects = files
            .iter()
            .enumerate()
            .map(|(i, f)| {
                format!(
                    "  - path: {}\n    originZ: {}\n",
                    dir.join(f).display(),
                    -(i as f32)
                )
            })
            .collect::<String>();
        SceneDescription::from_yaml(&format!("objects:\n{objects}")).unwrap()
    }

    #[test]
    fn textures_carry_kind_and_transparency() {
        let dir = asset_dir();
        let mut gpu = FakeGpu::default();
        let model = ModelLoader::new(&mut gpu)
            .load_model(ModelId(0), "a", &dir.path().join("a.obj"), Transform::default())
            .unwrap();

        let textures = model.meshes()[0].textures();
        assert_eq!(textures.len(), 2);
        assert_eq!(textures[0].kind, TextureKind::Diffuse);
        assert!(!textures[0].transparent);
        assert_eq!(textures[1].kind, TextureKind::Specular);
        assert!(textures[1].transparent);
    }

    #[test]
    fn shared_textures_upload_once_per_scene() {
        let dir = asset_dir();
        let mut gpu = FakeGpu::default();
        let load = load_scene(&describe(dir.path(), &["a.obj", "b.obj"]), &mut gpu);
        assert_eq!(load.scene.len(), 2);
        assert_eq!(gpu.meshes, 2);
        assert_eq!(gpu.textures.len(), 2);
    }

    #[test]
    fn ids_follow_list_order_and_skip_failures() {
        let dir = asset_dir();
        let mut gpu = FakeGpu::default();
        let load = load_scene(
            &describe(dir.path(), &["a.obj", "missing.obj", "b.obj"]),
            &mut gpu,
        );

        let ids: Vec<u32> = load.scene.objects().iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(load.skipped.len(), 1);
        assert_eq!(load.skipped[0].0, ModelId(1));
        let third = load.scene.get(ModelId(2)).unwrap();
        assert_eq!(third.name(), "b");
        assert_eq!(third.position().z, -2.0);
    }

    #[test]
    fn undecodable_texture_skips_the_model_without_uploads() {
        let dir = asset_dir();
        fs::write(dir.path().join("glass.png"), b"garbage").unwrap();
        let mut gpu = FakeGpu::default();
        let load = load_scene(&describe(dir.path(), &["a.obj"]), &mut gpu);
        assert!(load.scene.is_empty());
        assert!(matches!(load.skipped[0].1, AssetError::Decode { .. }));
        assert_eq!(gpu.meshes, 0);
        assert!(gpu.textures.is_empty());
    }

    #[test]
    fn fallback_and_skybox_uploads() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("missing.png"), 1, 1, [255, 0, 255, 255]);
        for face in CUBEMAP_FACES {
            write_png(&dir.path().join(format!("{face}.png")), 2, 2, [0, 0, 0, 255]);
        }
        let mut gpu = FakeGpu::default();
        assert_eq!(
            load_missing_texture(dir.path().join("missing.png"), &mut gpu).unwrap(),
            TextureHandle(0)
        );
        assert_eq!(load_skybox_cubemap(dir.path(), &mut gpu).unwrap(), CubemapHandle(0));
        assert!(load_missing_texture(dir.path().join("nope.png"), &mut gpu).is_err());
    }
}
