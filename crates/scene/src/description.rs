use glam::Vec3;
use lumen_common::{Rotation, Transform};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from reading a scene description.
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    #[error("scene file does not exist: {0}")]
    Missing(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML scene: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("object {index} ({path}) has a non-finite transform")]
    NonFinite { index: usize, path: PathBuf },
}

/// Startup scene: the ordered list of objects to place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub objects: Vec<ObjectDescription>,
}

/// One placed object. Keys are camelCase in the YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescription {
    pub path: PathBuf,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub origin_x: f32,
    #[serde(default)]
    pub origin_y: f32,
    #[serde(default)]
    pub origin_z: f32,
    #[serde(default)]
    pub rotation_x: f32,
    #[serde(default = "one")]
    pub rotation_y: f32,
    #[serde(default)]
    pub rotation_z: f32,
    #[serde(default)]
    pub rotation_angle: f32,
    #[serde(default = "one")]
    pub scale_x: f32,
    #[serde(default = "one")]
    pub scale_y: f32,
    #[serde(default = "one")]
    pub scale_z: f32,
}

fn one() -> f32 {
    1.0
}

impl ObjectDescription {
    pub fn transform(&self) -> Transform {
        Transform {
            position: Vec3::new(self.origin_x, self.origin_y, self.origin_z),
            rotation: Rotation::new(
                Vec3::new(self.rotation_x, self.rotation_y, self.rotation_z),
                self.rotation_angle,
            ),
            scale: Vec3::new(self.scale_x, self.scale_y, self.scale_z),
        }
    }

    /// Explicit name, or the asset file stem.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string()),
        }
    }
}

impl SceneDescription {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescriptionError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DescriptionError::Missing(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse a description. Transforms must be finite; YAML accepts
    /// `.nan` and `.inf` for floats.
    pub fn from_yaml(text: &str) -> Result<Self, DescriptionError> {
        let description: Self = serde_yaml::from_str(text)?;
        if let Some((index, object)) = description
            .objects
            .iter()
            .enumerate()
            .find(|(_, o)| !o.transform().is_finite())
        {
            return Err(DescriptionError::NonFinite {
                index,
                path: object.path.clone(),
            });
        }
        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCENE: &str = r#"
objects:
  - path: assets/backpack/backpack.obj
    originX: 0
    originY: 0
    originZ: -10
    rotationX: 1
    rotationY: 0
    rotationZ: 0
    rotationAngle: 90
    scaleX: 0.5
    scaleY: 0.5
    scaleZ: 0.5
  - path: assets/window/window.obj
    name: Window
"#;

    #[test]
    fn parses_objects_in_order() {
        let desc = SceneDescription::from_yaml(SCENE).unwrap();
        assert_eq!(desc.objects.len(), 2);

        let first = desc.objects[0].transform();
        assert_eq!(first.position, Vec3::new(0.0, 0.0, -10.0));
        assert_eq!(first.rotation, Rotation::new(Vec3::X, 90.0));
        assert_eq!(first.scale, Vec3::splat(0.5));
        assert_eq!(desc.objects[0].display_name(), "backpack");
        assert_eq!(desc.objects[1].display_name(), "Window");
    }

    #[test]
    fn omitted_fields_default_to_identity() {
        let desc = SceneDescription::from_yaml(SCENE).unwrap();
        assert_eq!(desc.objects[1].transform(), Transform::default());
    }

    #[test]
    fn empty_document_has_no_objects() {
        let desc = SceneDescription::from_yaml("objects: []").unwrap();
        assert!(desc.objects.is_empty());
    }

    #[test]
    fn missing_path_key_is_an_error() {
        assert!(SceneDescription::from_yaml("objects:\n  - originX: 1\n").is_err());
    }

    #[test]
    fn non_finite_transform_is_rejected() {
        let text = "objects:\n  - path: a.obj\n  - path: b.obj\n    originX: .nan\n";
        match SceneDescription::from_yaml(text) {
            Err(DescriptionError::NonFinite { index, path }) => {
                assert_eq!(index, 1);
                assert_eq!(path, PathBuf::from("b.obj"));
            }
            other => panic!("expected non-finite error, got {other:?}"),
        }
        let text = "objects:\n  - path: a.obj\n    scaleY: -.inf\n";
        assert!(matches!(
            SceneDescription::from_yaml(text),
            Err(DescriptionError::NonFinite { index: 0, .. })
        ));
    }

    #[test]
    fn load_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "{SCENE}").unwrap();
        let desc = SceneDescription::load(tmp.path()).unwrap();
        assert_eq!(desc.objects.len(), 2);
        assert!(matches!(
            SceneDescription::load("/no/such/scene.yaml"),
            Err(DescriptionError::Missing(_))
        ));
    }
}
