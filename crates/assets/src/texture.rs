//! Image decoding for 2D textures and cubemap faces.

use crate::error::AssetError;
use lumen_scene::ImageData;
use std::path::{Path, PathBuf};

/// Cubemap face file stems in +X, -X, +Y, -Y, +Z, -Z order.
pub const CUBEMAP_FACES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

const FACE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Decode any supported image file into tightly packed RGBA8.
pub fn decode(path: impl AsRef<Path>) -> Result<ImageData, AssetError> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();
    tracing::debug!(path = %path.display(), width, height, "image decoded");
    Ok(ImageData {
        width,
        height,
        rgba: image.into_raw(),
    })
}

/// Locate `<dir>/<face>.{jpg,jpeg,png}`.
fn face_path(dir: &Path, face: &'static str) -> Result<PathBuf, AssetError> {
    FACE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{face}.{ext}")))
        .find(|p| p.is_file())
        .ok_or_else(|| AssetError::MissingFace {
            dir: dir.to_path_buf(),
            face,
        })
}

/// Decode the six faces of a cubemap directory.
///
/// Every face must be square and all faces must share one size.
pub fn load_cubemap_faces(dir: impl AsRef<Path>) -> Result<[ImageData; 6], AssetError> {
    let dir = dir.as_ref();
    let faces = CUBEMAP_FACES
        .into_iter()
        .map(|face| face_path(dir, face).and_then(decode))
        .collect::<Result<Vec<_>, _>>()?;

    let size = faces[0].width;
    if faces.iter().any(|f| f.width != size || f.height != size) {
        return Err(AssetError::FaceSizeMismatch {
            dir: dir.to_path_buf(),
        });
    }

    faces.try_into().map_err(|_| AssetError::FaceSizeMismatch {
        dir: dir.to_path_buf(),
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::write_png;
    use super::*;

    #[test]
    fn decodes_png_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        write_png(&path, 2, 3, [255, 0, 0, 255]);

        let image = decode(&path).unwrap();
        assert_eq!((image.width, image.height), (2, 3));
        assert_eq!(image.rgba.len(), 2 * 3 * 4);
        assert_eq!(&image.rgba[..4], &[255, 0, 0, 255]);
        assert!(!image.has_transparency());
    }

    #[test]
    fn alpha_survives_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glass.png");
        write_png(&path, 1, 1, [200, 200, 255, 128]);
        assert!(decode(&path).unwrap().has_transparency());
    }

    #[test]
    fn undecodable_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        match decode(&path) {
            Err(AssetError::Decode { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn loads_six_faces_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for (i, face) in CUBEMAP_FACES.iter().enumerate() {
            write_png(&dir.path().join(format!("{face}.png")), 4, 4, [i as u8, 0, 0, 255]);
        }
        let faces = load_cubemap_faces(dir.path()).unwrap();
        for (i, face) in faces.iter().enumerate() {
            assert_eq!(face.rgba[0], i as u8);
        }
    }

    #[test]
    fn missing_face_is_named() {
        let dir = tempfile::tempdir().unwrap();
        for face in &CUBEMAP_FACES[..5] {
            write_png(&dir.path().join(format!("{face}.png")), 4, 4, [0, 0, 0, 255]);
        }
        match load_cubemap_faces(dir.path()) {
            Err(AssetError::MissingFace { face, .. }) => assert_eq!(face, "back"),
            other => panic!("expected missing face, got {other:?}"),
        }
    }

    #[test]
    fn faces_must_match_in_size() {
        let dir = tempfile::tempdir().unwrap();
        for (i, face) in CUBEMAP_FACES.iter().enumerate() {
            let size = if i == 3 { 8 } else { 4 };
            write_png(&dir.path().join(format!("{face}.png")), size, size, [0, 0, 0, 255]);
        }
        assert!(matches!(
            load_cubemap_faces(dir.path()),
            Err(AssetError::FaceSizeMismatch { .. })
        ));
    }
}
