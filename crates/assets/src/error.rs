use std::path::PathBuf;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to import {path}: {message}")]
    Import { path: PathBuf, message: String },
    #[error("{path} contains no meshes")]
    NoMeshes { path: PathBuf },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cubemap face '{face}' not found in {dir}")]
    MissingFace { dir: PathBuf, face: &'static str },
    #[error("cubemap faces in {dir} must be square and equally sized")]
    FaceSizeMismatch { dir: PathBuf },
}
