use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file does not exist: {0}")]
    Missing(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Startup configuration.
///
/// Loaded once in `main` and passed by reference to whatever needs it. Keys
/// are camelCase in the YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Near clip distance.
    pub render_distance_min: f32,
    /// Far clip distance.
    pub render_distance_max: f32,
    /// Initial field of view in degrees.
    pub fov: f32,
    /// Upper bound for zooming out, in degrees.
    pub max_fov: f32,
    pub width: u32,
    pub height: u32,
    /// Camera speed in world units per second.
    pub camera_speed: f32,
    pub vsync: bool,
    /// Listen address of the remote control server.
    pub remote_address: String,
    /// Directory holding the six cubemap faces. No skybox when absent.
    pub skybox: Option<PathBuf>,
    /// Fallback texture bound when a sampler has nothing else.
    pub missing_texture: PathBuf,
    pub shininess: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            render_distance_min: 0.1,
            render_distance_max: 100.0,
            fov: 45.0,
            max_fov: 89.0,
            width: 800,
            height: 600,
            camera_speed: 2.5,
            vsync: true,
            remote_address: "127.0.0.1:8080".into(),
            skybox: None,
            missing_texture: PathBuf::from("assets/textures/missing.png"),
            shininess: 32.0,
        }
    }
}

impl Config {
    /// Load and validate a YAML config file. Missing keys take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Aspect ratio of the configured window size.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.render_distance_min > 0.0 && self.render_distance_min < self.render_distance_max)
        {
            return Err(ConfigError::Invalid(format!(
                "render distance must satisfy 0 < min < max, got {}..{}",
                self.render_distance_min, self.render_distance_max
            )));
        }
        if !(1.0..=179.0).contains(&self.max_fov) {
            return Err(ConfigError::Invalid(format!(
                "maxFov must be within 1..=179, got {}",
                self.max_fov
            )));
        }
        if !(1.0..=self.max_fov).contains(&self.fov) {
            return Err(ConfigError::Invalid(format!(
                "fov must be within 1..={}, got {}",
                self.max_fov, self.fov
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".into()));
        }
        Ok(())
    }
}
