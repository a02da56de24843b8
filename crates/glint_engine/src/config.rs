//! Engine and application configuration
//!
//! TOML-backed configuration with defaults for every field, so a partial
//! (or absent) config file always yields something runnable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path:?}: {source}")]
    Read {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        /// Path that failed to parse
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },
}

/// Shader source locations for the application's main program.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Path to the vertex stage source
    pub vertex_path: PathBuf,
    /// Path to the fragment stage source
    pub fragment_path: PathBuf,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            vertex_path: PathBuf::from("shaders/basic.vert"),
            fragment_path: PathBuf::from("shaders/basic.frag"),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window / application title
    pub title: String,
    /// Target frame rate the host loop paces itself against
    pub target_fps: f64,
    /// Shader sources for the main program
    pub shaders: ShaderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "glint".to_string(),
            target_fps: 60.0,
            shaders: ShaderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file is unreadable and
    /// [`ConfigError::Parse`] when it does not match the schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.sanitized())
    }

    /// Replace out-of-range values with their defaults.
    ///
    /// `target_fps` must be positive and finite: the host loop divides a
    /// frame budget by it, and a zero or negative value would turn into a
    /// non-finite `Duration`.
    fn sanitized(mut self) -> Self {
        if !self.target_fps.is_finite() || self.target_fps <= 0.0 {
            log::warn!(
                "target_fps = {} is not a usable frame rate; using {}",
                self.target_fps,
                Self::default().target_fps
            );
            self.target_fps = Self::default().target_fps;
        }
        self
    }

    /// Load a configuration, falling back to defaults when the file is
    /// missing or malformed. The failure is logged, never fatal.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("{err}; using default configuration");
                Self::default()
            }
        }
    }
}
