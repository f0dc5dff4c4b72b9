//! Thresholds and policy switches for validation and gating.
//!
//! Loaded from `config.toml` under the Coursecraft home directory when
//! present; every key is optional and falls back to the defaults below.
//!
//! ```toml
//! min_title_chars = 12
//! require_video_lesson_per_module = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid lifecycle config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    // Step 1
    pub min_title_chars: usize,
    pub min_short_description_chars: usize,
    pub min_description_chars: usize,

    // Step 2
    pub min_learning_outcomes: usize,
    pub min_requirements: usize,

    // Step 3 and the publication gate
    pub min_modules: usize,
    pub min_lessons: usize,

    /// A module needs at least one video lesson before it can be published.
    pub require_video_lesson_per_module: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            min_title_chars: 10,
            min_short_description_chars: 20,
            min_description_chars: 100,
            min_learning_outcomes: 3,
            min_requirements: 1,
            min_modules: 1,
            min_lessons: 3,
            require_video_lesson_per_module: true,
        }
    }
}

impl LifecycleConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load from `path`, or return the defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}
