//! Tuning options, loadable from a `hunkscope.toml` file.
//!
//! ```toml
//! [highlight]
//! max_tokens = 300
//!
//! [risk]
//! max_line_bytes = 2048
//! excerpt_chars = 40
//! disabled = ["todo-marker"]
//! ```

use crate::highlight::HighlightOptions;
use crate::risk::ScanOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "hunkscope.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub highlight: HighlightOptions,
    pub risk: ScanOptions,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load the config at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `hunkscope.toml` from `dir` if present, defaults otherwise.
    ///
    /// A file that exists but fails to parse is an error.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            log::debug!("Using default config");
            Ok(Self::default())
        }
    }
}
