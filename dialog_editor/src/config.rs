//! Editor configuration, loaded from TOML.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{EditorError, Result};

/// Tunables for the registries, the navigator and the file gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Allow `add_label` to append a name the dialog already has.
    pub allow_duplicate_labels: bool,

    /// Reject cursor moves onto labels the current dialog does not know.
    pub strict_labels: bool,

    /// Highest step counter the navigator accepts.
    pub max_counter: Option<u32>,

    /// Storage root of the file gateway.
    pub data_dir: Option<PathBuf>,

    /// Directory handed back by the file gateway's directory pick.
    pub export_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            allow_duplicate_labels: true,
            strict_labels: true,
            max_counter: None,
            data_dir: None,
            export_dir: None,
        }
    }
}

impl EditorConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| EditorError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| EditorError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }
}
