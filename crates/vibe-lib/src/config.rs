use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for one merge run. Missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Token a header must contain (case and whitespace ignored) to be the
    /// time column.
    pub target_column: String,
    /// File extension of class members, matched case-insensitively.
    pub extension: String,
    pub output_dir: PathBuf,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            target_column: "channel".into(),
            extension: "csv".into(),
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl MergeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing merge config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }
}
