use automator_core::{Classifier, ExtensionTable};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, IoContext, Result};

pub const DEFAULT_OUTPUT_DIR: &str = "public/assets";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_dir: PathBuf,
    /// Parent directory for per-run repository checkouts.
    pub temp_dir: PathBuf,
    pub categories: ExtensionTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            temp_dir: std::env::temp_dir(),
            categories: ExtensionTable::default(),
        }
    }
}

impl Config {
    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.categories.clone())
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).at(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let duplicates = config.categories.duplicates();
        if !duplicates.is_empty() {
            tracing::warn!(
                config = %path.display(),
                ?duplicates,
                "extensions listed under several categories, first listed wins"
            );
        }

        Ok(config)
    }

    /// Falls back to defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map(Self::load).unwrap_or_else(|| Ok(Self::default()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).at(parent)?;
        }
        std::fs::write(path, content).at(path)
    }
}
