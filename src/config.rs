//! Configuration file support for levelbook
//!
//! Reads from .levelbook/config.toml

use crate::catalog::Reference;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the archive path
pub const ARCHIVE_ENV: &str = "LEVELBOOK_ARCHIVE";

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Archive settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Replacement reference tables
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Directory holding the config file; relative paths resolve against its parent
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Archive-related configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Archive file to open when none is given
    /// Default: "levelbook.zip"
    #[serde(default = "default_archive_path")]
    pub path: PathBuf,
}

/// Optional CSV files replacing the built-in reference tables
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct ReferenceConfig {
    /// `activity,points`
    #[serde(default)]
    pub activities: Option<PathBuf>,
    /// `level,min_xp`
    #[serde(default)]
    pub progression: Option<PathBuf>,
    /// `level,rank`
    #[serde(default)]
    pub ranks: Option<PathBuf>,
}

fn default_archive_path() -> PathBuf {
    PathBuf::from("levelbook.zip")
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: default_archive_path(),
        }
    }
}

impl Config {
    /// Load config from .levelbook/config.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Self {
        if let Some(path) = Self::find_config_path() {
            match Self::load_from(&path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %path.display(), "Ignoring config: {}", e),
            }
        }
        Self::default()
    }

    /// Parse a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config =
            toml::from_str(&contents).map_err(|e| Error::Config(e.to_string()))?;
        config.base_dir = path
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf);
        Ok(config)
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".levelbook").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Archive path: explicit argument, then `LEVELBOOK_ARCHIVE`, then config
    pub fn archive_path(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(ARCHIVE_ENV) {
            return PathBuf::from(path);
        }
        self.resolve(&self.archive.path)
    }

    /// Reference tables, from configured files where given
    pub fn reference(&self) -> Result<Reference> {
        let activities = self.reference.activities.as_deref().map(|p| self.resolve(p));
        let progression = self.reference.progression.as_deref().map(|p| self.resolve(p));
        let ranks = self.reference.ranks.as_deref().map(|p| self.resolve(p));
        Reference::load(
            activities.as_deref(),
            progression.as_deref(),
            ranks.as_deref(),
        )
    }
}
