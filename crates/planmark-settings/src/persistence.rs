//! Settings Persistence
//!
//! Ties a [`Config`] to the file it was loaded from, so hosts can edit it
//! in place and write it back.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::SettingsResult;

/// A config bound to its file
#[derive(Debug, Clone)]
pub struct SettingsPersistence {
    path: PathBuf,
    config: Config,
}

impl SettingsPersistence {
    /// Binds default settings to `path` without touching the filesystem
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Config::default(),
        }
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    ///
    /// A file that exists but does not parse or validate is an error.
    pub fn load_or_default(path: impl Into<PathBuf>) -> SettingsResult<Self> {
        let path = path.into();
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::new(path));
        }
        let config = Config::load_from_file(&path)?;
        Ok(Self { path, config })
    }

    /// Loads from [`Config::default_path`].
    pub fn load_default() -> SettingsResult<Self> {
        Self::load_or_default(Config::default_path()?)
    }

    /// Save settings to the bound file
    pub fn save(&self) -> SettingsResult<()> {
        self.config.save_to_file(&self.path)?;
        tracing::info!("Settings saved to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get reference to config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable reference to config
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Validate settings
    pub fn validate(&self) -> SettingsResult<()> {
        Ok(self.config.validate()?)
    }
}
