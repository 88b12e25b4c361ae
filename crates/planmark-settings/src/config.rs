//! Configuration for Planmark
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats, stored by default in the platform config directory.
//!
//! Configuration is organized into sections that map onto the annotator's
//! runtime configs:
//! - Interaction thresholds and timers
//! - Undo history depth
//! - Coordinate mapping and default page size
//! - Isolation mask and viewport fitting
//! - Zoom limits
//! - Project selection

use planmark_annotator::{
    CoordinateConfig, HistoryConfig, InteractionConfig, IsolationConfig, PageDimensions,
    SessionConfig, ZoomLimits,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// On-disk format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("none").to_string(),
            )),
        }
    }
}

/// Pointer gesture thresholds and timers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// Smallest drawable side in layout pixels
    pub min_draw_size: f64,
    /// Largest change still treated as click jitter
    pub min_adjust_delta: f64,
    /// Quiet period before a resize or move is saved
    pub save_debounce_ms: u64,
    /// Poll interval for deferred tree refreshes
    pub refresh_poll_ms: u64,
    /// How long a refused duplicate stays highlighted
    pub duplicate_highlight_ms: u64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            min_draw_size: 20.0,
            min_adjust_delta: 2.0,
            save_debounce_ms: 1000,
            refresh_poll_ms: 100,
            duplicate_highlight_ms: 2000,
        }
    }
}

impl From<&InteractionSettings> for InteractionConfig {
    fn from(settings: &InteractionSettings) -> Self {
        Self {
            min_draw_size: settings.min_draw_size,
            min_adjust_delta: settings.min_adjust_delta,
            save_debounce: Duration::from_millis(settings.save_debounce_ms),
            refresh_poll: Duration::from_millis(settings.refresh_poll_ms),
            duplicate_highlight: Duration::from_millis(settings.duplicate_highlight_ms),
        }
    }
}

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Maximum snapshots kept
    pub max_size: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { max_size: 50 }
    }
}

impl From<&HistorySettings> for HistoryConfig {
    fn from(settings: &HistorySettings) -> Self {
        Self {
            max_size: settings.max_size,
        }
    }
}

/// Coordinate mapping settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateSettings {
    /// How long a surface bounding rectangle is reused
    pub rect_cache_ttl_ms: u64,
    /// Page width in points when a page reports none
    pub default_page_width: f64,
    /// Page height in points when a page reports none
    pub default_page_height: f64,
}

impl Default for CoordinateSettings {
    fn default() -> Self {
        Self {
            rect_cache_ttl_ms: 100,
            default_page_width: PageDimensions::LETTER.width,
            default_page_height: PageDimensions::LETTER.height,
        }
    }
}

impl CoordinateSettings {
    pub fn default_page(&self) -> PageDimensions {
        PageDimensions::new(self.default_page_width, self.default_page_height)
    }
}

/// Isolation mode settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationSettings {
    pub mask_padding: f64,
    pub mask_corner_radius: f64,
    /// Share of the viewport a fitted annotation may fill
    pub fit_padding: f64,
    /// Wait for a deferred re-render after the viewport settles
    pub settle_ms: u64,
}

impl Default for IsolationSettings {
    fn default() -> Self {
        Self {
            mask_padding: 15.0,
            mask_corner_radius: 8.0,
            fit_padding: 0.9,
            settle_ms: 150,
        }
    }
}

impl From<&IsolationSettings> for IsolationConfig {
    fn from(settings: &IsolationSettings) -> Self {
        Self {
            mask_padding: settings.mask_padding,
            mask_corner_radius: settings.mask_corner_radius,
            fit_padding: settings.fit_padding,
            settle: Duration::from_millis(settings.settle_ms),
        }
    }
}

/// Zoom limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        let limits = ZoomLimits::default();
        Self {
            min: limits.min,
            max: limits.max,
            step: limits.step,
        }
    }
}

impl From<&ZoomSettings> for ZoomLimits {
    fn from(settings: &ZoomSettings) -> Self {
        Self {
            min: settings.min,
            max: settings.max,
            step: settings.step,
        }
    }
}

/// Project selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Project whose entity tree is loaded
    pub project_id: u64,
}

/// Complete annotator configuration
///
/// Aggregates all settings sections and provides file I/O operations.
/// Missing sections and keys fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub interaction: InteractionSettings,
    pub history: HistorySettings,
    pub coordinates: CoordinateSettings,
    pub isolation: IsolationSettings,
    pub zoom: ZoomSettings,
    pub project: ProjectSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config dir>/planmark/config.toml`
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("planmark").join("config.toml"))
            .ok_or_else(|| ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let format = ConfigFormat::from_path(path)?;

        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e))
            })?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let interaction = &self.interaction;
        if interaction.min_draw_size <= 0.0 {
            return Err(ConfigError::out_of_range(
                "interaction.min_draw_size",
                interaction.min_draw_size,
            ));
        }
        if interaction.min_adjust_delta < 0.0 {
            return Err(ConfigError::out_of_range(
                "interaction.min_adjust_delta",
                interaction.min_adjust_delta,
            ));
        }

        let durations = [
            ("interaction.save_debounce_ms", interaction.save_debounce_ms),
            ("interaction.refresh_poll_ms", interaction.refresh_poll_ms),
            (
                "interaction.duplicate_highlight_ms",
                interaction.duplicate_highlight_ms,
            ),
            ("coordinates.rect_cache_ttl_ms", self.coordinates.rect_cache_ttl_ms),
            ("isolation.settle_ms", self.isolation.settle_ms),
        ];
        if let Some((key, value)) = durations.iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::out_of_range(key, value));
        }

        if self.history.max_size == 0 {
            return Err(ConfigError::out_of_range("history.max_size", 0));
        }

        if !self.coordinates.default_page().is_valid() {
            return Err(ConfigError::out_of_range(
                "coordinates.default_page_width",
                format!(
                    "{}x{}",
                    self.coordinates.default_page_width, self.coordinates.default_page_height
                ),
            ));
        }

        if self.isolation.fit_padding <= 0.0 || self.isolation.fit_padding > 1.0 {
            return Err(ConfigError::out_of_range(
                "isolation.fit_padding",
                self.isolation.fit_padding,
            ));
        }
        if self.isolation.mask_padding < 0.0 {
            return Err(ConfigError::out_of_range(
                "isolation.mask_padding",
                self.isolation.mask_padding,
            ));
        }

        let zoom = &self.zoom;
        if zoom.min <= 0.0 || zoom.min > zoom.max {
            return Err(ConfigError::out_of_range(
                "zoom.min",
                format!("{} (max {})", zoom.min, zoom.max),
            ));
        }
        if zoom.step <= 0.0 {
            return Err(ConfigError::out_of_range("zoom.step", zoom.step));
        }

        Ok(())
    }

    pub fn coordinate_config(&self) -> CoordinateConfig {
        CoordinateConfig {
            rect_cache_ttl: Duration::from_millis(self.coordinates.rect_cache_ttl_ms),
            zoom: (&self.zoom).into(),
        }
    }

    /// Everything an annotator session needs.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            interaction: (&self.interaction).into(),
            history: (&self.history).into(),
            coordinates: self.coordinate_config(),
            isolation: (&self.isolation).into(),
            default_page: self.coordinates.default_page(),
            project_id: self.project.project_id,
        }
    }
}
