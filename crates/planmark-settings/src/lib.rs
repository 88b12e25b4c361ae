//! Planmark Settings Crate
//!
//! Handles annotator configuration: loading, validation, persistence and
//! conversion into the runtime configs of `planmark-annotator`.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{
    Config, CoordinateSettings, HistorySettings, InteractionSettings, IsolationSettings,
    ProjectSettings, ZoomSettings,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
pub use persistence::SettingsPersistence;
