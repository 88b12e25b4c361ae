//! # Planmark
//!
//! Hierarchical annotation of floor-plan drawings. Rooms, room locations,
//! cabinet runs and cabinets are drawn as rectangles over paginated PDF
//! pages and linked to the entities they stand for.
//!
//! ## Architecture
//!
//! Planmark is organized as a workspace with multiple crates:
//!
//! 1. **planmark-core** - Ids, error types and the event bus
//! 2. **planmark-annotator** - Coordinate mapping, the annotation store,
//!    isolation, gestures, history and persistence backends
//! 3. **planmark-settings** - Configuration files and validation
//! 4. **planmark** - Command-line inspector that integrates all crates
//!
//! ## Features
//!
//! - **Resolution-independent geometry**: normalized page coordinates with
//!   PDF-point and layout-pixel views
//! - **Isolation mode**: focus on one room, location or cabinet run
//! - **Safe gestures**: a cooperative lockout keeps saves and refreshes from
//!   clobbering an active resize or move
//! - **Undo/redo**: bounded snapshot history

pub mod cli;
pub mod report;

pub use planmark_annotator as annotator;
pub use planmark_settings as settings;

pub use planmark_core::{
    AnnotationId, EntityId, Error, EventBus, PageId, Result, StatusLevel, ValidationError,
};

pub use planmark_annotator::{
    Annotation, AnnotationType, AnnotatorSession, MemoryBackend, SessionConfig, StaticSurface,
};

pub use planmark_settings::{Config, SettingsPersistence};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr, keeping stdout for command output
/// - RUST_LOG environment variable support
/// - INFO as the default level
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
