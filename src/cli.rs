//! Command-line inspector for annotation dumps.
//!
//! A dump is a JSON file holding one page of backend annotation records and
//! optionally the project tree:
//!
//! ```json
//! {
//!   "page_id": 1,
//!   "page_number": 1,
//!   "page": { "width": 612.0, "height": 792.0 },
//!   "annotations": [ { "id": 1, "annotation_type": "room", "x": 0.1, ... } ],
//!   "tree": [ { "id": 100, "name": "Kitchen", "type": "room" } ]
//! }
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use planmark_annotator::{
    AnnotationRecord, AnnotatorSession, MemoryBackend, PageDimensions, StaticSurface, TreeNode,
};
use planmark_core::{AnnotationId, PageId};
use planmark_settings::{Config, SettingsPersistence};

use crate::report;

#[derive(Debug, Parser)]
#[command(name = "planmark")]
#[command(about = "Inspect floor-plan annotation dumps")]
pub struct Cli {
    /// Config file (.toml or .json); defaults to the platform config directory
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the annotation forest of a dump.
    Tree {
        #[arg(value_name = "DUMP")]
        dump: PathBuf,
        /// Emit JSON instead of an indented outline
        #[arg(long)]
        json: bool,
    },
    /// Isolate an annotation and print what stays visible.
    Isolate {
        #[arg(value_name = "DUMP")]
        dump: PathBuf,
        /// Stable id of the annotation to focus
        #[arg(long)]
        id: u64,
    },
    /// Print the effective configuration as TOML.
    Config,
    /// Print version and build date.
    Version,
}

fn default_page_id() -> PageId {
    PageId(1)
}

fn default_page_number() -> u32 {
    1
}

/// One page of annotations plus the project tree.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectDump {
    #[serde(default = "default_page_id")]
    pub page_id: PageId,
    #[serde(default = "default_page_number")]
    pub page_number: u32,
    #[serde(default)]
    pub page: Option<PageDimensions>,
    pub annotations: Vec<AnnotationRecord>,
    #[serde(default)]
    pub tree: Vec<TreeNode>,
}

impl ProjectDump {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("invalid dump {}", path.display()))
    }

    /// Opens a session over the dump, laid out at one pixel per point.
    pub async fn open(self, config: &Config) -> Result<AnnotatorSession> {
        let session_config = config.session_config();
        let page = self
            .page
            .filter(PageDimensions::is_valid)
            .unwrap_or(session_config.default_page);

        let backend = Arc::new(
            MemoryBackend::new()
                .with_page(self.page_id, self.annotations)
                .with_tree(self.tree),
        );
        let mut session = AnnotatorSession::new(session_config, backend.clone(), backend);
        session.attach_surface(Arc::new(StaticSurface::new(page.width, page.height)));
        session
            .load_page(self.page_id, self.page_number, Some(page))
            .await?;
        session.refresh_tree().await?;
        Ok(session)
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => match SettingsPersistence::load_default() {
            Ok(settings) => Ok(settings.config().clone()),
            Err(err) => {
                tracing::warn!("Using default config: {}", err);
                Ok(Config::default())
            }
        },
    }
}

/// Parses `args` and runs the command, printing its output.
pub async fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let output = execute(cli).await?;
    print!("{}", output);
    Ok(())
}

/// Runs a parsed command and returns what it would print.
pub async fn execute(cli: Cli) -> Result<String> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Tree { dump, json } => {
            let session = ProjectDump::load(&dump)?.open(&config).await?;
            if json {
                let entries = report::forest_entries(&session);
                Ok(format!("{}\n", serde_json::to_string_pretty(&entries)?))
            } else {
                Ok(report::render_forest(&session))
            }
        }
        Commands::Isolate { dump, id } => {
            let mut session = ProjectDump::load(&dump)?.open(&config).await?;
            session
                .enter_isolation(AnnotationId::Stable(id))
                .await
                .with_context(|| format!("cannot isolate annotation {}", id))?;
            Ok(report::render_visible(&session))
        }
        Commands::Config => Ok(toml::to_string_pretty(&config)?),
        Commands::Version => Ok(format!(
            "planmark {} (built {})\n",
            crate::VERSION,
            crate::BUILD_DATE
        )),
    }
}
