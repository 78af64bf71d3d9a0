//! CLI Tooling
//!
//! Command-line interface over the local filesystem: import a case
//! directory, browse it, list cases and manage status tags. Every command
//! runs against one [`CaseSession`].

use crate::capability::LocalCapabilityProvider;
use crate::config::{CasebookConfig, ConfigLoader};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::permission::NegotiationState;
use crate::session::CaseSession;
use crate::store::{HandleStore, SledHandleStore};
use crate::tooling::format::{
    format_case_document_text, format_case_summaries_json, format_case_summaries_text,
    format_status_list_text, format_tree_text,
};
use crate::types::CaseStatus;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Casebook CLI - browse case folders and track case status
#[derive(Parser)]
#[command(name = "casebook")]
#[command(about = "Browse case folders and keep per-case status tags across sessions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (replaces the global config file)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold the logging flags into the configured logging section.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a case directory and remember it for later sessions
    Import {
        /// Directory to import
        dir: PathBuf,
    },
    /// Show the directory tree of the imported case directory
    Tree {
        /// Expand every directory
        #[arg(long)]
        expand_all: bool,
        /// Expand a directory by its tree path (repeatable)
        #[arg(long)]
        expand: Vec<String>,
    },
    /// List the case files found in the tree
    Cases {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Open a case file by name
    Open {
        /// Case file name, e.g. case-001.json
        file: String,
    },
    /// Case status tags
    Status {
        #[command(subcommand)]
        command: StatusCommands,
    },
    /// Create a case file for a directory
    New {
        /// Tree path of the directory (default: the root)
        #[arg(long)]
        dir: Option<String>,
    },
    /// Forget the imported case directory
    Clear,
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum StatusCommands {
    /// List every recorded status tag
    List,
    /// Show the status of one case file
    Get {
        file: String,
    },
    /// Set the status of a case file (none, waiting, completed, urgent)
    Set {
        file: String,
        status: String,
    },
}

/// CLI context: loaded configuration and the open handle store.
pub struct CliContext {
    config: CasebookConfig,
    store: Arc<dyn HandleStore>,
    interactive: bool,
}

impl CliContext {
    /// Load configuration and open the handle store.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load_with(config_path.as_deref())?;
        let store_path = config.storage.resolve_store_path()?;
        let store = SledHandleStore::open(&store_path)?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Context over an already open store. Permission prompts are only
    /// shown when stdin is a terminal.
    pub fn with_store(config: CasebookConfig, store: Arc<dyn HandleStore>) -> Self {
        Self {
            config,
            store,
            interactive: std::io::stdin().is_terminal(),
        }
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn config(&self) -> &CasebookConfig {
        &self.config
    }

    fn provider(&self) -> LocalCapabilityProvider {
        LocalCapabilityProvider::new()
            .with_confirm_on_restore(self.config.permission.confirm_on_restore)
            .with_interactive(self.interactive)
    }

    fn session(&self, provider: LocalCapabilityProvider) -> CaseSession<LocalCapabilityProvider> {
        CaseSession::new(
            Arc::new(provider),
            Arc::clone(&self.store),
            self.config.session_options(),
        )
    }

    /// Session over the persisted root, permission negotiated and scanned.
    async fn restored_session(&self) -> Result<CaseSession<LocalCapabilityProvider>, ApiError> {
        let mut session = self.session(self.provider());
        match session.restore().await? {
            NegotiationState::Granted => Ok(session),
            NegotiationState::Unloaded => Err(ApiError::NoRoot),
            _ => Err(ApiError::PermissionNotGranted),
        }
    }

    fn render_tree(session: &CaseSession<LocalCapabilityProvider>) -> Result<String, ApiError> {
        let snapshot = session.snapshot().ok_or(ApiError::NoRoot)?;
        let mut out = format_tree_text(snapshot.root(), session.tree_state(), session.statuses());
        let failures = session.last_scan_failures();
        if !failures.is_empty() {
            out.push_str(&format!("\n{} directories could not be read:\n", failures.len()));
            for failure in failures {
                out.push_str(&format!("  {}\n", failure));
            }
        }
        Ok(out)
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Import { dir } => {
                let mut session = self.session(self.provider().with_pick_target(dir));
                let node_count = session.import_folder().await?.root().node_count();
                info!(nodes = node_count, "Import complete");
                Self::render_tree(&session)
            }
            Commands::Tree { expand_all, expand } => {
                let mut session = self.restored_session().await?;
                if *expand_all {
                    session.expand_all();
                }
                for path in expand {
                    if !session.tree_state().is_expanded(path) {
                        session.toggle(path);
                    }
                }
                Self::render_tree(&session)
            }
            Commands::Cases { format } => {
                if format != "text" && format != "json" {
                    return Err(ApiError::ConfigError(format!(
                        "Invalid format: {} (must be 'text' or 'json')",
                        format
                    )));
                }
                let session = self.restored_session().await?;
                let report = session.summaries().await?;
                if format == "json" {
                    format_case_summaries_json(&report).map_err(|e| {
                        ApiError::ConfigError(format!("Failed to render cases: {}", e))
                    })
                } else {
                    Ok(format_case_summaries_text(&report))
                }
            }
            Commands::Open { file } => {
                let mut session = self.restored_session().await?;
                let document = session.open_case(file).await?;
                Ok(format_case_document_text(file, &document))
            }
            Commands::Status { command } => self.handle_status_command(command).await,
            Commands::New { dir } => {
                let mut session = self.restored_session().await?;
                if let Some(dir) = dir {
                    session.click_directory(dir)?;
                }
                let path = session.create_case_file().await?;
                Ok(format!("Created {}", path))
            }
            Commands::Clear => {
                let mut session = self.session(self.provider());
                session.clear_root()?;
                Ok("Forgot the imported case directory.".to_string())
            }
            Commands::Config => self.config.to_toml(),
        }
    }

    async fn handle_status_command(&self, command: &StatusCommands) -> Result<String, ApiError> {
        match command {
            StatusCommands::List => {
                let session = self.session(self.provider());
                Ok(format_status_list_text(session.statuses()))
            }
            StatusCommands::Get { file } => {
                let session = self.session(self.provider());
                Ok(format!("{}: {}", file, session.status_of(file)))
            }
            StatusCommands::Set { file, status } => {
                let status: CaseStatus = status.parse()?;
                let mut session = self.restored_session().await?;
                session.update_case_status(file, status.clone()).await?;
                Ok(format!("{}: {}", file, status))
            }
        }
    }
}
