//! Logging
//!
//! `tracing` subscriber setup. Level, format and destination come from the
//! `[logging]` config section; `CASEBOOK_LOG*` environment variables take
//! precedence over it.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const ENV_FILTER: &str = "CASEBOOK_LOG";
const ENV_FORMAT: &str = "CASEBOOK_LOG_FORMAT";
const ENV_OUTPUT: &str = "CASEBOOK_LOG_OUTPUT";
const ENV_FILE: &str = "CASEBOOK_LOG_FILE";
const ENV_MODULES: &str = "CASEBOOK_LOG_MODULES";

const LOG_FILE_NAME: &str = "casebook.log";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// trace, debug, info, warn, error or off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// json or text
    #[serde(default = "default_format")]
    pub format: String,

    /// stdout, stderr, file, file+stderr or both
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file when the output includes a file; `None` uses the state directory.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// ANSI colors, text format on a terminal stream only
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-module levels, e.g. `casebook::tree = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "file".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ApiError::ConfigError(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

/// Output destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LogOutput {
    stdout: bool,
    stderr: bool,
    file: bool,
}

impl LogOutput {
    fn parse(value: &str) -> Result<Self, ApiError> {
        let (stdout, stderr, file) = match value {
            "stdout" => (true, false, false),
            "stderr" => (false, true, false),
            "file" => (false, false, true),
            "file+stderr" => (false, true, true),
            "both" => (true, true, false),
            other => {
                return Err(ApiError::ConfigError(format!(
                    "Invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                    other
                )))
            }
        };
        Ok(Self {
            stdout,
            stderr,
            file,
        })
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Log file path: `CASEBOOK_LOG_FILE`, then the configured file, then the
/// platform state directory.
pub fn resolve_log_file_path(config_file: Option<PathBuf>) -> Result<PathBuf, ApiError> {
    if let Some(path) = env_nonempty(ENV_FILE) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = config_file.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    default_log_file_path()
}

fn default_log_file_path() -> Result<PathBuf, ApiError> {
    let dirs = directories::ProjectDirs::from("", "casebook", "casebook").ok_or_else(|| {
        ApiError::ConfigError("Could not determine platform directories for log file".to_string())
    })?;
    let dir = dirs
        .state_dir()
        .unwrap_or_else(|| dirs.data_local_dir())
        .to_path_buf();
    Ok(dir.join(LOG_FILE_NAME))
}

fn open_log_file(path: &Path) -> Result<std::fs::File, ApiError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ApiError::ConfigError(format!("Failed to create log directory: {}", e)))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ApiError::ConfigError(format!("Failed to open log file {:?}: {}", path, e)))
}

fn make_writer(output: LogOutput, config: &LoggingConfig) -> Result<BoxMakeWriter, ApiError> {
    if output.file {
        let path = resolve_log_file_path(config.file.clone())?;
        let file = Mutex::new(open_log_file(&path)?);
        return Ok(if output.stderr {
            BoxMakeWriter::new(file.and(std::io::stderr))
        } else {
            BoxMakeWriter::new(file)
        });
    }
    Ok(match (output.stdout, output.stderr) {
        (true, true) => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        (false, true) => BoxMakeWriter::new(std::io::stderr),
        _ => BoxMakeWriter::new(std::io::stdout),
    })
}

/// Initialize the global subscriber.
///
/// Priority (highest first): `CASEBOOK_LOG*` environment variables, the
/// given config, defaults.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ApiError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);

    let registry = Registry::default();
    if !config.enabled {
        return registry
            .with(EnvFilter::new("off"))
            .try_init()
            .map_err(|e| ApiError::ConfigError(format!("Failed to initialize logging: {}", e)));
    }

    let filter = build_env_filter(config)?;
    let format =
        LogFormat::parse(&env_nonempty(ENV_FORMAT).unwrap_or_else(|| config.format.clone()))?;
    let output =
        LogOutput::parse(&env_nonempty(ENV_OUTPUT).unwrap_or_else(|| config.output.clone()))?;
    let ansi = config.color && format == LogFormat::Text && !output.file;

    let layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(ansi)
        .with_writer(make_writer(output, config)?);

    let result = match format {
        LogFormat::Json => registry.with(filter).with(layer.json()).try_init(),
        LogFormat::Text => registry.with(filter).with(layer).try_init(),
    };
    result.map_err(|e| ApiError::ConfigError(format!("Failed to initialize logging: {}", e)))
}

fn parse_directive(
    module: &str,
    level: &str,
) -> Result<tracing_subscriber::filter::Directive, ApiError> {
    format!("{}={}", module.trim(), level.trim())
        .parse()
        .map_err(|e| ApiError::ConfigError(format!("Invalid log directive: {}", e)))
}

/// `CASEBOOK_LOG` wins outright; otherwise the configured level plus module
/// directives from the config and `CASEBOOK_LOG_MODULES`.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_FILTER) {
        return Ok(filter);
    }
    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(&config.level);
    for (module, level) in &config.modules {
        filter = filter.add_directive(parse_directive(module, level)?);
    }
    if let Some(modules) = env_nonempty(ENV_MODULES) {
        for spec in modules.split(',') {
            if let Some((module, level)) = spec.split_once('=') {
                filter = filter.add_directive(parse_directive(module, level)?);
            }
        }
    }
    Ok(filter)
}
