//! Configuration
//!
//! Layered with the `config` crate: built-in defaults, the global
//! `config.toml` (or an explicit file), then `CASEBOOK__SECTION__KEY`
//! environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod storage_paths;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use storage_paths::StorageConfig;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::session::SessionOptions;
use crate::tree::ScanErrorPolicy;
use serde::{Deserialize, Serialize};

/// Scanner settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Leave unreadable subdirectories out instead of failing the scan.
    #[serde(default)]
    pub skip_unreadable: bool,
}

impl ScanConfig {
    pub fn policy(&self) -> ScanErrorPolicy {
        if self.skip_unreadable {
            ScanErrorPolicy::Skip
        } else {
            ScanErrorPolicy::Fail
        }
    }
}

fn default_max_concurrent_reads() -> usize {
    8
}

/// Case aggregation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasesConfig {
    #[serde(default = "default_max_concurrent_reads")]
    pub max_concurrent_reads: usize,
}

impl Default for CasesConfig {
    fn default() -> Self {
        Self {
            max_concurrent_reads: default_max_concurrent_reads(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Permission settings for the local filesystem provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// Ask before re-opening the persisted directory.
    #[serde(default = "default_true")]
    pub confirm_on_restore: bool,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            confirm_on_restore: true,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CasebookConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub cases: CasesConfig,

    #[serde(default)]
    pub permission: PermissionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CasebookConfig {
    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.cases.max_concurrent_reads == 0 {
            return Err(ApiError::ConfigError(
                "cases.max_concurrent_reads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            scan_policy: self.scan.policy(),
            max_concurrent_reads: self.cases.max_concurrent_reads.max(1),
        }
    }

    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}
