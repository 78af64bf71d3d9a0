//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::CasebookConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the global file and the environment.
    pub fn load() -> Result<CasebookConfig, ApiError> {
        let config = MergeService::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file and the environment.
    pub fn load_from_file(path: &Path) -> Result<CasebookConfig, ApiError> {
        let config = MergeService::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// `load_from_file` when a path is given, `load` otherwise.
    pub fn load_with(path: Option<&Path>) -> Result<CasebookConfig, ApiError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }

    pub fn default() -> CasebookConfig {
        CasebookConfig::default()
    }
}
