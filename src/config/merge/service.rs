//! MergeService: stacks sources over the defaults and deserializes the result.

use crate::config::sources::{environment, global_file};
use crate::config::CasebookConfig;
use config::ConfigError;
use std::path::Path;

use super::merge_policy;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> global file -> environment (highest).
    pub fn load() -> Result<CasebookConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }

    /// Like [`MergeService::load`] with `path` in place of the global file.
    pub fn load_from_file(path: &Path) -> Result<CasebookConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_file(builder, path, true);
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }
}
