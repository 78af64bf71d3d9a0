//! Global config file source: `$XDG_CONFIG_HOME/casebook/config.toml`.

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Add the global config file when it exists. A missing `HOME` just skips it.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg::global_config_path() {
        Ok(path) => Ok(add_file(builder, &path, false)),
        Err(e) => {
            debug!(error = %e, "No global config location");
            Ok(builder)
        }
    }
}

/// Add a TOML file. `required` files must exist.
pub fn add_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> ConfigBuilder<DefaultState> {
    debug!(path = %path.display(), required, "Adding config file");
    builder.add_source(
        File::from(path)
            .format(FileFormat::Toml)
            .required(required),
    )
}
