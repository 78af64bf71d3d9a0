//! Environment variable source: CASEBOOK__SECTION__KEY

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "CASEBOOK";

/// Add the environment overlay. `__` separates the prefix and nested keys,
/// so `CASEBOOK__SCAN__SKIP_UNREADABLE=true` sets `scan.skip_unreadable`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
