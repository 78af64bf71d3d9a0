//! Built-in defaults: the lowest layer of every merge.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};

/// Builder seeded with the default value of every scalar setting.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("scan.skip_unreadable", false)?
        .set_default("cases.max_concurrent_reads", 8_i64)?
        .set_default("permission.confirm_on_restore", true)?
        .set_default("logging.enabled", true)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "file")?
        .set_default("logging.color", true)
}
