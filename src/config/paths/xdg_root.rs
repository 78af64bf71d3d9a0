//! XDG Base Directory locations for casebook data and config.

use crate::error::ApiError;
use std::path::PathBuf;

const APP_DIR: &str = "casebook";

/// `$XDG_DATA_HOME`, or `$HOME/.local/share`.
pub fn data_home() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("share"))
}

/// `$XDG_CONFIG_HOME`, or `$HOME/.config`.
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var_os("HOME").ok_or_else(|| {
        ApiError::ConfigError(
            "Could not determine XDG config home directory (HOME not set)".to_string(),
        )
    })?;
    Ok(PathBuf::from(home).join(".config"))
}

/// `$XDG_DATA_HOME/casebook`
pub fn casebook_data_dir() -> Result<PathBuf, ApiError> {
    data_home().map(|dir| dir.join(APP_DIR)).ok_or_else(|| {
        ApiError::ConfigError(
            "Could not determine XDG data home directory (HOME not set)".to_string(),
        )
    })
}

/// `$XDG_CONFIG_HOME/casebook/config.toml`
pub fn global_config_path() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join(APP_DIR).join("config.toml"))
}
