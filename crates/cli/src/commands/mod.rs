pub mod config_cmd;
pub mod doctor;
pub mod peek;
pub mod serve;
pub mod status;

use ragchat_config::{AppConfig, ConfigError};
use std::path::Path;

/// Load from `path` when given, otherwise from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
}

/// The file the configuration is read from.
pub fn config_file(path: Option<&Path>) -> std::path::PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}
