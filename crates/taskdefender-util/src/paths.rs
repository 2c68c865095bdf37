//! Default paths for taskdefender
//!
//! Paths are user-writable, following the XDG base directory layout:
//! - Config: `$XDG_CONFIG_HOME/taskdefender/config.toml` or `~/.config/taskdefender/config.toml`
//! - Data: `$XDG_DATA_HOME/taskdefender` or `~/.local/share/taskdefender`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const TASKDEFENDER_CONFIG_ENV: &str = "TASKDEFENDER_CONFIG";

/// Environment variable for overriding the data directory
pub const TASKDEFENDER_DATA_DIR_ENV: &str = "TASKDEFENDER_DATA_DIR";

/// Application subdirectory name
const APP_DIR: &str = "taskdefender";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$TASKDEFENDER_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/taskdefender/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/taskdefender/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(TASKDEFENDER_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/tmp").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$TASKDEFENDER_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/taskdefender` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/taskdefender` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(TASKDEFENDER_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking TASKDEFENDER_DATA_DIR.
/// Used for default values in configs where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}
