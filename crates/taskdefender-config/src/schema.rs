//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Where state is persisted
    #[serde(default)]
    pub storage: RawStorageConfig,

    /// Ephemeral timer tuning
    #[serde(default)]
    pub timers: RawTimerConfig,
}

/// Storage settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStorageConfig {
    /// Data directory (default: ~/.local/share/taskdefender)
    pub data_dir: Option<PathBuf>,

    /// Database file name inside the data directory
    pub database: Option<String>,

    /// Key holding the current state blob
    pub primary_key: Option<String>,

    /// Key holding the backup copy
    pub backup_key: Option<String>,
}

/// Timer settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTimerConfig {
    /// Inactivity before a procrastination prompt is shown
    pub idle_threshold_seconds: Option<u64>,

    /// How often idleness is checked
    pub idle_check_interval_seconds: Option<u64>,

    /// How long a prompt stays up before it is dismissed automatically
    pub prompt_display_seconds: Option<u64>,

    /// How often the intervention simulator rolls the dice
    pub intervention_check_interval_seconds: Option<u64>,

    /// Chance (0.0 - 1.0) of an intervention per check
    pub intervention_probability: Option<f64>,

    /// Length of a deep-work session in minutes
    pub deep_work_minutes: Option<u32>,
}
