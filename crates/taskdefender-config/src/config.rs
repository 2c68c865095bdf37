//! Validated configuration structures

use crate::schema::{RawConfig, RawStorageConfig, RawTimerConfig};
use std::path::PathBuf;
use std::time::Duration;
use taskdefender_util::default_data_dir;

/// Validated configuration ready for use by the store and controller
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub storage: StorageConfig,
    pub timers: TimerConfig,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            storage: StorageConfig::from_raw(raw.storage),
            timers: TimerConfig::from_raw(raw.timers),
        }
    }
}

/// Where and under which keys state is persisted
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub database: String,
    pub primary_key: String,
    pub backup_key: String,
}

impl StorageConfig {
    fn from_raw(raw: RawStorageConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            database: raw
                .database
                .unwrap_or_else(|| crate::DEFAULT_DATABASE.to_string()),
            primary_key: raw
                .primary_key
                .unwrap_or_else(|| crate::DEFAULT_PRIMARY_KEY.to_string()),
            backup_key: raw
                .backup_key
                .unwrap_or_else(|| crate::DEFAULT_BACKUP_KEY.to_string()),
        }
    }

    /// Full path of the database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::from_raw(RawStorageConfig::default())
    }
}

/// Timer tuning for idle detection, prompts and simulated interventions
#[derive(Debug, Clone, PartialEq)]
pub struct TimerConfig {
    pub idle_threshold: Duration,
    pub idle_check_interval: Duration,
    pub prompt_display: Duration,
    pub intervention_check_interval: Duration,
    pub intervention_probability: f64,
    pub deep_work_length: Duration,
}

impl TimerConfig {
    fn from_raw(raw: RawTimerConfig) -> Self {
        Self {
            idle_threshold: Duration::from_secs(raw.idle_threshold_seconds.unwrap_or(5 * 60)),
            idle_check_interval: Duration::from_secs(
                raw.idle_check_interval_seconds.unwrap_or(30),
            ),
            prompt_display: Duration::from_secs(raw.prompt_display_seconds.unwrap_or(10)),
            intervention_check_interval: Duration::from_secs(
                raw.intervention_check_interval_seconds.unwrap_or(5 * 60),
            ),
            intervention_probability: raw.intervention_probability.unwrap_or(0.1),
            deep_work_length: Duration::from_secs(
                u64::from(raw.deep_work_minutes.unwrap_or(60)) * 60,
            ),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::from_raw(RawTimerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_defaults() {
        let timers = TimerConfig::default();
        assert_eq!(timers.idle_threshold, Duration::from_secs(300));
        assert_eq!(timers.idle_check_interval, Duration::from_secs(30));
        assert_eq!(timers.prompt_display, Duration::from_secs(10));
        assert_eq!(timers.intervention_check_interval, Duration::from_secs(300));
        assert_eq!(timers.intervention_probability, 0.1);
        assert_eq!(timers.deep_work_length, Duration::from_secs(3600));
    }

    #[test]
    fn storage_defaults() {
        let storage = StorageConfig::from_raw(RawStorageConfig {
            data_dir: Some(PathBuf::from("/data")),
            ..Default::default()
        });
        assert_eq!(storage.primary_key, "taskdefender_app_state");
        assert_eq!(storage.backup_key, "taskdefender_backup");
        assert_eq!(storage.database_path(), PathBuf::from("/data/taskdefender.db"));
    }
}
