//! Configuration validation

use crate::schema::{RawConfig, RawStorageConfig, RawTimerConfig};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("storage.{field}: {message}")]
    StorageError { field: &'static str, message: String },

    #[error("timers.{field} must be greater than zero")]
    ZeroInterval { field: &'static str },

    #[error("timers.intervention_probability {0} is outside 0.0..=1.0")]
    ProbabilityOutOfRange(f64),

    #[error("storage keys must differ (both are '{0}')")]
    DuplicateStorageKey(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    errors.extend(validate_storage(&config.storage));
    errors.extend(validate_timers(&config.timers));
    errors
}

fn validate_storage(storage: &RawStorageConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("database", &storage.database),
        ("primary_key", &storage.primary_key),
        ("backup_key", &storage.backup_key),
    ] {
        if let Some(v) = value {
            if v.trim().is_empty() {
                errors.push(ValidationError::StorageError {
                    field,
                    message: "cannot be empty".into(),
                });
            }
        }
    }

    if let Some(db) = &storage.database {
        if db.contains('/') {
            errors.push(ValidationError::StorageError {
                field: "database",
                message: format!("'{}' must be a file name, not a path", db),
            });
        }
    }

    let primary = storage
        .primary_key
        .as_deref()
        .unwrap_or(crate::DEFAULT_PRIMARY_KEY);
    let backup = storage
        .backup_key
        .as_deref()
        .unwrap_or(crate::DEFAULT_BACKUP_KEY);
    if primary == backup {
        errors.push(ValidationError::DuplicateStorageKey(primary.to_string()));
    }

    errors
}

fn validate_timers(timers: &RawTimerConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("idle_threshold_seconds", timers.idle_threshold_seconds),
        ("idle_check_interval_seconds", timers.idle_check_interval_seconds),
        ("prompt_display_seconds", timers.prompt_display_seconds),
        (
            "intervention_check_interval_seconds",
            timers.intervention_check_interval_seconds,
        ),
        ("deep_work_minutes", timers.deep_work_minutes.map(u64::from)),
    ] {
        if value == Some(0) {
            errors.push(ValidationError::ZeroInterval { field });
        }
    }

    if let Some(p) = timers.intervention_probability {
        if !(0.0..=1.0).contains(&p) {
            errors.push(ValidationError::ProbabilityOutOfRange(p));
        }
    }

    errors
}
