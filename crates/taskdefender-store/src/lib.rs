//! Persistence layer for taskdefender
//!
//! Provides:
//! - Local key-value storage (SQLite file or in-memory)
//! - Whole-state snapshots with a backup copy
//! - Versioned JSON export and import

mod memory;
mod persistence;
mod sqlite;
mod traits;

pub use memory::*;
pub use persistence::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to save state: {0}")]
    Write(String),

    #[error("Failed to load state: {0}")]
    Read(String),

    #[error("Invalid import data format: {0}")]
    ImportFormat(String),

    #[error("No data to export")]
    NothingToExport,

    #[error("Storage quota exceeded ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
