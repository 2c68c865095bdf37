//! State tree and action types for taskdefender
//!
//! This crate defines the stable data model shared by every other crate:
//! - Entity and state types (what gets persisted)
//! - Actions (the closed set of state mutations) and their patch payloads
//! - Store events and dispatch outcomes
//! - Export format versioning

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;

/// Version tag written into export envelopes
pub const EXPORT_FORMAT_VERSION: &str = "1.0.0";
