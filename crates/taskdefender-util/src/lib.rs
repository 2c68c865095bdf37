//! Shared utilities for taskdefender
//!
//! This crate provides:
//! - ID types (UserId, TaskId, SessionId, ...)
//! - Time utilities (wall clock with mock support, monotonic time, `HH:MM` parsing)
//! - Default paths for config and data directories

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
