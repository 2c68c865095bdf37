//! Core state machine for taskdefender
//!
//! This crate is the heart of taskdefender, containing:
//! - The state store: one reducer applying every [`Action`](taskdefender_api::Action)
//! - Derived views over the state (selectors)
//! - Persona prompts and simulated intervention calls
//! - Tick-driven focus countdown, idle detection and intervention timers
//! - The controller tying store, persistence and timers together

mod controller;
mod events;
mod prompts;
pub mod selectors;
mod store;
mod timers;

pub use controller::*;
pub use events::*;
pub use prompts::*;
pub use store::*;
pub use timers::*;
