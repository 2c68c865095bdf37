//! Strongly-typed identifiers for taskdefender
//!
//! All ids are opaque strings. Freshly generated ids are UUID v4, but any
//! string is accepted on load so that state written by older clients (which
//! use an empty user id before onboarding) still parses.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random id
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of the (single) local user. Empty until onboarding completes.
    UserId
);

string_id!(
    /// Unique identifier for a task
    TaskId
);

string_id!(
    /// Unique identifier for a team
    TeamId
);

string_id!(
    /// Unique identifier for a focus session
    SessionId
);

string_id!(
    /// Unique identifier for a distraction record
    DistractionId
);

string_id!(
    /// Unique identifier for a notification
    NotificationId
);

string_id!(
    /// Unique identifier for a time block inside a task
    TimeBlockId
);

string_id!(
    /// Unique identifier for a generated prompt
    PromptId
);

string_id!(
    /// Unique identifier for a simulated call
    CallId
);
