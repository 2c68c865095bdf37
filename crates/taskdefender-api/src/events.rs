//! Outcomes of dispatching an action

use serde::{Deserialize, Serialize};
use std::fmt;
use taskdefender_util::{DistractionId, NotificationId, SessionId, TaskId, TeamId};

use crate::{Theme, View};

/// What changed, emitted for every applied action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    StateLoaded,
    UserSet,
    UserUpdated,
    OnboardingCompleted,
    TaskAdded { task_id: TaskId },
    TaskUpdated { task_id: TaskId },
    TaskDeleted { task_id: TaskId },
    TaskCompleted { task_id: TaskId, honestly_completed: bool },
    TeamCreated { team_id: TeamId },
    TeamLeft { team_id: TeamId },
    FocusSessionStarted { session_id: SessionId },
    FocusSessionEnded { session_id: SessionId, duration_secs: u64 },
    DistractionAdded { session_id: SessionId, distraction_id: DistractionId },
    NotificationAdded { notification_id: NotificationId },
    NotificationRead { notification_id: NotificationId },
    NotificationsRead { count: usize },
    NotificationDismissed { notification_id: NotificationId },
    SettingsUpdated,
    ThemeToggled { theme: Theme },
    ViewChanged { view: View },
}

/// Kind of entity an action addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Task,
    Team,
    FocusSession,
    Notification,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Task => "task",
            EntityKind::Team => "team",
            EntityKind::FocusSession => "focus session",
            EntityKind::Notification => "notification",
        };
        f.write_str(name)
    }
}

/// Why an action left the state unchanged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IgnoreReason {
    /// No entity with this id (for sessions: no open session with this id)
    NotFound { kind: EntityKind, id: String },
    /// A user-scoped update arrived before onboarding created the user
    NoUser,
    /// A focus session is already open
    SessionAlreadyActive { session_id: SessionId },
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::NotFound { kind, id } => write!(f, "{} '{}' not found", kind, id),
            IgnoreReason::NoUser => f.write_str("no user exists yet"),
            IgnoreReason::SessionAlreadyActive { session_id } => {
                write!(f, "focus session '{}' is already open", session_id)
            }
        }
    }
}

/// Result of a dispatch. Actions never fail; they are either applied in
/// full or ignored with the state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Applied(StoreEvent),
    Ignored(IgnoreReason),
}

impl Dispatch {
    pub fn is_applied(&self) -> bool {
        matches!(self, Dispatch::Applied(_))
    }

    pub fn event(&self) -> Option<&StoreEvent> {
        match self {
            Dispatch::Applied(event) => Some(event),
            Dispatch::Ignored(_) => None,
        }
    }

    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        Dispatch::Ignored(IgnoreReason::NotFound {
            kind,
            id: id.to_string(),
        })
    }
}
