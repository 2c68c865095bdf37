//! Entity and state types for taskdefender
//!
//! Field names serialize in camelCase and enum values in kebab-case so the
//! persisted blob keeps the layout the web client used
//! (`focusSessions`, `"in-progress"`, `"deep-work"`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use taskdefender_util::{
    CallId, DistractionId, NotificationId, PromptId, SessionId, TaskId, TeamId, TimeBlockId,
    Timestamp, UserId,
};
use thiserror::Error;

/// Error for an unknown enum name (e.g. `View::from_str("inbox")`)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! named_enum {
    ($name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Admin,
}

named_enum!(Role, "role" { User => "user", Admin => "admin" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkStyle {
    Focused,
    Flexible,
    Social,
    Independent,
}

named_enum!(WorkStyle, "work style" {
    Focused => "focused",
    Flexible => "flexible",
    Social => "social",
    Independent => "independent",
});

/// The single local user, created when onboarding completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Self-reported honesty percentage shown on the dashboard
    pub integrity_score: u32,
    /// Consecutive productive days
    pub streak: u32,
    pub work_style: WorkStyle,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// A freshly onboarded user: full integrity, no streak yet
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        work_style: WorkStyle,
        goals: Vec<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: UserId::generate(),
            name: name.into(),
            email: email.into(),
            role: Role::User,
            integrity_score: 100,
            streak: 0,
            work_style,
            goals,
            wallet_address: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Task priority. Ordered: `Low < Medium < High < Urgent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

named_enum!(Priority, "priority" {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

named_enum!(TaskStatus, "task status" {
    Todo => "todo",
    InProgress => "in-progress",
    Completed => "completed",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeBlockKind {
    Work,
    Break,
    Meeting,
    Personal,
}

named_enum!(TimeBlockKind, "time block type" {
    Work => "work",
    Break => "break",
    Meeting => "meeting",
    Personal => "personal",
});

/// A scheduled slot of time attached to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub id: TimeBlockId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(rename = "type")]
    pub kind: TimeBlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    /// Estimated effort in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
    /// Actual effort in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_time: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub time_blocks: Vec<TimeBlock>,
    /// Honesty check answer recorded at completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub honestly_completed: Option<bool>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub admin_id: UserId,
    pub invite_code: String,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Focus sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    Pomodoro,
    DeepWork,
    Break,
}

named_enum!(SessionKind, "session type" {
    Pomodoro => "pomodoro",
    DeepWork => "deep-work",
    Break => "break",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistractionKind {
    Notification,
    Website,
    App,
    Manual,
    Phone,
    SocialMedia,
    Thoughts,
    Custom,
}

named_enum!(DistractionKind, "distraction type" {
    Notification => "notification",
    Website => "website",
    App => "app",
    Manual => "manual",
    Phone => "phone",
    SocialMedia => "social-media",
    Thoughts => "thoughts",
    Custom => "custom",
});

/// A single interruption logged during a focus session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distraction {
    pub id: DistractionId,
    pub session_id: SessionId,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub kind: DistractionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Seconds lost, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    pub id: SessionId,
    pub user_id: UserId,
    /// Weak reference; deleting the task leaves the session untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub start_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    /// Whole seconds between start and end; zero while open
    pub duration: u64,
    #[serde(default)]
    pub distractions: Vec<Distraction>,
    pub completed: bool,
    #[serde(rename = "type")]
    pub kind: SessionKind,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Reminder,
    Deadline,
    Achievement,
    Team,
    Sarcastic,
}

named_enum!(NotificationKind, "notification type" {
    Reminder => "reminder",
    Deadline => "deadline",
    Achievement => "achievement",
    Team => "team",
    Sarcastic => "sarcastic",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

named_enum!(NotificationPriority, "notification priority" {
    Low => "low",
    Medium => "medium",
    High => "high",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub scheduled_for: Timestamp,
    pub sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<Timestamp>,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Prompts and simulated calls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Persona {
    DrillSergeant,
    DisappointedParent,
    #[default]
    SarcasticFriend,
    MotivationalCoach,
}

named_enum!(Persona, "persona" {
    DrillSergeant => "drill-sergeant",
    DisappointedParent => "disappointed-parent",
    SarcasticFriend => "sarcastic-friend",
    MotivationalCoach => "motivational-coach",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    Procrastination,
    Distraction,
    LowProductivity,
    MissedDeadline,
    Achievement,
}

named_enum!(Trigger, "trigger" {
    Procrastination => "procrastination",
    Distraction => "distraction",
    LowProductivity => "low-productivity",
    MissedDeadline => "missed-deadline",
    Achievement => "achievement",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptCategory {
    Motivation,
    Accountability,
    Celebration,
    Intervention,
}

named_enum!(PromptCategory, "prompt category" {
    Motivation => "motivation",
    Accountability => "accountability",
    Celebration => "celebration",
    Intervention => "intervention",
});

/// A canned motivational message picked for a persona and trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarcasticPrompt {
    pub id: PromptId,
    pub persona: Persona,
    pub trigger: Trigger,
    pub message: String,
    /// 1 (gentle) ..= 5 (harsh)
    pub intensity: u8,
    pub category: PromptCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallCharacter {
    Boss,
    Parent,
    Friend,
    Coach,
    Therapist,
}

named_enum!(CallCharacter, "call character" {
    Boss => "boss",
    Parent => "parent",
    Friend => "friend",
    Coach => "coach",
    Therapist => "therapist",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallResponse {
    Answered,
    Declined,
    Missed,
}

/// A simulated "intervention" phone call. Nothing is ever dialed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceCall {
    pub id: CallId,
    pub user_id: UserId,
    pub character: CallCharacter,
    pub trigger: String,
    pub script: String,
    pub duration: u64,
    pub scheduled_for: Timestamp,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_response: Option<CallResponse>,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

named_enum!(ThemePreference, "theme preference" {
    Light => "light",
    Dark => "dark",
    System => "system",
});

/// The theme actually in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

named_enum!(Theme, "theme" { Light => "light", Dark => "dark" });

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    Low,
    #[default]
    Medium,
    High,
}

named_enum!(Frequency, "frequency" { Low => "low", Medium => "medium", High => "high" });

/// Top-level navigation target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    #[default]
    Dashboard,
    Tasks,
    Focus,
    Calendar,
    Settings,
}

named_enum!(View, "view" {
    Dashboard => "dashboard",
    Tasks => "tasks",
    Focus => "focus",
    Calendar => "calendar",
    Settings => "settings",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuietHours {
    pub enabled: bool,
    /// `HH:MM`
    pub start: String,
    /// `HH:MM`
    pub end: String,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start: "22:00".into(),
            end: "08:00".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub enabled: bool,
    pub types: Vec<NotificationKind>,
    pub quiet_hours: QuietHours,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            types: vec![
                NotificationKind::Reminder,
                NotificationKind::Deadline,
                NotificationKind::Achievement,
            ],
            quiet_hours: QuietHours::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    pub external_monitoring: bool,
    pub data_sharing: bool,
    pub analytics: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            external_monitoring: false,
            data_sharing: false,
            analytics: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarcasmSettings {
    pub enabled: bool,
    /// 1..=5
    pub intensity: u8,
    pub persona: Persona,
    pub frequency: Frequency,
}

impl Default for SarcasmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 3,
            persona: Persona::SarcasticFriend,
            frequency: Frequency::Medium,
        }
    }
}

/// Focus timer lengths, in minutes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSettings {
    pub pomodoro_length: u32,
    pub short_break_length: u32,
    pub long_break_length: u32,
    pub auto_start_breaks: bool,
    pub auto_start_pomodoros: bool,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            pomodoro_length: 25,
            short_break_length: 5,
            long_break_length: 15,
            auto_start_breaks: false,
            auto_start_pomodoros: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub theme: ThemePreference,
    pub notifications: NotificationSettings,
    pub privacy: PrivacySettings,
    pub sarcasm: SarcasmSettings,
    pub focus: FocusSettings,
}

// ---------------------------------------------------------------------------
// State tree
// ---------------------------------------------------------------------------

/// The whole application state. This is exactly what gets persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub teams: Vec<Team>,
    /// Closed sessions, oldest first
    #[serde(default)]
    pub focus_sessions: Vec<FocusSession>,
    /// The single open session, if any
    #[serde(default)]
    pub active_session: Option<FocusSession>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub settings: AppSettings,
    #[serde(default = "default_onboarding")]
    pub is_onboarding: bool,
    #[serde(default)]
    pub current_theme: Theme,
    #[serde(default)]
    pub current_view: View,
}

fn default_onboarding() -> bool {
    true
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            user: None,
            tasks: Vec::new(),
            teams: Vec::new(),
            focus_sessions: Vec::new(),
            active_session: None,
            notifications: Vec::new(),
            settings: AppSettings::default(),
            is_onboarding: true,
            current_theme: Theme::Light,
            current_view: View::Dashboard,
        }
    }
}

impl AppState {
    /// Id of the current user, or the empty id before onboarding
    pub fn user_id(&self) -> UserId {
        self.user.as_ref().map(|u| u.id.clone()).unwrap_or_default()
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn notification(&self, id: &NotificationId) -> Option<&Notification> {
        self.notifications.iter().find(|n| &n.id == id)
    }

    /// Restore the single-open-session invariant on state written by
    /// clients that kept open sessions inside `focusSessions`.
    ///
    /// Unless a session is already active, the most recently started open
    /// entry becomes the active session. Any other open entry is closed with
    /// zero duration at its start time. Returns true if anything changed.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;

        if self.active_session.is_none() {
            let newest_open = self
                .focus_sessions
                .iter()
                .enumerate()
                .filter(|(_, s)| !s.completed)
                .max_by_key(|(_, s)| s.start_time)
                .map(|(idx, _)| idx);

            if let Some(idx) = newest_open {
                self.active_session = Some(self.focus_sessions.remove(idx));
                changed = true;
            }
        }

        for stale in self.focus_sessions.iter_mut().filter(|s| !s.completed) {
            stale.completed = true;
            stale.end_time = Some(stale.start_time);
            stale.duration = 0;
            changed = true;
        }

        changed
    }
}
