//! Actions: the closed set of state mutations
//!
//! Every change to [`AppState`](crate::AppState) goes through one of these.
//! Payloads that create entities (`NewTask`, ...) carry only caller-supplied
//! fields; the reducer assigns ids, owner and timestamps.

use taskdefender_util::{NotificationId, SessionId, TaskId, TeamId, Timestamp};

use crate::{
    AppSettings, AppState, DistractionKind, FocusSettings, NotificationKind,
    NotificationPriority, NotificationSettings, Priority, PrivacySettings, Role, SarcasmSettings,
    SessionKind, Task, TaskStatus, ThemePreference, TimeBlock, User, View, WorkStyle,
};

/// All possible state mutations
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the whole tree (startup hydration, import)
    LoadState(Box<AppState>),

    // User
    SetUser(User),
    UpdateUser(UserPatch),
    CompleteOnboarding,

    // Tasks
    AddTask(NewTask),
    UpdateTask { id: TaskId, patch: TaskPatch },
    DeleteTask(TaskId),
    CompleteTask { id: TaskId, honestly_completed: bool },

    // Teams
    CreateTeam(NewTeam),
    LeaveTeam(TeamId),

    // Focus sessions
    StartFocusSession { task_id: Option<TaskId>, kind: SessionKind },
    EndFocusSession(SessionId),
    AddDistraction {
        session_id: SessionId,
        kind: DistractionKind,
        source: Option<String>,
    },

    // Notifications
    AddNotification(NewNotification),
    MarkNotificationRead(NotificationId),
    MarkAllNotificationsRead,
    DismissNotification(NotificationId),

    // Settings and navigation
    UpdateSettings(SettingsPatch),
    ToggleTheme,
    SetCurrentView(View),
}

impl Action {
    /// Stable name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::LoadState(_) => "load_state",
            Action::SetUser(_) => "set_user",
            Action::UpdateUser(_) => "update_user",
            Action::CompleteOnboarding => "complete_onboarding",
            Action::AddTask(_) => "add_task",
            Action::UpdateTask { .. } => "update_task",
            Action::DeleteTask(_) => "delete_task",
            Action::CompleteTask { .. } => "complete_task",
            Action::CreateTeam(_) => "create_team",
            Action::LeaveTeam(_) => "leave_team",
            Action::StartFocusSession { .. } => "start_focus_session",
            Action::EndFocusSession(_) => "end_focus_session",
            Action::AddDistraction { .. } => "add_distraction",
            Action::AddNotification(_) => "add_notification",
            Action::MarkNotificationRead(_) => "mark_notification_read",
            Action::MarkAllNotificationsRead => "mark_all_notifications_read",
            Action::DismissNotification(_) => "dismiss_notification",
            Action::UpdateSettings(_) => "update_settings",
            Action::ToggleTheme => "toggle_theme",
            Action::SetCurrentView(_) => "set_current_view",
        }
    }
}

/// Caller-supplied fields of a new task
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub team_id: Option<TeamId>,
    pub due_date: Option<Timestamp>,
    pub start_date: Option<Timestamp>,
    pub estimated_time: Option<u32>,
    pub tags: Vec<String>,
    pub time_blocks: Vec<TimeBlock>,
}

impl NewTask {
    /// A todo with medium priority and nothing else set
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::Medium,
            status: TaskStatus::Todo,
            team_id: None,
            due_date: None,
            start_date: None,
            estimated_time: None,
            tags: Vec::new(),
            time_blocks: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_due_date(mut self, due: Timestamp) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Caller-supplied fields of a new team
#[derive(Debug, Clone, PartialEq)]
pub struct NewTeam {
    pub name: String,
    pub description: Option<String>,
    /// Six uppercase alphanumerics, generated by the caller
    pub invite_code: String,
}

/// Caller-supplied fields of a new notification
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub scheduled_for: Timestamp,
}

/// Partial user update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub integrity_score: Option<u32>,
    pub streak: Option<u32>,
    pub work_style: Option<WorkStyle>,
    pub goals: Option<Vec<String>>,
    pub wallet_address: Option<Option<String>>,
}

impl UserPatch {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(score) = self.integrity_score {
            user.integrity_score = score;
        }
        if let Some(streak) = self.streak {
            user.streak = streak;
        }
        if let Some(work_style) = self.work_style {
            user.work_style = work_style;
        }
        if let Some(goals) = self.goals {
            user.goals = goals;
        }
        if let Some(wallet) = self.wallet_address {
            user.wallet_address = wallet;
        }
    }
}

/// Partial task update. `None` leaves the field untouched; for optional
/// fields `Some(None)` clears them. Id, owner and creation time are not
/// patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub team_id: Option<Option<TeamId>>,
    pub due_date: Option<Option<Timestamp>>,
    pub start_date: Option<Option<Timestamp>>,
    pub estimated_time: Option<Option<u32>>,
    pub actual_time: Option<Option<u32>>,
    pub tags: Option<Vec<String>>,
    pub time_blocks: Option<Vec<TimeBlock>>,
    pub honestly_completed: Option<Option<bool>>,
    pub completed_at: Option<Option<Timestamp>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(team_id) = self.team_id {
            task.team_id = team_id;
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
        if let Some(start) = self.start_date {
            task.start_date = start;
        }
        if let Some(estimate) = self.estimated_time {
            task.estimated_time = estimate;
        }
        if let Some(actual) = self.actual_time {
            task.actual_time = actual;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(blocks) = self.time_blocks {
            task.time_blocks = blocks;
        }
        if let Some(honest) = self.honestly_completed {
            task.honestly_completed = honest;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
    }
}

/// Shallow settings update: each present section replaces the existing one
/// wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub theme: Option<ThemePreference>,
    pub notifications: Option<NotificationSettings>,
    pub privacy: Option<PrivacySettings>,
    pub sarcasm: Option<SarcasmSettings>,
    pub focus: Option<FocusSettings>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.theme.is_none()
            && self.notifications.is_none()
            && self.privacy.is_none()
            && self.sarcasm.is_none()
            && self.focus.is_none()
    }

    pub fn apply(self, settings: &mut AppSettings) {
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
        if let Some(notifications) = self.notifications {
            settings.notifications = notifications;
        }
        if let Some(privacy) = self.privacy {
            settings.privacy = privacy;
        }
        if let Some(sarcasm) = self.sarcasm {
            settings.sarcasm = sarcasm;
        }
        if let Some(focus) = self.focus {
            settings.focus = focus;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use taskdefender_util::UserId;

    fn sample_task() -> Task {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
        Task {
            id: TaskId::new("t1"),
            user_id: UserId::new("u1"),
            team_id: None,
            title: "Draft".into(),
            description: Some("first pass".into()),
            priority: Priority::Low,
            status: TaskStatus::Todo,
            due_date: Some(now),
            start_date: None,
            estimated_time: None,
            actual_time: None,
            tags: vec![],
            time_blocks: vec![],
            honestly_completed: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn task_patch_only_touches_present_fields() {
        let mut task = sample_task();
        TaskPatch {
            priority: Some(Priority::Urgent),
            description: Some(None),
            ..Default::default()
        }
        .apply(&mut task);

        assert_eq!(task.priority, Priority::Urgent);
        assert_eq!(task.description, None);
        assert_eq!(task.title, "Draft");
        assert!(task.due_date.is_some());
    }

    #[test]
    fn settings_patch_replaces_whole_sections() {
        let mut settings = AppSettings::default();
        let focus = FocusSettings {
            pomodoro_length: 50,
            ..Default::default()
        };
        SettingsPatch {
            focus: Some(focus.clone()),
            ..Default::default()
        }
        .apply(&mut settings);

        assert_eq!(settings.focus, focus);
        assert_eq!(settings.sarcasm, SarcasmSettings::default());
    }

    #[test]
    fn new_task_builder() {
        let task = NewTask::new("Write report").with_priority(Priority::High);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.status, TaskStatus::Todo);
    }
}
