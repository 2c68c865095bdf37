//! The state store: a single reducer over [`AppState`]

use taskdefender_api::{
    Action, AppState, Dispatch, Distraction, EntityKind, FocusSession, IgnoreReason,
    Notification, StoreEvent, Task, TaskStatus, Team,
};
use taskdefender_util::{
    whole_seconds_between, DistractionId, NotificationId, SessionId, TaskId, TeamId, Timestamp,
};
use tracing::{debug, info};

/// Owns the state tree. Every mutation goes through [`AppStore::dispatch`].
#[derive(Debug, Clone, Default)]
pub struct AppStore {
    state: AppState,
    revision: u64,
}

impl AppStore {
    pub fn new(mut state: AppState) -> Self {
        state.normalize();
        Self { state, revision: 0 }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Number of applied actions since creation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply one action. Either the whole action takes effect or nothing
    /// changes; the outcome says which.
    pub fn dispatch(&mut self, action: Action, now: Timestamp) -> Dispatch {
        let name = action.name();
        let outcome = self.reduce(action, now);

        match &outcome {
            Dispatch::Applied(event) => {
                self.revision += 1;
                debug!(action = name, revision = self.revision, event = ?event, "Action applied");
            }
            Dispatch::Ignored(reason) => {
                debug!(action = name, reason = %reason, "Action ignored");
            }
        }

        outcome
    }

    fn reduce(&mut self, action: Action, now: Timestamp) -> Dispatch {
        let state = &mut self.state;

        match action {
            Action::LoadState(loaded) => {
                let mut loaded = *loaded;
                if loaded.normalize() {
                    debug!("Open session moved out of focus history");
                }
                *state = loaded;
                info!(tasks = state.tasks.len(), "State loaded");
                Dispatch::Applied(StoreEvent::StateLoaded)
            }

            Action::SetUser(user) => {
                state.user = Some(user);
                Dispatch::Applied(StoreEvent::UserSet)
            }

            Action::UpdateUser(patch) => {
                let Some(user) = state.user.as_mut() else {
                    return Dispatch::Ignored(IgnoreReason::NoUser);
                };
                patch.apply(user);
                user.updated_at = now;
                Dispatch::Applied(StoreEvent::UserUpdated)
            }

            Action::CompleteOnboarding => {
                state.is_onboarding = false;
                Dispatch::Applied(StoreEvent::OnboardingCompleted)
            }

            Action::AddTask(new) => {
                let task = Task {
                    id: TaskId::generate(),
                    user_id: state.user_id(),
                    team_id: new.team_id,
                    title: new.title,
                    description: new.description,
                    priority: new.priority,
                    status: new.status,
                    due_date: new.due_date,
                    start_date: new.start_date,
                    estimated_time: new.estimated_time,
                    actual_time: None,
                    tags: new.tags,
                    time_blocks: new.time_blocks,
                    honestly_completed: None,
                    created_at: now,
                    updated_at: now,
                    completed_at: None,
                };
                let task_id = task.id.clone();
                state.tasks.push(task);
                Dispatch::Applied(StoreEvent::TaskAdded { task_id })
            }

            Action::UpdateTask { id, patch } => {
                let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
                    return Dispatch::not_found(EntityKind::Task, &id);
                };
                patch.apply(task);
                task.updated_at = now;
                Dispatch::Applied(StoreEvent::TaskUpdated { task_id: id })
            }

            Action::DeleteTask(id) => {
                let Some(idx) = state.tasks.iter().position(|t| t.id == id) else {
                    return Dispatch::not_found(EntityKind::Task, &id);
                };
                state.tasks.remove(idx);
                Dispatch::Applied(StoreEvent::TaskDeleted { task_id: id })
            }

            Action::CompleteTask {
                id,
                honestly_completed,
            } => {
                let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
                    return Dispatch::not_found(EntityKind::Task, &id);
                };
                task.status = TaskStatus::Completed;
                task.honestly_completed = Some(honestly_completed);
                task.completed_at = Some(now);
                task.updated_at = now;
                info!(task_id = %id, honestly_completed, "Task completed");
                Dispatch::Applied(StoreEvent::TaskCompleted {
                    task_id: id,
                    honestly_completed,
                })
            }

            Action::CreateTeam(new) => {
                let team = Team {
                    id: TeamId::generate(),
                    name: new.name,
                    description: new.description,
                    admin_id: state.user_id(),
                    invite_code: new.invite_code,
                    created_at: now,
                };
                let team_id = team.id.clone();
                state.teams.push(team);
                Dispatch::Applied(StoreEvent::TeamCreated { team_id })
            }

            Action::LeaveTeam(id) => {
                let Some(idx) = state.teams.iter().position(|t| t.id == id) else {
                    return Dispatch::not_found(EntityKind::Team, &id);
                };
                state.teams.remove(idx);
                Dispatch::Applied(StoreEvent::TeamLeft { team_id: id })
            }

            Action::StartFocusSession { task_id, kind } => {
                if let Some(open) = &state.active_session {
                    return Dispatch::Ignored(IgnoreReason::SessionAlreadyActive {
                        session_id: open.id.clone(),
                    });
                }
                let session = FocusSession {
                    id: SessionId::generate(),
                    user_id: state.user_id(),
                    task_id,
                    start_time: now,
                    end_time: None,
                    duration: 0,
                    distractions: Vec::new(),
                    completed: false,
                    kind,
                };
                let session_id = session.id.clone();
                info!(session_id = %session_id, kind = %kind, "Focus session started");
                state.active_session = Some(session);
                Dispatch::Applied(StoreEvent::FocusSessionStarted { session_id })
            }

            Action::EndFocusSession(id) => {
                let Some(mut session) = state.active_session.take_if(|s| s.id == id) else {
                    return Dispatch::not_found(EntityKind::FocusSession, &id);
                };
                session.duration = whole_seconds_between(session.start_time, now);
                session.end_time = Some(now);
                session.completed = true;
                let duration_secs = session.duration;
                info!(
                    session_id = %id,
                    duration_secs,
                    distractions = session.distractions.len(),
                    "Focus session ended"
                );
                state.focus_sessions.push(session);
                Dispatch::Applied(StoreEvent::FocusSessionEnded {
                    session_id: id,
                    duration_secs,
                })
            }

            Action::AddDistraction {
                session_id,
                kind,
                source,
            } => {
                let Some(session) = state
                    .active_session
                    .as_mut()
                    .filter(|s| s.id == session_id)
                else {
                    return Dispatch::not_found(EntityKind::FocusSession, &session_id);
                };
                let distraction = Distraction {
                    id: DistractionId::generate(),
                    session_id: session_id.clone(),
                    timestamp: now,
                    kind,
                    source,
                    duration: None,
                };
                let distraction_id = distraction.id.clone();
                session.distractions.push(distraction);
                Dispatch::Applied(StoreEvent::DistractionAdded {
                    session_id,
                    distraction_id,
                })
            }

            Action::AddNotification(new) => {
                let notification = Notification {
                    id: NotificationId::generate(),
                    user_id: state.user_id(),
                    kind: new.kind,
                    title: new.title,
                    message: new.message,
                    priority: new.priority,
                    scheduled_for: new.scheduled_for,
                    sent: false,
                    sent_at: None,
                    read: false,
                    read_at: None,
                };
                let notification_id = notification.id.clone();
                state.notifications.push(notification);
                Dispatch::Applied(StoreEvent::NotificationAdded { notification_id })
            }

            Action::MarkNotificationRead(id) => {
                let Some(notification) = state.notifications.iter_mut().find(|n| n.id == id)
                else {
                    return Dispatch::not_found(EntityKind::Notification, &id);
                };
                notification.read = true;
                notification.read_at = Some(now);
                Dispatch::Applied(StoreEvent::NotificationRead {
                    notification_id: id,
                })
            }

            Action::MarkAllNotificationsRead => {
                let mut count = 0;
                for notification in state.notifications.iter_mut().filter(|n| !n.read) {
                    notification.read = true;
                    notification.read_at = Some(now);
                    count += 1;
                }
                Dispatch::Applied(StoreEvent::NotificationsRead { count })
            }

            Action::DismissNotification(id) => {
                let Some(idx) = state.notifications.iter().position(|n| n.id == id) else {
                    return Dispatch::not_found(EntityKind::Notification, &id);
                };
                state.notifications.remove(idx);
                Dispatch::Applied(StoreEvent::NotificationDismissed {
                    notification_id: id,
                })
            }

            Action::UpdateSettings(patch) => {
                patch.apply(&mut state.settings);
                Dispatch::Applied(StoreEvent::SettingsUpdated)
            }

            Action::ToggleTheme => {
                state.current_theme = state.current_theme.toggled();
                Dispatch::Applied(StoreEvent::ThemeToggled {
                    theme: state.current_theme,
                })
            }

            Action::SetCurrentView(view) => {
                state.current_view = view;
                Dispatch::Applied(StoreEvent::ViewChanged { view })
            }
        }
    }
}
