//! Derived views over the state tree. Nothing here mutates.

use chrono::{NaiveDate, TimeZone};
use std::cmp::Reverse;
use std::collections::HashMap;
use taskdefender_api::{AppState, Notification, NotificationSettings, Task, TaskStatus};
use taskdefender_util::{Timestamp, WallClock};

/// Tasks bucketed by status, keeping list order within each bucket
pub fn tasks_by_status(tasks: &[Task]) -> HashMap<TaskStatus, Vec<&Task>> {
    let mut groups: HashMap<TaskStatus, Vec<&Task>> = HashMap::new();
    for task in tasks {
        groups.entry(task.status).or_default().push(task);
    }
    groups
}

/// Task list filter. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    /// Case-insensitive match against title or description
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let query = query.to_lowercase();
                task.title.to_lowercase().contains(&query)
                    || task
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&query))
            }
        }
    }
}

pub fn filter_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

/// Most urgent first, then earliest due date; undated tasks last
pub fn sort_by_priority(tasks: &mut [&Task]) {
    tasks.sort_by_key(|t| (Reverse(t.priority), t.due_date.is_none(), t.due_date));
}

/// Tasks whose due date falls on `day` in timezone `tz`
pub fn tasks_due_on<'a, Tz: TimeZone>(tasks: &'a [Task], day: NaiveDate, tz: &Tz) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| {
            t.due_date
                .is_some_and(|due| due.with_timezone(tz).date_naive() == day)
        })
        .collect()
}

/// Unfinished tasks due at or after `from`, soonest first
pub fn upcoming_tasks(tasks: &[Task], from: Timestamp) -> Vec<&Task> {
    let mut upcoming: Vec<&Task> = tasks
        .iter()
        .filter(|t| !t.is_completed() && t.due_date.is_some_and(|due| due >= from))
        .collect();
    upcoming.sort_by_key(|t| t.due_date);
    upcoming
}

/// Completion progress over the tasks due on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayProgress {
    pub completed: usize,
    pub total: usize,
}

impl DayProgress {
    pub fn percent(&self) -> u32 {
        (self.completed * 100 / self.total.max(1)) as u32
    }
}

pub fn day_progress<Tz: TimeZone>(tasks: &[Task], day: NaiveDate, tz: &Tz) -> DayProgress {
    let due = tasks_due_on(tasks, day, tz);
    DayProgress {
        completed: due.iter().filter(|t| t.is_completed()).count(),
        total: due.len(),
    }
}

/// Totals over closed focus sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusStats {
    pub sessions: usize,
    pub total_secs: u64,
    pub average_secs: u64,
    pub distractions: usize,
}

pub fn focus_stats(state: &AppState) -> FocusStats {
    let closed: Vec<_> = state.focus_sessions.iter().filter(|s| s.completed).collect();
    let total_secs: u64 = closed.iter().map(|s| s.duration).sum();

    FocusStats {
        sessions: closed.len(),
        total_secs,
        average_secs: if closed.is_empty() {
            0
        } else {
            total_secs / closed.len() as u64
        },
        distractions: closed.iter().map(|s| s.distractions.len()).sum(),
    }
}

/// Percentage of completed tasks whose honesty check came back true.
/// 100 when nothing has been completed yet.
pub fn integrity_score(tasks: &[Task]) -> u32 {
    let answered: Vec<bool> = tasks
        .iter()
        .filter(|t| t.is_completed())
        .filter_map(|t| t.honestly_completed)
        .collect();

    if answered.is_empty() {
        return 100;
    }
    let honest = answered.iter().filter(|h| **h).count();
    (honest * 100 / answered.len()) as u32
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}

/// Whether `at` falls inside the configured quiet hours. Disabled or
/// unparseable windows never match.
pub fn in_quiet_hours(settings: &NotificationSettings, at: WallClock) -> bool {
    let quiet = &settings.quiet_hours;
    if !quiet.enabled {
        return false;
    }

    match (quiet.start.parse::<WallClock>(), quiet.end.parse::<WallClock>()) {
        (Ok(start), Ok(end)) => WallClock::window_contains(start, end, at),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use taskdefender_api::{
        Distraction, DistractionKind, FocusSession, NotificationKind, NotificationPriority,
        Priority, QuietHours, SessionKind,
    };
    use taskdefender_util::{DistractionId, NotificationId, SessionId, TaskId, UserId};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 9, 15, 12, 0, 0).unwrap()
    }

    fn task(id: &str, priority: Priority, status: TaskStatus, due: Option<Timestamp>) -> Task {
        Task {
            id: TaskId::new(id),
            user_id: UserId::new("u"),
            team_id: None,
            title: format!("Task {id}"),
            description: None,
            priority,
            status,
            due_date: due,
            start_date: None,
            estimated_time: None,
            actual_time: None,
            tags: vec![],
            time_blocks: vec![],
            honestly_completed: None,
            created_at: t0(),
            updated_at: t0(),
            completed_at: None,
        }
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn group_by_status() {
        let tasks = vec![
            task("a", Priority::Low, TaskStatus::Todo, None),
            task("b", Priority::Low, TaskStatus::Completed, None),
            task("c", Priority::Low, TaskStatus::Todo, None),
        ];
        let groups = tasks_by_status(&tasks);
        assert_eq!(ids(&groups[&TaskStatus::Todo]), ["a", "c"]);
        assert_eq!(groups[&TaskStatus::Completed].len(), 1);
        assert!(!groups.contains_key(&TaskStatus::InProgress));
    }

    #[test]
    fn search_and_status_filter() {
        let mut tasks = vec![
            task("a", Priority::Low, TaskStatus::Todo, None),
            task("b", Priority::Low, TaskStatus::Completed, None),
        ];
        tasks[0].title = "Write REPORT".into();
        tasks[1].description = Some("report appendix".into());

        let search = TaskFilter {
            search: Some("report".into()),
            ..Default::default()
        };
        assert_eq!(filter_tasks(&tasks, &search).len(), 2);

        let todo_only = TaskFilter {
            status: Some(TaskStatus::Todo),
            search: Some("report".into()),
        };
        assert_eq!(ids(&filter_tasks(&tasks, &todo_only)), ["a"]);

        assert_eq!(filter_tasks(&tasks, &TaskFilter::default()).len(), 2);
    }

    #[test]
    fn priority_sort() {
        let tasks = vec![
            task("low", Priority::Low, TaskStatus::Todo, Some(t0())),
            task("urgent-late", Priority::Urgent, TaskStatus::Todo, Some(t0() + Duration::days(2))),
            task("urgent-undated", Priority::Urgent, TaskStatus::Todo, None),
            task("urgent-soon", Priority::Urgent, TaskStatus::Todo, Some(t0())),
            task("high", Priority::High, TaskStatus::Todo, None),
        ];
        let mut refs: Vec<&Task> = tasks.iter().collect();
        sort_by_priority(&mut refs);
        assert_eq!(
            ids(&refs),
            ["urgent-soon", "urgent-late", "urgent-undated", "high", "low"]
        );
    }

    #[test]
    fn due_on_day_and_progress() {
        let day = t0().date_naive();
        let tasks = vec![
            task("a", Priority::Low, TaskStatus::Completed, Some(t0())),
            task("b", Priority::Low, TaskStatus::Todo, Some(t0() + Duration::hours(3))),
            task("c", Priority::Low, TaskStatus::Todo, Some(t0() + Duration::days(1))),
            task("d", Priority::Low, TaskStatus::Todo, None),
        ];

        assert_eq!(ids(&tasks_due_on(&tasks, day, &Utc)), ["a", "b"]);
        let progress = day_progress(&tasks, day, &Utc);
        assert_eq!(progress, DayProgress { completed: 1, total: 2 });
        assert_eq!(progress.percent(), 50);

        let empty = day_progress(&[], day, &Utc);
        assert_eq!(empty.percent(), 0);
    }

    #[test]
    fn upcoming_sorted_and_unfinished() {
        let tasks = vec![
            task("later", Priority::Low, TaskStatus::Todo, Some(t0() + Duration::days(3))),
            task("done", Priority::Low, TaskStatus::Completed, Some(t0() + Duration::days(1))),
            task("past", Priority::Low, TaskStatus::Todo, Some(t0() - Duration::days(1))),
            task("soon", Priority::Low, TaskStatus::InProgress, Some(t0() + Duration::hours(1))),
        ];
        assert_eq!(ids(&upcoming_tasks(&tasks, t0())), ["soon", "later"]);
    }

    #[test]
    fn focus_statistics() {
        let mut state = AppState::default();
        for (i, duration) in [1500u64, 900, 600].into_iter().enumerate() {
            let id = SessionId::new(format!("s{i}"));
            state.focus_sessions.push(FocusSession {
                id: id.clone(),
                user_id: UserId::default(),
                task_id: None,
                start_time: t0(),
                end_time: Some(t0()),
                duration,
                distractions: vec![Distraction {
                    id: DistractionId::new(format!("d{i}")),
                    session_id: id,
                    timestamp: t0(),
                    kind: DistractionKind::Thoughts,
                    source: None,
                    duration: None,
                }],
                completed: true,
                kind: SessionKind::Pomodoro,
            });
        }

        let stats = focus_stats(&state);
        assert_eq!(stats.sessions, 3);
        assert_eq!(stats.total_secs, 3000);
        assert_eq!(stats.average_secs, 1000);
        assert_eq!(stats.distractions, 3);

        assert_eq!(focus_stats(&AppState::default()), FocusStats::default());
    }

    #[test]
    fn integrity_from_honesty_answers() {
        assert_eq!(integrity_score(&[]), 100);

        let mut tasks = vec![
            task("a", Priority::Low, TaskStatus::Completed, None),
            task("b", Priority::Low, TaskStatus::Completed, None),
            task("c", Priority::Low, TaskStatus::Completed, None),
            task("d", Priority::Low, TaskStatus::Completed, None),
            task("e", Priority::Low, TaskStatus::Todo, None),
        ];
        tasks[0].honestly_completed = Some(true);
        tasks[1].honestly_completed = Some(true);
        tasks[2].honestly_completed = Some(true);
        tasks[3].honestly_completed = Some(false);
        tasks[4].honestly_completed = Some(false);

        assert_eq!(integrity_score(&tasks), 75);
    }

    #[test]
    fn unread_notifications() {
        let make = |id: &str, read: bool| Notification {
            id: NotificationId::new(id),
            user_id: UserId::default(),
            kind: NotificationKind::Team,
            title: String::new(),
            message: String::new(),
            priority: NotificationPriority::Medium,
            scheduled_for: t0(),
            sent: false,
            sent_at: None,
            read,
            read_at: None,
        };
        let list = vec![make("a", false), make("b", true), make("c", false)];
        assert_eq!(unread_count(&list), 2);
    }

    #[test]
    fn quiet_hours_window() {
        let mut settings = NotificationSettings::default();
        let late = WallClock::new(23, 30).unwrap();
        assert!(!in_quiet_hours(&settings, late));

        settings.quiet_hours = QuietHours {
            enabled: true,
            ..Default::default()
        };
        assert!(in_quiet_hours(&settings, late));
        assert!(in_quiet_hours(&settings, WallClock::new(7, 59).unwrap()));
        assert!(!in_quiet_hours(&settings, WallClock::new(8, 0).unwrap()));

        settings.quiet_hours.start = "late".into();
        assert!(!in_quiet_hours(&settings, late));
    }
}
