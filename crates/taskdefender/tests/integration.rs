//! Integration tests for taskdefender
//!
//! These exercise config, storage, persistence and the controller together,
//! the way the command-line front end wires them.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use taskdefender_api::{
    Action, Dispatch, NewTask, Priority, SessionKind, StoreEvent, TaskStatus, User, WorkStyle,
};
use taskdefender_config::{
    load_config, load_or_default, parse_config, Config, ConfigError, TimerConfig,
};
use taskdefender_core::{selectors, AppController, CoreEvent, FocusCountdown, HydrateSource};
use taskdefender_store::{SqliteStorage, StatePersistence, StorageKeys};
use taskdefender_util::{MonotonicInstant, TaskId, Timestamp};

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
}

fn quiet_timers() -> TimerConfig {
    TimerConfig {
        intervention_probability: 0.0,
        ..Default::default()
    }
}

fn open_controller(config: &Config, data_dir: &Path, now_mono: MonotonicInstant) -> AppController {
    let storage = Arc::new(SqliteStorage::open(data_dir.join(&config.storage.database)).unwrap());
    let keys = StorageKeys {
        primary: config.storage.primary_key.clone(),
        backup: config.storage.backup_key.clone(),
    };
    AppController::new(
        StatePersistence::new(storage, keys),
        config.timers.clone(),
        now_mono,
    )
}

fn test_config() -> Config {
    Config {
        timers: quiet_timers(),
        ..Default::default()
    }
}

fn onboard(controller: &mut AppController, now: Timestamp) {
    let user = User::new("Ada", "ada@example.com", WorkStyle::Focused, vec![], now);
    controller.dispatch(Action::SetUser(user), now).unwrap();
    controller.dispatch(Action::CompleteOnboarding, now).unwrap();
}

fn add_task(controller: &mut AppController, task: NewTask, now: Timestamp) -> TaskId {
    match controller.dispatch(Action::AddTask(task), now).unwrap() {
        Dispatch::Applied(StoreEvent::TaskAdded { task_id }) => task_id,
        other => panic!("Expected TaskAdded, got {:?}", other),
    }
}

#[test]
fn test_dishonest_completion_lowers_integrity() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = open_controller(&test_config(), dir.path(), MonotonicInstant::now());
    assert_eq!(controller.hydrate(t0()), HydrateSource::Fresh);

    onboard(&mut controller, t0());
    let id = add_task(
        &mut controller,
        NewTask::new("Write report").with_priority(Priority::High),
        t0(),
    );
    let honest = add_task(&mut controller, NewTask::new("Inbox zero"), t0());

    let later = t0() + ChronoDuration::hours(2);
    controller
        .dispatch(
            Action::CompleteTask {
                id: id.clone(),
                honestly_completed: false,
            },
            later,
        )
        .unwrap();
    controller
        .dispatch(
            Action::CompleteTask {
                id: honest,
                honestly_completed: true,
            },
            later,
        )
        .unwrap();

    let state = controller.state();
    let task = state.task(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.honestly_completed, Some(false));
    assert_eq!(task.completed_at, Some(later));
    assert_eq!(task.priority, Priority::High);
    assert_eq!(selectors::integrity_score(&state.tasks), 50);
}

#[test]
fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config();

    {
        let mut controller = open_controller(&config, dir.path(), MonotonicInstant::now());
        controller.hydrate(t0());
        onboard(&mut controller, t0());
        add_task(&mut controller, NewTask::new("Water plants"), t0());
        controller.dispatch(Action::ToggleTheme, t0()).unwrap();
    }

    let mut controller = open_controller(&config, dir.path(), MonotonicInstant::now());
    assert_eq!(controller.hydrate(t0()), HydrateSource::Primary);

    let state = controller.state();
    assert_eq!(state.user.as_ref().map(|u| u.name.as_str()), Some("Ada"));
    assert!(!state.is_onboarding);
    assert_eq!(state.tasks.len(), 1);
    assert_eq!(state.tasks[0].title, "Water plants");
    assert_eq!(state.current_theme.as_str(), "dark");
}

#[test]
fn test_ignored_action_is_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config();
    let mut controller = open_controller(&config, dir.path(), MonotonicInstant::now());
    controller.hydrate(t0());

    let outcome = controller
        .dispatch(Action::DeleteTask(TaskId::new("missing")), t0())
        .unwrap();
    assert!(!outcome.is_applied());

    // Nothing was ever written, so a fresh controller still starts fresh
    let mut reopened = open_controller(&config, dir.path(), MonotonicInstant::now());
    assert_eq!(reopened.hydrate(t0()), HydrateSource::Fresh);
}

#[test]
fn test_export_import_between_data_dirs() {
    let source_dir = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();
    let config = test_config();

    let mut source = open_controller(&config, source_dir.path(), MonotonicInstant::now());
    source.hydrate(t0());
    onboard(&mut source, t0());
    add_task(
        &mut source,
        NewTask::new("Plan sprint").with_tags(vec!["work".into()]),
        t0(),
    );
    let export = source.export(t0()).unwrap();

    let doc: serde_json::Value = serde_json::from_str(&export).unwrap();
    assert_eq!(doc["version"], "1.0.0");
    assert_eq!(doc["data"]["tasks"][0]["title"], "Plan sprint");

    let mut target = open_controller(&config, target_dir.path(), MonotonicInstant::now());
    target.hydrate(t0());
    let outcome = target.import(&export, t0()).unwrap();
    assert_eq!(outcome, Dispatch::Applied(StoreEvent::StateLoaded));
    assert_eq!(target.state(), source.state());

    // The import was written through to the target's storage
    let mut reopened = open_controller(&config, target_dir.path(), MonotonicInstant::now());
    assert_eq!(reopened.hydrate(t0()), HydrateSource::Primary);
    assert_eq!(reopened.state().tasks[0].tags, vec!["work".to_string()]);
}

#[test]
fn test_import_rejects_document_without_data() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = open_controller(&test_config(), dir.path(), MonotonicInstant::now());
    controller.hydrate(t0());
    onboard(&mut controller, t0());

    let result = controller.import(r#"{"version":"1.0.0"}"#, t0());
    assert!(result.is_err());
    assert!(controller.state().user.is_some());
}

#[test]
fn test_clear_then_restore_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = open_controller(&test_config(), dir.path(), MonotonicInstant::now());
    controller.hydrate(t0());
    onboard(&mut controller, t0());

    controller.clear(t0()).unwrap();
    assert!(controller.state().user.is_none());
    assert!(controller.state().is_onboarding);
    assert!(!controller.restore_from_backup(t0()).unwrap());
}

#[test]
fn test_config_file_drives_storage_keys() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
config_version = 1

[storage]
database = "custom.db"
primary_key = "state"
backup_key = "state_backup"

[timers]
intervention_probability = 0.0
"#,
    )
    .unwrap();

    let config = load_or_default(&config_path).unwrap();
    assert_eq!(config.storage.database, "custom.db");

    let mut controller = open_controller(&config, dir.path(), MonotonicInstant::now());
    controller.hydrate(t0());
    onboard(&mut controller, t0());

    assert!(dir.path().join("custom.db").exists());
    assert_eq!(controller.persistence().keys().primary, "state");

    // A missing file falls back to defaults
    let defaults = load_or_default(dir.path().join("absent.toml")).unwrap();
    assert_eq!(defaults.storage.primary_key, "taskdefender_app_state");
    assert_eq!(defaults.storage.backup_key, "taskdefender_backup");
}

#[test]
fn test_load_config_requires_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_config(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::ReadError(_))));
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = parse_config(
        r#"
config_version = 1

[storage]
primary_key = "same"
backup_key = "same"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_focus_session_runs_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let start = MonotonicInstant::now();
    let mut controller = open_controller(&test_config(), dir.path(), start);
    controller.hydrate(t0());
    onboard(&mut controller, t0());
    let task = add_task(&mut controller, NewTask::new("Deep dive"), t0());

    let outcome = controller
        .start_focus(Some(task.clone()), SessionKind::Pomodoro, start, t0())
        .unwrap();
    assert!(outcome.is_applied());

    let mut countdown = FocusCountdown::new(Duration::from_secs(60));
    countdown.start(start);
    controller.set_countdown(countdown);

    let mut rng = StdRng::seed_from_u64(7);

    let events = controller
        .tick(start + Duration::from_secs(30), t0() + ChronoDuration::seconds(30), &mut rng)
        .unwrap();
    assert!(events.is_empty());
    assert!(controller.state().active_session.is_some());

    let end = t0() + ChronoDuration::seconds(60);
    let events = controller
        .tick(start + Duration::from_secs(60), end, &mut rng)
        .unwrap();
    assert!(events.contains(&CoreEvent::CountdownFinished));
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::FocusSessionEnded {
            duration_secs: 60,
            ..
        }
    )));

    let state = controller.state();
    assert!(state.active_session.is_none());
    assert_eq!(state.focus_sessions.len(), 1);
    assert_eq!(state.focus_sessions[0].task_id.as_ref(), Some(&task));
    assert_eq!(state.focus_sessions[0].end_time, Some(end));

    let stats = selectors::focus_stats(state);
    assert_eq!(stats.sessions, 1);
    assert_eq!(stats.total_secs, 60);

    controller.teardown();
    let events = controller
        .tick(start + Duration::from_secs(3600), end, &mut rng)
        .unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_second_focus_session_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let start = MonotonicInstant::now();
    let mut controller = open_controller(&test_config(), dir.path(), start);
    controller.hydrate(t0());
    onboard(&mut controller, t0());

    assert!(controller
        .start_focus(None, SessionKind::DeepWork, start, t0())
        .unwrap()
        .is_applied());
    assert!(!controller
        .start_focus(None, SessionKind::Break, start, t0())
        .unwrap()
        .is_applied());

    let stopped = controller
        .stop_focus(t0() + ChronoDuration::minutes(5))
        .unwrap()
        .unwrap();
    assert!(matches!(
        stopped,
        Dispatch::Applied(StoreEvent::FocusSessionEnded {
            duration_secs: 300,
            ..
        })
    ));
    assert!(controller.stop_focus(t0()).unwrap().is_none());
}

#[test]
fn test_session_left_open_by_killed_run_is_taken_over() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config();
    let start = MonotonicInstant::now();

    {
        let mut controller = open_controller(&config, dir.path(), start);
        controller.hydrate(t0());
        controller
            .start_focus(None, SessionKind::Pomodoro, start, t0())
            .unwrap();
        // Dropped without stop_focus, as after SIGKILL
    }

    let mut controller = open_controller(&config, dir.path(), start);
    controller.hydrate(t0());
    let later = t0() + ChronoDuration::minutes(20);
    let adopted = controller.adopt_open_session(start, later).unwrap();
    assert_eq!(
        controller.countdown().unwrap().remaining(start),
        Duration::from_secs(5 * 60)
    );

    let stopped = controller.stop_focus(later).unwrap().unwrap();
    assert!(matches!(
        stopped,
        Dispatch::Applied(StoreEvent::FocusSessionEnded {
            ref session_id,
            duration_secs: 1200,
        }) if *session_id == adopted
    ));

    // A new session can be opened once the old one is closed
    assert!(controller
        .start_focus(None, SessionKind::Break, start, later)
        .unwrap()
        .is_applied());
}
