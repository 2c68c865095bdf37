//! taskdefender - task manager with a sarcastic conscience
//!
//! This is the command-line entry point. It wires together:
//! - Configuration loading
//! - Storage initialization and state hydration
//! - The application controller (store, persistence, timers)
//! - The interactive focus countdown

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use taskdefender_api::{
    Action, Dispatch, DistractionKind, NewTask, NewTeam, Persona, Priority, SessionKind,
    SettingsPatch, StoreEvent, TaskStatus, Trigger, User, View, WorkStyle,
};
use taskdefender_config::load_or_default;
use taskdefender_core::{
    available_personas, generate_prompt, invite_code, selectors, AppController, CoreEvent,
    FocusCountdown, HydrateSource,
};
use taskdefender_store::{SqliteStorage, StatePersistence, Storage, StorageKeys};
use taskdefender_util::{
    default_config_path, format_countdown, format_local, is_mock_time_active, MonotonicInstant,
    TaskId, TeamId, Timestamp, WallClock,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// taskdefender - Task manager with a sarcastic conscience
#[derive(Parser, Debug)]
#[command(name = "taskdefender", version)]
#[command(about = "Task manager with focus timers and persona nudges", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/taskdefender/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set TASKDEFENDER_DATA_DIR env var)
    #[arg(short, long, env = "TASKDEFENDER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the local user profile
    Onboard {
        name: String,
        email: String,
        #[arg(long, default_value = "flexible")]
        work_style: WorkStyle,
        /// Repeat for several goals
        #[arg(long = "goal")]
        goals: Vec<String>,
    },

    /// Dashboard summary
    Status,

    /// List tasks, most urgent first
    Tasks {
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Case-insensitive match on title or description
        #[arg(long)]
        search: Option<String>,
    },

    AddTask {
        title: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// RFC 3339 timestamp, e.g. 2025-06-01T17:00:00Z
        #[arg(long)]
        due: Option<Timestamp>,
        #[arg(long)]
        description: Option<String>,
        /// Repeat for several tags
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Mark a task done (id or unique id prefix)
    CompleteTask {
        id: String,
        /// Answer the honesty check with "no"
        #[arg(long)]
        dishonest: bool,
    },

    DeleteTask {
        id: String,
    },

    /// Run a focus session with a live countdown. A session left open by an
    /// earlier run is taken over instead.
    Focus {
        #[arg(long, default_value = "pomodoro")]
        kind: SessionKind,
        /// Task to focus on (id or unique id prefix)
        #[arg(long)]
        task: Option<String>,
        /// Override the countdown length
        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Show a persona message
    Prompt {
        #[arg(long, default_value = "procrastination")]
        trigger: Trigger,
        /// Defaults to the persona chosen in settings
        #[arg(long)]
        persona: Option<Persona>,
    },

    /// Persona list; with a name, make it the default
    Persona {
        name: Option<Persona>,
    },

    #[command(subcommand)]
    Team(TeamCommand),

    /// List notifications
    Notifications {
        #[arg(long)]
        mark_all_read: bool,
    },

    /// Switch between light and dark
    Theme,

    /// Set the start view
    View {
        name: View,
    },

    /// Write all data to a JSON file
    Export {
        file: PathBuf,
    },

    /// Replace all data with the contents of an export file
    Import {
        file: PathBuf,
    },

    /// Delete all stored data
    Clear {
        /// Required; there is no undo
        #[arg(long)]
        yes: bool,
    },

    /// Replace current data with the last backup copy
    RestoreBackup,

    /// Close the open focus session, e.g. one left behind by a killed run
    Stop,
}

#[derive(Subcommand, Debug)]
enum TeamCommand {
    List,
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Leave {
        id: String,
    },
}

fn open_controller(args: &Args) -> Result<AppController> {
    let mut config = load_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    if let Some(data_dir) = &args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }

    std::fs::create_dir_all(&config.storage.data_dir).with_context(|| {
        format!("Failed to create data directory {:?}", config.storage.data_dir)
    })?;

    let db_path = config.storage.database_path();
    let storage: Arc<dyn Storage> = Arc::new(
        SqliteStorage::open(&db_path)
            .with_context(|| format!("Failed to open database {:?}", db_path))?,
    );
    debug!(db_path = %db_path.display(), "Storage opened");

    let keys = StorageKeys {
        primary: config.storage.primary_key.clone(),
        backup: config.storage.backup_key.clone(),
    };
    let persistence = StatePersistence::new(storage, keys);

    let mut controller =
        AppController::new(persistence, config.timers.clone(), MonotonicInstant::now());
    if controller.hydrate(taskdefender_util::now()) == HydrateSource::Backup {
        warn!("Primary data was unreadable; loaded the backup copy");
        eprintln!("warning: stored data was damaged, restored from backup");
    }

    Ok(controller)
}

/// Resolve a full id or unique prefix against the task list
fn resolve_task(controller: &AppController, query: &str) -> Result<TaskId> {
    let matches: Vec<&TaskId> = controller
        .state()
        .tasks
        .iter()
        .map(|t| &t.id)
        .filter(|id| id.as_str() == query || id.as_str().starts_with(query))
        .collect();

    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => bail!("No task matches '{}'", query),
        _ => match matches.iter().find(|id| id.as_str() == query) {
            Some(id) => Ok((*id).clone()),
            None => bail!("'{}' matches {} tasks; use a longer prefix", query, matches.len()),
        },
    }
}

fn resolve_team(controller: &AppController, query: &str) -> Result<TeamId> {
    let matches: Vec<&TeamId> = controller
        .state()
        .teams
        .iter()
        .map(|t| &t.id)
        .filter(|id| id.as_str().starts_with(query))
        .collect();

    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => bail!("No team matches '{}'", query),
        _ => bail!("'{}' matches {} teams; use a longer prefix", query, matches.len()),
    }
}

/// Report an ignored action as an error; the CLI only dispatches actions it
/// expects to apply.
fn expect_applied(outcome: Dispatch) -> Result<StoreEvent> {
    match outcome {
        Dispatch::Applied(event) => Ok(event),
        Dispatch::Ignored(reason) => bail!("Nothing changed: {}", reason),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn human_duration(secs: u64) -> String {
    let (h, m) = (secs / 3600, (secs % 3600) / 60);
    if h > 0 {
        format!("{}h {:02}m", h, m)
    } else {
        format!("{}m", m)
    }
}

fn print_status(controller: &AppController) {
    let state = controller.state();
    let today = Local::now().date_naive();

    match &state.user {
        Some(user) => println!(
            "{} (integrity {}%, streak {} days)",
            user.name,
            selectors::integrity_score(&state.tasks),
            user.streak
        ),
        None => println!("Not onboarded yet. Run `taskdefender onboard <name> <email>`."),
    }

    let groups = selectors::tasks_by_status(&state.tasks);
    let count = |s: TaskStatus| groups.get(&s).map_or(0, Vec::len);
    println!(
        "Tasks: {} todo, {} in progress, {} completed",
        count(TaskStatus::Todo),
        count(TaskStatus::InProgress),
        count(TaskStatus::Completed)
    );

    let progress = selectors::day_progress(&state.tasks, today, &Local);
    println!(
        "Due today: {}/{} done ({}%)",
        progress.completed,
        progress.total,
        progress.percent()
    );

    let stats = selectors::focus_stats(state);
    println!(
        "Focus: {} sessions, {} total, {} average, {} distractions",
        stats.sessions,
        human_duration(stats.total_secs),
        human_duration(stats.average_secs),
        stats.distractions
    );

    if let Some(session) = &state.active_session {
        println!(
            "Open session: {} {} since {}",
            short_id(session.id.as_str()),
            session.kind,
            format_local(&session.start_time)
        );
    }

    let upcoming = selectors::upcoming_tasks(&state.tasks, taskdefender_util::now());
    if !upcoming.is_empty() {
        println!("Upcoming:");
        for task in upcoming.iter().take(5) {
            let due = task.due_date.as_ref().map(format_local).unwrap_or_default();
            println!("  {}  {}", due, task.title);
        }
    }

    let unread = selectors::unread_count(&state.notifications);
    let quiet = selectors::in_quiet_hours(
        &state.settings.notifications,
        WallClock::from_naive_time(Local::now().time()),
    );
    println!(
        "Notifications: {} unread{}",
        unread,
        if quiet { " (quiet hours)" } else { "" }
    );
    println!(
        "Theme: {}, start view: {}, persona: {}",
        state.current_theme, state.current_view, state.settings.sarcasm.persona
    );
}

fn print_tasks(controller: &AppController, filter: &selectors::TaskFilter) {
    let state = controller.state();
    let mut tasks = selectors::filter_tasks(&state.tasks, filter);
    selectors::sort_by_priority(&mut tasks);

    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }

    for task in tasks {
        let due = task
            .due_date
            .as_ref()
            .map(|d| format!("  due {}", format_local(d)))
            .unwrap_or_default();
        let honesty = match task.honestly_completed {
            Some(false) => "  (self-reported: not honest)",
            _ => "",
        };
        println!(
            "{}  [{:<11}] {:<6} {}{}{}",
            short_id(task.id.as_str()),
            task.status,
            task.priority,
            task.title,
            due,
            honesty
        );
    }
}

/// Interactive focus loop. Reads single-letter commands from stdin:
/// `p` pause, `r` resume, `d` log a distraction, `q` stop early, and
/// `a`/`x` to answer or decline a ringing call. Any input dismisses the
/// prompt on screen.
async fn run_focus(
    controller: &mut AppController,
    kind: SessionKind,
    task_id: Option<TaskId>,
    minutes: Option<u32>,
) -> Result<()> {
    let started_mono = MonotonicInstant::now();
    let now = taskdefender_util::now();

    // A session left open by a run that was killed is taken over
    let session_id = match controller.adopt_open_session(started_mono, now) {
        Some(session_id) => {
            if let Some(open) = &controller.state().active_session {
                println!(
                    "Taking over the {} session open since {}.",
                    open.kind,
                    format_local(&open.start_time)
                );
            }
            session_id
        }
        None => {
            let outcome = controller.start_focus(task_id, kind, started_mono, now)?;
            let StoreEvent::FocusSessionStarted { session_id } = expect_applied(outcome)? else {
                bail!("Unexpected result starting focus session");
            };

            if let Some(minutes) = minutes {
                let mut countdown =
                    FocusCountdown::new(Duration::from_secs(u64::from(minutes) * 60));
                countdown.start(started_mono);
                controller.set_countdown(countdown);
            }
            println!("{} session started.", kind);
            session_id
        }
    };

    println!("Commands: p pause, r resume, d distraction, q stop");
    info!(session_id = %session_id, "Focus loop running");

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

    let mut rng = StdRng::from_entropy();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, closing focus session");
                report_stop(controller)?;
                break;
            }

            _ = sigint.recv() => {
                info!("Interrupted, closing focus session");
                report_stop(controller)?;
                break;
            }

            // Terminal closed
            _ = sighup.recv() => {
                info!("Received SIGHUP, closing focus session");
                report_stop(controller)?;
                break;
            }

            line = stdin.next_line(), if stdin_open => {
                let now_mono = MonotonicInstant::now();
                controller.record_activity(now_mono);
                controller.dismiss_prompt();

                match line?.as_deref().map(str::trim) {
                    Some("p") => {
                        controller.pause_focus(now_mono);
                        println!("\nPaused.");
                    }
                    Some("r") => {
                        controller.resume_focus(now_mono);
                        println!("\nResumed.");
                    }
                    Some("d") => {
                        controller.dispatch(
                            Action::AddDistraction {
                                session_id: session_id.clone(),
                                kind: DistractionKind::Manual,
                                source: None,
                            },
                            taskdefender_util::now(),
                        )?;
                        println!("\nDistraction logged.");
                    }
                    Some("a") => {
                        if let Some(call) = controller.current_call().cloned() {
                            controller.answer_call(&call.id);
                            println!("\n{}: \"{}\"", call.character, call.script);
                            controller.end_call(&call.id);
                        }
                    }
                    Some("x") => {
                        if let Some(call) = controller.current_call().cloned() {
                            controller.decline_call(&call.id);
                            println!("\nDeclined. Your {} will remember this.", call.character);
                        }
                    }
                    Some("q") => {
                        report_stop(controller)?;
                        break;
                    }
                    // Closed stdin; keep running on the countdown alone
                    None => stdin_open = false,
                    Some(_) => {}
                }
            }

            _ = ticker.tick() => {
                let now_mono = MonotonicInstant::now();
                let events = controller.tick(now_mono, taskdefender_util::now(), &mut rng)?;

                if let Some(countdown) = controller.countdown() {
                    print!("\r{} remaining ", format_countdown(countdown.remaining(now_mono).as_secs()));
                    std::io::stdout().flush().ok();
                }

                let mut finished = false;
                for event in events {
                    match event {
                        CoreEvent::CountdownFinished => println!("\nTime is up!"),
                        CoreEvent::FocusSessionEnded { duration_secs, .. } => {
                            println!("Session complete: {} focused.", human_duration(duration_secs));
                            finished = true;
                        }
                        CoreEvent::PromptShown { prompt } => {
                            println!("\n[{}] {}", prompt.persona, prompt.message);
                        }
                        CoreEvent::PromptDismissed { .. } => {}
                        CoreEvent::CallIncoming { call } => {
                            println!("\nIncoming call from your {} (a answer, x decline)", call.character);
                        }
                    }
                }
                if finished {
                    break;
                }
            }
        }
    }

    controller.teardown();
    Ok(())
}

fn report_stop(controller: &mut AppController) -> Result<()> {
    if let Some(Dispatch::Applied(StoreEvent::FocusSessionEnded { duration_secs, .. })) =
        controller.stop_focus(taskdefender_util::now())?
    {
        println!("\nSession stopped after {}.", human_duration(duration_secs));
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut controller = open_controller(&args)?;
    let now = taskdefender_util::now();

    match args.command {
        Command::Onboard {
            name,
            email,
            work_style,
            goals,
        } => {
            if controller.state().user.is_some() {
                bail!("Already onboarded");
            }
            let user = User::new(name, email, work_style, goals, now);
            controller.dispatch(Action::SetUser(user), now)?;
            controller.dispatch(Action::CompleteOnboarding, now)?;
            println!("Welcome aboard.");
        }

        Command::Status => print_status(&controller),

        Command::Tasks { status, search } => {
            print_tasks(&controller, &selectors::TaskFilter { status, search });
        }

        Command::AddTask {
            title,
            priority,
            due,
            description,
            tags,
        } => {
            let mut task = NewTask::new(title).with_priority(priority).with_tags(tags);
            if let Some(due) = due {
                task = task.with_due_date(due);
            }
            if let Some(description) = description {
                task = task.with_description(description);
            }
            if let StoreEvent::TaskAdded { task_id } =
                expect_applied(controller.dispatch(Action::AddTask(task), now)?)?
            {
                println!("Added task {}", task_id);
            }
        }

        Command::CompleteTask { id, dishonest } => {
            let id = resolve_task(&controller, &id)?;
            expect_applied(controller.dispatch(
                Action::CompleteTask {
                    id,
                    honestly_completed: !dishonest,
                },
                now,
            )?)?;

            let mut rng = StdRng::from_entropy();
            let persona = controller.state().settings.sarcasm.persona;
            let trigger = if dishonest {
                Trigger::LowProductivity
            } else {
                Trigger::Achievement
            };
            println!("{}", generate_prompt(trigger, persona, &mut rng).message);
        }

        Command::DeleteTask { id } => {
            let id = resolve_task(&controller, &id)?;
            expect_applied(controller.dispatch(Action::DeleteTask(id), now)?)?;
            println!("Deleted.");
        }

        Command::Focus {
            kind,
            task,
            minutes,
        } => {
            let task_id = task
                .map(|query| resolve_task(&controller, &query))
                .transpose()?;
            run_focus(&mut controller, kind, task_id, minutes).await?;
        }

        Command::Prompt { trigger, persona } => {
            let persona = persona.unwrap_or(controller.state().settings.sarcasm.persona);
            let prompt = generate_prompt(trigger, persona, &mut StdRng::from_entropy());
            println!("{}", prompt.message);
            println!(
                "  ({}, intensity {}/5, {})",
                prompt.persona, prompt.intensity, prompt.category
            );
        }

        Command::Persona { name } => match name {
            Some(persona) => {
                let mut sarcasm = controller.state().settings.sarcasm.clone();
                sarcasm.persona = persona;
                controller.dispatch(
                    Action::UpdateSettings(SettingsPatch {
                        sarcasm: Some(sarcasm),
                        ..Default::default()
                    }),
                    now,
                )?;
                println!("Persona set to {}", persona);
            }
            None => {
                let current = controller.state().settings.sarcasm.persona;
                for info in available_personas() {
                    let marker = if info.id == current { "*" } else { " " };
                    println!("{} {:<20} {}", marker, info.id, info.description);
                }
            }
        },

        Command::Team(TeamCommand::List) => {
            for team in &controller.state().teams {
                println!(
                    "{}  {}  (invite code {})",
                    short_id(team.id.as_str()),
                    team.name,
                    team.invite_code
                );
            }
        }

        Command::Team(TeamCommand::Create { name, description }) => {
            let code = invite_code(&mut StdRng::from_entropy());
            expect_applied(controller.dispatch(
                Action::CreateTeam(NewTeam {
                    name,
                    description,
                    invite_code: code.clone(),
                }),
                now,
            )?)?;
            println!("Team created. Invite code: {}", code);
        }

        Command::Team(TeamCommand::Leave { id }) => {
            let id = resolve_team(&controller, &id)?;
            expect_applied(controller.dispatch(Action::LeaveTeam(id), now)?)?;
            println!("Left team.");
        }

        Command::Notifications { mark_all_read } => {
            for n in &controller.state().notifications {
                let flag = if n.read { " " } else { "*" };
                println!("{} [{}] {}: {}", flag, n.kind, n.title, n.message);
            }
            if mark_all_read {
                if let StoreEvent::NotificationsRead { count } =
                    expect_applied(controller.dispatch(Action::MarkAllNotificationsRead, now)?)?
                {
                    println!("Marked {} as read.", count);
                }
            }
        }

        Command::Theme => {
            if let StoreEvent::ThemeToggled { theme } =
                expect_applied(controller.dispatch(Action::ToggleTheme, now)?)?
            {
                println!("Theme: {}", theme);
            }
        }

        Command::View { name } => {
            expect_applied(controller.dispatch(Action::SetCurrentView(name), now)?)?;
            println!("Start view: {}", name);
        }

        Command::Export { file } => {
            let text = controller.export(now)?;
            std::fs::write(&file, text)
                .with_context(|| format!("Failed to write export to {:?}", file))?;
            println!("Exported to {}", file.display());
        }

        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            controller.import(&text, now)?;
            println!(
                "Imported {} tasks from {}",
                controller.state().tasks.len(),
                file.display()
            );
        }

        Command::Clear { yes } => {
            if !yes {
                bail!("Refusing to delete all data without --yes");
            }
            controller.clear(now)?;
            println!("All data cleared.");
        }

        Command::Stop => match controller.stop_focus(now)? {
            Some(Dispatch::Applied(StoreEvent::FocusSessionEnded { duration_secs, .. })) => {
                println!("Session closed after {}.", human_duration(duration_secs));
            }
            _ => println!("No focus session is open."),
        },

        Command::RestoreBackup => {
            if controller.restore_from_backup(now)? {
                println!("Restored from backup.");
            } else {
                bail!("No backup found");
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout is for command output
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        mock_time = is_mock_time_active(),
        "taskdefender starting"
    );

    run(args).await
}
