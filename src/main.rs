use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use yolo_tracker::app::SYNC_NOT_CONFIGURED;
use yolo_tracker::config::Config;
use yolo_tracker::date::format_date;
use yolo_tracker::export::ExportRange;
use yolo_tracker::heatmap::{tooltip, HeatmapCell};
use yolo_tracker::storage::LocalStorage;
use yolo_tracker::sync::{Identity, MemoryRemote, SyncAdapter};
use yolo_tracker::task::TaskFields;
use yolo_tracker::{
    ui, Clock, FilterType, MonthFilter, TaskId, TaskInput, TaskStatus, TaskStore, Tracker,
};

/// Daily task tracker with a kanban board, filters, heatmap and CSV export.
#[derive(Parser, Debug)]
#[command(name = "yolo-tracker", version)]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the data directory holding local tasks.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Sign in to the sync backend as this user id.
    #[arg(long)]
    user: Option<String>,

    /// Display name for the signed-in user.
    #[arg(long, requires = "user")]
    name: Option<String>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the interactive board (default).
    Board,

    /// Add a task.
    Add {
        title: String,
        /// YYYY-MM-DD, defaults to today.
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "todo")]
        status: TaskStatus,
        #[arg(long, default_value = "")]
        hours: String,
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Edit a task. Omitted fields keep their value.
    Edit {
        /// Task id or unique prefix.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        hours: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Move a task to another column.
    Status { id: String, status: TaskStatus },

    /// Delete a task.
    Rm {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// List tasks in a date window.
    Ls {
        #[arg(long)]
        filter: Option<FilterType>,
        /// Anchor date, defaults to today.
        #[arg(long)]
        date: Option<String>,
    },

    /// Write tasks to `yolo-tasks-<range>-<today>.csv`.
    Export {
        #[arg(default_value = "current")]
        range: ExportRange,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Print the activity heatmap.
    Heatmap {
        #[arg(long)]
        year: Option<i32>,
        /// `all` or a zero-based month (0 = January).
        #[arg(long, default_value = "all")]
        month: MonthFilter,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.cmd.unwrap_or(Command::Board);

    if should_install_tracing(&cmd) {
        install_tracing()?;
    }

    let config = Config::load(cli.config.as_deref())?;
    let config = match cli.data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    };
    let mut tracker = open_tracker(&config)?;

    if let Some(uid) = cli.user {
        if !tracker.store().has_remote() {
            bail!(SYNC_NOT_CONFIGURED);
        }
        let identity = match cli.name {
            Some(name) => Identity::new(uid).with_display_name(name),
            None => Identity::new(uid),
        };
        tracker.sign_in(identity).context("sign in failed")?;
    }

    execute_command(&mut tracker, cmd)
}

fn open_tracker(config: &Config) -> Result<Tracker> {
    let adapter: Option<Rc<dyn SyncAdapter>> = if config.remote.enabled {
        let path = config.remote_store_path();
        let remote = MemoryRemote::open(&path)
            .with_context(|| format!("failed to open sync store {}", path.display()))?;
        Some(Rc::new(remote))
    } else {
        None
    };
    let store = TaskStore::open(LocalStorage::new(config.data_dir()), adapter);
    Ok(Tracker::new(store, Clock::System, config.default_filter()?))
}

fn execute_command(tracker: &mut Tracker, command: Command) -> Result<()> {
    match command {
        Command::Board => run_board(tracker),

        Command::Add {
            title,
            date,
            status,
            hours,
            notes,
        } => {
            let date = date.unwrap_or_else(|| format_date(tracker.today()));
            let input = TaskInput::new(title, date)
                .status(status)
                .hours(hours)
                .notes(notes);
            let task = tracker.add_task(&input)?;
            println!("{}", task.id);
            Ok(())
        }

        Command::Edit {
            id,
            title,
            date,
            status,
            hours,
            notes,
        } => {
            let id = resolve_id(tracker, &id)?;
            let Some(current) = tracker.store().get(&id).map(TaskFields::from) else {
                bail!("task not found: {id}");
            };
            let input = TaskInput::new(
                title.unwrap_or(current.title),
                date.unwrap_or_else(|| format_date(current.date)),
            )
            .status(status.unwrap_or(current.status))
            .hours(hours.unwrap_or_else(|| current.hours.to_string()))
            .notes(notes.unwrap_or(current.notes));
            tracker.update_task(&id, &input)?;
            Ok(())
        }

        Command::Status { id, status } => {
            let id = resolve_id(tracker, &id)?;
            tracker.set_status(&id, status)?;
            Ok(())
        }

        Command::Rm { id, yes } => {
            let id = resolve_id(tracker, &id)?;
            if !yes && !confirm("Are you sure you want to delete this task? [y/N]: ")? {
                println!("Aborted.");
                return Ok(());
            }
            tracker.remove_task(&id)?;
            Ok(())
        }

        Command::Ls { filter, date } => {
            if let Some(filter) = filter {
                tracker.set_filter(filter);
            }
            if let Some(date) = date {
                let date = TaskInput::new("-", date).validate()?.date;
                tracker.set_filter_date(date);
            }
            print_tasks(tracker);
            Ok(())
        }

        Command::Export { range, out } => {
            let path = tracker.export(range, &out)?;
            println!("{}", path.display());
            Ok(())
        }

        Command::Heatmap { year, month } => {
            let year = year.unwrap_or_else(|| tracker.heatmap_period().0);
            tracker.set_heatmap_period(year, month);
            print_heatmap(tracker)
        }
    }
}

/// Accept a full id or a unique prefix of one.
fn resolve_id(tracker: &Tracker, needle: &str) -> Result<TaskId> {
    let matches: Vec<&TaskId> = tracker
        .store()
        .tasks()
        .iter()
        .map(|t| &t.id)
        .filter(|id| id.as_str().starts_with(needle))
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => bail!("task not found: {needle}"),
        _ => bail!("ambiguous task id: {needle} matches {} tasks", matches.len()),
    }
}

fn print_tasks(tracker: &Tracker) {
    for (status, tasks) in tracker.columns() {
        println!("{} ({}):", status.label(), tasks.len());
        for task in tasks {
            let hours = if task.hours > 0.0 {
                format!(", {}h", task.hours)
            } else {
                String::new()
            };
            println!(
                "- [{}] {} ({}{hours})",
                short_id(&task.id),
                task.title,
                format_date(task.date)
            );
            if !task.notes.is_empty() {
                println!("    {}", task.notes);
            }
        }
    }
    let stats = tracker.stats();
    println!(
        "Tasks: {}  Completed: {}  In progress: {}  Hours: {}",
        stats.total, stats.completed, stats.in_progress, stats.hours
    );
}

fn short_id(id: &TaskId) -> &str {
    let s = id.as_str();
    s.char_indices().nth(8).map_or(s, |(i, _)| &s[..i])
}

fn print_heatmap(tracker: &Tracker) -> Result<()> {
    let map = tracker.heatmap()?;
    let weeks = map.weeks(tracker.today());
    println!("{}", map.month_labels().join(" "));
    for row in 0..7 {
        let line: String = weeks
            .iter()
            .map(|week| match week[row] {
                HeatmapCell::Day { level, .. } => [' ', '░', '▒', '▓', '█'][usize::from(level)],
                HeatmapCell::Placeholder => ' ',
            })
            .collect();
        println!("{}", line.trim_end());
    }
    println!(
        "{} tasks in {}  {} hours logged  {} active days",
        map.total_tasks,
        map.period_label(),
        map.total_hours,
        map.active_days
    );
    if let Some((date, count)) = map.per_day.iter().max_by_key(|(_, count)| **count) {
        println!("Busiest: {}", tooltip(*date, *count));
    }
    Ok(())
}

fn run_board(tracker: &mut Tracker) -> Result<()> {
    let export_dir = std::env::current_dir().context("failed to resolve current directory")?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, tracker, Path::new(&export_dir));

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result.context("board exited with an error")
}

fn confirm(message: &str) -> Result<bool> {
    print!("{message}");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

const fn should_install_tracing(cmd: &Command) -> bool {
    !matches!(cmd, Command::Board)
}

/// `RUST_LOG` when it is set and valid, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn install_tracing() -> Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
