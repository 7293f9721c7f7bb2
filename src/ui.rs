use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};

use crate::app::{Tracker, View, SYNC_NOT_CONFIGURED};
use crate::date::{format_date, truncate_year_input, week_window};
use crate::error::{TrackerError, ValidationError};
use crate::export::ExportRange;
use crate::filter::{group_by_date, FilterType};
use crate::heatmap::{HeatmapCell, MonthFilter};
use crate::store::Mode;
use crate::sync::Identity;
use crate::task::{Task, TaskFields, TaskId, TaskInput, TaskStatus};

const TICK: Duration = Duration::from_millis(250);

/// Cursor position on the board.
#[derive(Debug, Default)]
pub struct BoardState {
    pub selected_status: usize,
    pub selected_task: usize,
    pub message: Option<String>,
}

impl BoardState {
    /// Id of the highlighted task, looked up from the tracker's state.
    pub fn selected_id(&self, tracker: &Tracker) -> Option<TaskId> {
        match tracker.view() {
            View::Kanban => tracker
                .columns()
                .get(self.selected_status)
                .and_then(|(_, tasks)| tasks.get(self.selected_task))
                .map(|t| t.id.clone()),
            View::List => list_order(&tracker.visible_tasks())
                .get(self.selected_task)
                .map(|t| t.id.clone()),
        }
    }

    fn clamp(&mut self, tracker: &Tracker) {
        let len = match tracker.view() {
            View::Kanban => tracker
                .columns()
                .get(self.selected_status)
                .map_or(0, |(_, tasks)| tasks.len()),
            View::List => tracker.visible_tasks().len(),
        };
        self.selected_task = self.selected_task.min(len.saturating_sub(1));
    }
}

fn list_order<'a>(tasks: &[&'a Task]) -> Vec<&'a Task> {
    group_by_date(tasks)
        .into_iter()
        .flat_map(|(_, tasks)| tasks)
        .collect()
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    tracker: &mut Tracker,
    export_dir: &Path,
) -> io::Result<()> {
    let mut state = BoardState::default();
    loop {
        tracker.poll();
        state.clamp(tracker);
        terminal.draw(|f| draw(f, tracker, &state))?;

        if !event::poll(TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        state.message = None;
        match key.code {
            KeyCode::Char('q') => return Ok(()),
            KeyCode::Char('a') => {
                let default_date = format_date(tracker.filter().1);
                if let Some(answers) = prompt_task(None, &default_date) {
                    let added = form_input(answers, None, &default_date)
                        .map_err(TrackerError::from)
                        .and_then(|input| tracker.add_task(&input));
                    state.message = Some(match added {
                        Ok(task) => format!("Added \"{}\"", task.title),
                        Err(err) => err.to_string(),
                    });
                }
                terminal.clear()?;
            }
            KeyCode::Char('e') => {
                if let Some(id) = state.selected_id(tracker) {
                    let current = tracker.store().get(&id).map(TaskFields::from);
                    if let Some(current) = current {
                        if let Some(answers) = prompt_task(Some(&current), "") {
                            let updated = form_input(answers, Some(&current), "")
                                .map_err(TrackerError::from)
                                .and_then(|input| tracker.update_task(&id, &input));
                            if let Err(err) = updated {
                                state.message = Some(err.to_string());
                            }
                        }
                    }
                    terminal.clear()?;
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = state.selected_id(tracker) {
                    let confirmed = prompt("Are you sure you want to delete this task? [y/N]")
                        .is_some_and(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes"));
                    if confirmed {
                        if let Err(err) = tracker.remove_task(&id) {
                            state.message = Some(err.to_string());
                        }
                    }
                    terminal.clear()?;
                }
            }
            KeyCode::Char('x') => {
                if let Some(range) = prompt("Export range (current, day, week, month, all)") {
                    state.message = Some(
                        match range.parse::<ExportRange>() {
                            Ok(range) => tracker
                                .export(range, export_dir)
                                .map(|path| format!("Exported to {}", path.display()))
                                .unwrap_or_else(|err| err.to_string()),
                            Err(err) => err.to_string(),
                        },
                    );
                }
                terminal.clear()?;
            }
            KeyCode::Char('g') => {
                if let Some(value) = prompt("Go to date (YYYY-MM-DD)") {
                    match TaskInput::new("-", truncate_year_input(&value)).validate() {
                        Ok(fields) => tracker.navigate_to_date(fields.date),
                        Err(err) => state.message = Some(err.to_string()),
                    }
                }
                terminal.clear()?;
            }
            KeyCode::Char('s') => {
                if !tracker.store().has_remote() {
                    state.message = Some(SYNC_NOT_CONFIGURED.to_owned());
                } else if let Some(uid) = prompt("Sign in as user id (blank signs out)") {
                    let name = if uid.is_empty() {
                        String::new()
                    } else {
                        prompt("Display name (optional)").unwrap_or_default()
                    };
                    state.message = Some(switch_identity(tracker, &uid, &name));
                    state.selected_task = 0;
                    terminal.clear()?;
                }
            }
            KeyCode::Char('f') => {
                let (filter_type, _) = tracker.filter();
                tracker.set_filter(filter_type.cycled());
            }
            KeyCode::Char('[') => tracker.shift_filter_date(false),
            KeyCode::Char(']') => tracker.shift_filter_date(true),
            KeyCode::Char('t') => tracker.set_filter_date(tracker.today()),
            KeyCode::Char('v') => {
                tracker.toggle_view();
                state.selected_task = 0;
            }
            KeyCode::Char('m') => {
                let (year, month) = tracker.heatmap_period();
                tracker.set_heatmap_period(year, next_month(month));
            }
            KeyCode::Char('y') => {
                let (year, month) = tracker.heatmap_period();
                let years = tracker.year_options();
                let next = years
                    .iter()
                    .position(|y| *y == year)
                    .map_or(0, |i| (i + 1) % years.len());
                if let Some(year) = years.get(next) {
                    tracker.set_heatmap_period(*year, month);
                }
            }
            KeyCode::Char('<') | KeyCode::Char('>') | KeyCode::Enter => {
                if let Some(id) = state.selected_id(tracker) {
                    let direction = if key.code == KeyCode::Char('<') { -1 } else { 1 };
                    if let Err(err) = tracker.move_task(&id, direction) {
                        state.message = Some(err.to_string());
                    }
                }
            }
            KeyCode::Left => {
                if state.selected_status > 0 {
                    state.selected_status -= 1;
                }
            }
            KeyCode::Right => {
                if state.selected_status + 1 < TaskStatus::ALL.len() {
                    state.selected_status += 1;
                }
            }
            KeyCode::Up => {
                if state.selected_task > 0 {
                    state.selected_task -= 1;
                }
            }
            KeyCode::Down => state.selected_task += 1,
            _ => {}
        }
    }
}

/// Sign in as `uid`, or sign out when it is blank. Returns the status line.
fn switch_identity(tracker: &mut Tracker, uid: &str, name: &str) -> String {
    if !tracker.store().has_remote() {
        return SYNC_NOT_CONFIGURED.to_owned();
    }
    let uid = uid.trim();
    if uid.is_empty() {
        if tracker.store().identity().is_none() {
            return "Not signed in".to_owned();
        }
        tracker.sign_out();
        return "Signed out".to_owned();
    }
    let identity = match name.trim() {
        "" => Identity::new(uid),
        name => Identity::new(uid).with_display_name(name),
    };
    match tracker.sign_in(identity) {
        Ok(()) => format!("Signed in as {uid}"),
        Err(err) => err.to_string(),
    }
}

fn next_month(month: MonthFilter) -> MonthFilter {
    match month {
        MonthFilter::All => MonthFilter::from_index(0).unwrap_or_default(),
        MonthFilter::Month(m) if m.number_from_month() == 12 => MonthFilter::All,
        MonthFilter::Month(m) => MonthFilter::Month(m.succ()),
    }
}

pub fn draw(f: &mut Frame, tracker: &Tracker, state: &BoardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(10),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, chunks[0], tracker);
    draw_stats(f, chunks[1], tracker);
    match tracker.view() {
        View::Kanban => draw_kanban(f, chunks[2], tracker, state),
        View::List => draw_list(f, chunks[2], tracker, state),
    }
    draw_heatmap(f, chunks[3], tracker);

    let footer = state.message.clone().unwrap_or_else(|| {
        "q quit  a add  e edit  d delete  <> move  s sign in/out  f filter  [] prev/next  t today  g go to  v view  x export  m/y heatmap".to_owned()
    });
    f.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        chunks[4],
    );
}

fn filter_label(filter_type: FilterType, anchor: chrono::NaiveDate) -> String {
    match filter_type {
        FilterType::Day => format!("Day {}", format_date(anchor)),
        FilterType::Week => {
            let (start, end) = week_window(anchor);
            format!("Week {} .. {}", format_date(start), format_date(end))
        }
        FilterType::Month => format!("Month {}", anchor.format("%b %Y")),
        FilterType::All => "All tasks".to_owned(),
    }
}

fn draw_header(f: &mut Frame, area: Rect, tracker: &Tracker) {
    let (filter_type, anchor) = tracker.filter();
    let mode = match (tracker.store().mode(), tracker.store().identity()) {
        (Mode::Remote, Some(identity)) => format!("synced as {}", identity.uid),
        _ if tracker.store().has_remote() => "guest".to_owned(),
        _ => "offline mode".to_owned(),
    };
    let mut spans = vec![
        Span::styled(
            tracker.title(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  {}  ", tracker.today().format("%A, %B %-d, %Y"))),
        Span::styled(filter_label(filter_type, anchor), Style::default().fg(Color::Cyan)),
        Span::raw(format!("  [{mode}]")),
    ];
    if tracker.store().is_syncing() {
        spans.push(Span::styled(" syncing...", Style::default().fg(Color::Yellow)));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_stats(f: &mut Frame, area: Rect, tracker: &Tracker) {
    let stats = tracker.stats();
    let line = format!(
        " Tasks {}   Completed {}   In progress {}   Hours {}",
        stats.total, stats.completed, stats.in_progress, stats.hours
    );
    f.render_widget(Paragraph::new(line), area);
}

fn task_line(task: &Task) -> Line<'_> {
    let mut spans = vec![
        Span::styled(&task.title, Style::default().fg(Color::White)),
        Span::raw(format!(" ({})", task.date.format("%b %-d"))),
    ];
    if task.hours > 0.0 {
        spans.push(Span::raw(format!(" {}h", task.hours)));
    }
    Line::from(spans)
}

fn draw_kanban(f: &mut Frame, area: Rect, tracker: &Tracker, state: &BoardState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Percentage(25); 4])
        .split(area);

    for (i, (status, tasks)) in tracker.columns().into_iter().enumerate() {
        let items: Vec<ListItem> = if tasks.is_empty() {
            vec![ListItem::new(Span::styled(
                "No tasks here",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            tasks.iter().map(|t| ListItem::new(task_line(t))).collect()
        };

        let selected = state.selected_status == i;
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("{} ({})", status.label(), tasks.len()))
                    .borders(Borders::ALL)
                    .border_style(if selected {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    }),
            )
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

        let mut list_state = ListState::default();
        if selected && !tasks.is_empty() {
            list_state.select(Some(state.selected_task));
        }
        f.render_stateful_widget(list, chunks[i], &mut list_state);
    }
}

fn draw_list(f: &mut Frame, area: Rect, tracker: &Tracker, state: &BoardState) {
    let visible = tracker.visible_tasks();
    let mut lines = Vec::new();
    let mut index = 0;
    for (date, tasks) in group_by_date(&visible) {
        let count = tasks.len();
        lines.push(Line::from(Span::styled(
            format!(
                "{}  ({count} task{})",
                date.format("%A, %B %-d, %Y"),
                if count == 1 { "" } else { "s" }
            ),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for task in tasks {
            let mut line = task_line(task);
            line.spans.insert(0, Span::raw(format!("  [{}] ", task.status.label())));
            if index == state.selected_task {
                line = line.style(Style::default().add_modifier(Modifier::REVERSED));
            }
            lines.push(line);
            index += 1;
        }
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No tasks found for this period",
            Style::default().fg(Color::DarkGray),
        )));
    }
    f.render_widget(
        Paragraph::new(lines).block(Block::default().title("Tasks").borders(Borders::ALL)),
        area,
    );
}

const fn level_color(level: u8) -> Color {
    match level {
        0 => Color::DarkGray,
        1 => Color::Rgb(155, 233, 168),
        2 => Color::Rgb(64, 196, 99),
        3 => Color::Rgb(48, 161, 78),
        _ => Color::Rgb(33, 110, 57),
    }
}

fn draw_heatmap(f: &mut Frame, area: Rect, tracker: &Tracker) {
    let map = match tracker.heatmap() {
        Ok(map) => map,
        Err(err) => {
            f.render_widget(Paragraph::new(err.to_string()), area);
            return;
        }
    };
    let weeks = map.weeks(tracker.today());
    let mut lines: Vec<Line> = (0..7)
        .map(|row| {
            Line::from(
                weeks
                    .iter()
                    .map(|week| match week[row] {
                        HeatmapCell::Day { level, .. } => {
                            Span::styled("■", Style::default().fg(level_color(level)))
                        }
                        HeatmapCell::Placeholder => Span::raw(" "),
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    lines.push(Line::from(format!(
        "{} tasks in {}   {} hours logged   {} active days",
        map.total_tasks,
        map.period_label(),
        map.total_hours,
        map.active_days
    )));
    let title = format!("Activity {}", map.month_labels().join(" "));
    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

fn prompt(message: &str) -> Option<String> {
    disable_raw_mode().ok();
    println!("{}", message);
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input);
    enable_raw_mode().ok();
    read.ok().map(|_| input.trim().to_string())
}

/// Answers typed into the task form, in prompt order.
#[derive(Debug, Default)]
struct TaskAnswers {
    title: String,
    date: String,
    status: String,
    hours: String,
    notes: String,
}

/// Ask for every field. `None` when stdin closes.
fn prompt_task(current: Option<&TaskFields>, default_date: &str) -> Option<TaskAnswers> {
    let date_default = current.map_or_else(|| default_date.to_owned(), |c| format_date(c.date));
    let status_default = current.map_or(TaskStatus::Todo, |c| c.status).key();
    Some(TaskAnswers {
        title: prompt("Enter task title")?,
        date: truncate_year_input(&prompt(&format!("Enter date (YYYY-MM-DD) [{date_default}]"))?),
        status: prompt(&format!("Status: todo, inprogress, onhold, done [{status_default}]"))?,
        hours: prompt("Hours")?,
        notes: prompt("Notes")?,
    })
}

/// Form input from `answers`. Blank answers keep the current (or default) value.
fn form_input(
    answers: TaskAnswers,
    current: Option<&TaskFields>,
    default_date: &str,
) -> Result<TaskInput, ValidationError> {
    let keep = |answer: String, fallback: String| if answer.is_empty() { fallback } else { answer };

    let status = if answers.status.is_empty() {
        current.map_or(TaskStatus::Todo, |c| c.status)
    } else {
        answers.status.parse::<TaskStatus>()?
    };
    let title = keep(answers.title, current.map(|c| c.title.clone()).unwrap_or_default());
    let date = keep(
        answers.date,
        current.map_or_else(|| default_date.to_owned(), |c| format_date(c.date)),
    );
    let hours = keep(answers.hours, current.map(|c| c.hours.to_string()).unwrap_or_default());
    let notes = keep(answers.notes, current.map(|c| c.notes.clone()).unwrap_or_default());
    Ok(TaskInput::new(title, date).status(status).hours(hours).notes(notes))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use chrono::{TimeZone, Utc};
    use ratatui::backend::TestBackend;
    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::app::Clock;
    use crate::storage::LocalStorage;
    use crate::store::TaskStore;
    use crate::sync::{Identity, MemoryRemote, SyncAdapter};

    fn tracker(remote: Option<&MemoryRemote>) -> (TempDir, Tracker) {
        let dir = tempdir().unwrap();
        let adapter = remote.map(|r| Rc::new(r.clone()) as Rc<dyn SyncAdapter>);
        let store = TaskStore::open(LocalStorage::new(dir.path()), adapter);
        let clock = Clock::Fixed(Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap());
        (dir, Tracker::new(store, clock, FilterType::Day))
    }

    fn render(tracker: &Tracker, state: &BoardState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| draw(f, tracker, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn kanban_shows_columns_tasks_and_summary() {
        let (_dir, mut tracker) = tracker(None);
        tracker
            .add_task(
                &TaskInput::new("Write spec", "2026-10-19")
                    .status(TaskStatus::InProgress)
                    .hours("2"),
            )
            .unwrap();

        let screen = render(&tracker, &BoardState::default());
        assert!(screen.contains("YOLO Daily Tracker"));
        assert!(screen.contains("To Do (0)"));
        assert!(screen.contains("In Progress (1)"));
        assert!(screen.contains("Write spec (Oct 19) 2h"));
        assert!(screen.contains("offline mode"));
        assert!(screen.contains("1 tasks in 2026"));
        assert!(screen.contains("1 active days"));
    }

    #[test]
    fn list_view_groups_by_date() {
        let (_dir, mut tracker) = tracker(None);
        tracker.add_task(&TaskInput::new("early", "2026-10-18")).unwrap();
        tracker.add_task(&TaskInput::new("late", "2026-10-19")).unwrap();
        tracker.set_filter(FilterType::Week);
        tracker.toggle_view();

        let screen = render(&tracker, &BoardState::default());
        let late = screen.find("Monday, October 19, 2026").unwrap();
        let early = screen.find("Sunday, October 18, 2026").unwrap();
        assert!(late < early);

        let state = BoardState::default();
        let id = state.selected_id(&tracker).unwrap();
        assert_eq!(tracker.store().get(&id).unwrap().title, "late");
    }

    #[test]
    fn selection_resolves_ids_from_columns() {
        let (_dir, mut tracker) = tracker(None);
        tracker
            .add_task(&TaskInput::new("held", "2026-10-19").status(TaskStatus::OnHold))
            .unwrap();
        let state = BoardState {
            selected_status: TaskStatus::OnHold.index(),
            ..BoardState::default()
        };
        let id = state.selected_id(&tracker).unwrap();
        assert_eq!(tracker.store().get(&id).unwrap().title, "held");
        assert!(BoardState::default().selected_id(&tracker).is_none());
    }

    #[test]
    fn header_shows_signed_in_identity() {
        let remote = MemoryRemote::new();
        let (_dir, mut tracker) = tracker(Some(&remote));
        assert!(render(&tracker, &BoardState::default()).contains("[guest]"));

        tracker
            .sign_in(Identity::new("uid-7").with_display_name("Grace Hopper"))
            .unwrap();
        let screen = render(&tracker, &BoardState::default());
        assert!(screen.contains("Grace's YOLO Daily Tracker"));
        assert!(screen.contains("synced as uid-7"));
    }

    #[test]
    fn edit_form_rejects_unknown_status() {
        let (_dir, mut tracker) = tracker(None);
        let task = tracker
            .add_task(&TaskInput::new("ship", "2026-10-19").status(TaskStatus::Done))
            .unwrap();
        let current = TaskFields::from(tracker.store().get(&task.id).unwrap());

        let answers = TaskAnswers {
            status: "in progress".to_owned(),
            ..TaskAnswers::default()
        };
        let err = form_input(answers, Some(&current), "").unwrap_err();
        assert_eq!(err, ValidationError::UnknownStatus("in progress".to_owned()));
        assert_eq!(tracker.store().get(&task.id).unwrap().status, TaskStatus::Done);
    }

    #[test]
    fn blank_edit_answers_keep_current_fields() {
        let (_dir, mut tracker) = tracker(None);
        let task = tracker
            .add_task(
                &TaskInput::new("ship", "2026-10-18")
                    .status(TaskStatus::OnHold)
                    .hours("1.5")
                    .notes("n"),
            )
            .unwrap();
        let current = TaskFields::from(tracker.store().get(&task.id).unwrap());

        let answers = TaskAnswers {
            title: "ship it".to_owned(),
            ..TaskAnswers::default()
        };
        let fields = form_input(answers, Some(&current), "")
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(fields.title, "ship it");
        assert_eq!(fields.status, TaskStatus::OnHold);
        assert_eq!(format_date(fields.date), "2026-10-18");
        assert_eq!(fields.hours, 1.5);
        assert_eq!(fields.notes, "n");
    }

    #[test]
    fn new_task_form_uses_defaults() {
        let answers = TaskAnswers {
            title: "fresh".to_owned(),
            status: "inprogress".to_owned(),
            ..TaskAnswers::default()
        };
        let fields = form_input(answers, None, "2026-10-19")
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(format_date(fields.date), "2026-10-19");
        assert_eq!(fields.status, TaskStatus::InProgress);
        assert_eq!(fields.hours, 0.0);
    }

    #[test]
    fn switching_identity_from_the_board() {
        let remote = MemoryRemote::new();
        let (_dir, mut tracker) = tracker(Some(&remote));
        tracker.add_task(&TaskInput::new("guest", "2026-10-19")).unwrap();

        assert_eq!(switch_identity(&mut tracker, "", ""), "Not signed in");
        assert_eq!(
            switch_identity(&mut tracker, "alice", "Ada Lovelace"),
            "Signed in as alice"
        );
        assert_eq!(tracker.title(), "Ada's YOLO Daily Tracker");
        assert!(tracker.visible_tasks().is_empty());
        assert_eq!(remote.listener_count("alice"), 1);

        switch_identity(&mut tracker, " bob ", "");
        assert_eq!(tracker.store().identity().unwrap().uid, "bob");
        assert_eq!(remote.listener_count("alice"), 0);
        assert_eq!(remote.listener_count("bob"), 1);

        assert_eq!(switch_identity(&mut tracker, "", ""), "Signed out");
        assert_eq!(tracker.store().mode(), Mode::Local);
        assert_eq!(remote.listener_count("bob"), 0);
        assert_eq!(tracker.visible_tasks().len(), 1);
    }

    #[test]
    fn sign_in_without_backend_is_refused() {
        let (_dir, mut tracker) = tracker(None);
        assert_eq!(switch_identity(&mut tracker, "alice", ""), SYNC_NOT_CONFIGURED);
        assert_eq!(tracker.store().mode(), Mode::Local);
    }

    #[test]
    fn heatmap_month_cycle_wraps() {
        let mut month = MonthFilter::All;
        for _ in 0..13 {
            month = next_month(month);
        }
        assert_eq!(month, MonthFilter::All);
    }
}
