//! Application state shared by the board and the CLI commands.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, Months, NaiveDate, Utc};
use tracing::info;

use crate::error::{ExportError, RemoteError, TrackerError, ValidationError};
use crate::export::{self, ExportRange};
use crate::filter::{self, FilterType, Stats};
use crate::heatmap::{self, Heatmap, MonthFilter};
use crate::store::TaskStore;
use crate::sync::Identity;
use crate::task::{Task, TaskId, TaskInput, TaskStatus};

/// Shown when signing in without a configured sync backend.
pub const SYNC_NOT_CONFIGURED: &str =
    "Sync is not configured. Set `[remote] enabled = true` in config.toml to sign in.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Kanban,
    List,
}

impl View {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Kanban => Self::List,
            Self::List => Self::Kanban,
        }
    }
}

/// Source of "now". Tests pin it.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(now) => now,
        }
    }

    /// Calendar day in the local zone.
    pub fn today(self) -> NaiveDate {
        match self {
            Self::System => Local::now().date_naive(),
            Self::Fixed(now) => now.date_naive(),
        }
    }
}

pub struct Tracker {
    store: TaskStore,
    clock: Clock,
    view: View,
    filter_type: FilterType,
    filter_date: NaiveDate,
    heatmap_year: i32,
    heatmap_month: MonthFilter,
}

impl Tracker {
    pub fn new(store: TaskStore, clock: Clock, filter_type: FilterType) -> Self {
        let today = clock.today();
        Self {
            store,
            clock,
            view: View::default(),
            filter_type,
            filter_date: today,
            heatmap_year: today.year(),
            heatmap_month: MonthFilter::All,
        }
    }

    pub const fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub const fn view(&self) -> View {
        self.view
    }

    pub fn toggle_view(&mut self) {
        self.view = self.view.toggled();
    }

    /// Header text, personalised once signed in.
    pub fn title(&self) -> String {
        match self.store.identity() {
            Some(identity) => format!("{}'s YOLO Daily Tracker", identity.first_name()),
            None => "YOLO Daily Tracker".to_owned(),
        }
    }

    pub fn sign_in(&mut self, identity: Identity) -> Result<(), RemoteError> {
        info!(uid = %identity.uid, "Signing in");
        self.store.use_remote(identity)
    }

    pub fn sign_out(&mut self) {
        info!("Signing out");
        self.store.use_local();
    }

    /// Apply pending remote snapshots.
    pub fn poll(&mut self) -> usize {
        self.store.poll_remote()
    }

    pub fn add_task(&mut self, input: &TaskInput) -> Result<Task, TrackerError> {
        let task = self.store.add(input, self.clock.now())?;
        self.poll();
        Ok(task)
    }

    pub fn update_task(&mut self, id: &TaskId, input: &TaskInput) -> Result<(), TrackerError> {
        self.store.update(id, input, self.clock.now())?;
        self.poll();
        Ok(())
    }

    pub fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<(), TrackerError> {
        self.store.set_status(id, status, self.clock.now())?;
        self.poll();
        Ok(())
    }

    /// Drop the task into the neighbouring column.
    pub fn move_task(&mut self, id: &TaskId, direction: isize) -> Result<(), TrackerError> {
        let Some(current) = self.store.get(id).map(|t| t.status) else {
            return Ok(());
        };
        let target = current.shifted(direction);
        if target == current {
            return Ok(());
        }
        self.set_status(id, target)
    }

    pub fn remove_task(&mut self, id: &TaskId) -> Result<(), TrackerError> {
        self.store.remove(id)?;
        self.poll();
        Ok(())
    }

    pub const fn filter(&self) -> (FilterType, NaiveDate) {
        (self.filter_type, self.filter_date)
    }

    pub fn set_filter(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
    }

    pub fn set_filter_date(&mut self, date: NaiveDate) {
        self.filter_date = date;
    }

    /// Move the anchor by one window (day, week or month).
    pub fn shift_filter_date(&mut self, forward: bool) {
        let date = self.filter_date;
        let shifted = match (self.filter_type, forward) {
            (FilterType::All, _) => Some(date),
            (FilterType::Day, true) => date.succ_opt(),
            (FilterType::Day, false) => date.pred_opt(),
            (FilterType::Week, true) => date.checked_add_days(chrono::Days::new(7)),
            (FilterType::Week, false) => date.checked_sub_days(chrono::Days::new(7)),
            (FilterType::Month, true) => date.checked_add_months(Months::new(1)),
            (FilterType::Month, false) => date.checked_sub_months(Months::new(1)),
        };
        if let Some(shifted) = shifted {
            self.filter_date = shifted;
        }
    }

    /// Show a single day, as when a heatmap cell is picked.
    pub fn navigate_to_date(&mut self, date: NaiveDate) {
        self.filter_date = date;
        self.filter_type = FilterType::Day;
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        filter::filter(self.store.tasks(), self.filter_type, self.filter_date)
    }

    pub fn stats(&self) -> Stats {
        Stats::from_tasks(&self.visible_tasks())
    }

    pub fn columns(&self) -> Vec<(TaskStatus, Vec<&Task>)> {
        let visible = self.visible_tasks();
        TaskStatus::ALL
            .into_iter()
            .map(|status| (status, filter::by_status(&visible, status)))
            .collect()
    }

    pub const fn heatmap_period(&self) -> (i32, MonthFilter) {
        (self.heatmap_year, self.heatmap_month)
    }

    pub fn set_heatmap_period(&mut self, year: i32, month: MonthFilter) {
        self.heatmap_year = year;
        self.heatmap_month = month;
    }

    pub fn heatmap(&self) -> Result<Heatmap, ValidationError> {
        heatmap::aggregate(
            self.store.tasks(),
            self.heatmap_year,
            self.heatmap_month,
            self.today(),
        )
    }

    pub fn year_options(&self) -> Vec<i32> {
        heatmap::year_options(self.store.tasks(), self.today())
    }

    pub fn export_tasks(&self, range: ExportRange) -> Vec<&Task> {
        export::select(self.store.tasks(), range, self.filter(), self.today())
    }

    /// Write the CSV for `range` into `dir`.
    pub fn export(&self, range: ExportRange, dir: &Path) -> Result<PathBuf, ExportError> {
        export::export_to_dir(dir, &self.export_tasks(range), range, self.today())
    }
}
