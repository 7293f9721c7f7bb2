//! CSV export of the task collection.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use csv::{Terminator, WriterBuilder};
use tracing::info;

use crate::date::format_date;
use crate::error::{ExportError, ValidationError};
use crate::filter::{filter, FilterType};
use crate::task::Task;

const HEADER: [&str; 5] = ["Date", "Title", "Status", "Hours", "Notes"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportRange {
    /// Whatever the board currently shows.
    Current,
    Day,
    Week,
    Month,
    All,
}

impl ExportRange {
    pub const ALL: [Self; 5] = [Self::Current, Self::Day, Self::Week, Self::Month, Self::All];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
        }
    }
}

impl FromStr for ExportRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownRange(s.to_owned()))
    }
}

impl fmt::Display for ExportRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tasks covered by `range`. `Current` uses the board's active window;
/// the fixed windows are relative to `today`.
pub fn select<'a>(
    tasks: &'a [Task],
    range: ExportRange,
    current: (FilterType, NaiveDate),
    today: NaiveDate,
) -> Vec<&'a Task> {
    match range {
        ExportRange::Current => filter(tasks, current.0, current.1),
        ExportRange::Day => filter(tasks, FilterType::Day, today),
        ExportRange::Week => filter(tasks, FilterType::Week, today),
        ExportRange::Month => filter(tasks, FilterType::Month, today),
        ExportRange::All => filter(tasks, FilterType::All, today),
    }
}

/// Render tasks as CSV with a header row. Only fields holding a quote,
/// comma or line break are quoted.
pub fn to_csv(tasks: &[&Task]) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for task in tasks {
        writer.write_record([
            format_date(task.date),
            task.title.clone(),
            task.status.label().to_owned(),
            task.hours.to_string(),
            task.notes.clone(),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err).into())
}

/// `yolo-tasks-<range>-<today>.csv`
pub fn file_name(range: ExportRange, today: NaiveDate) -> String {
    format!("yolo-tasks-{range}-{}.csv", format_date(today))
}

/// Write the selected tasks into `dir` and return the file path.
pub fn export_to_dir(
    dir: &Path,
    tasks: &[&Task],
    range: ExportRange,
    today: NaiveDate,
) -> Result<PathBuf, ExportError> {
    if tasks.is_empty() {
        return Err(ExportError::Empty);
    }
    let csv = to_csv(tasks)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name(range, today));
    fs::write(&path, csv)?;
    info!(path = %path.display(), count = tasks.len(), "Exported tasks");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::task::{TaskInput, TaskStatus};

    fn d(value: &str) -> NaiveDate {
        value.parse().unwrap()
    }

    fn task(title: &str, date: &str) -> Task {
        let fields = TaskInput::new(title, date).hours("1.5").validate().unwrap();
        Task::new(fields, Utc::now())
    }

    #[test]
    fn quotes_are_doubled_and_wrapped() {
        let mut t = task(r#"Say "hi""#, "2024-03-15");
        t.status = TaskStatus::InProgress;
        t.notes = "a, b".into();
        let csv = to_csv(&[&t]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Date,Title,Status,Hours,Notes"));
        assert_eq!(
            lines.next(),
            Some(r#"2024-03-15,"Say ""hi""",In Progress,1.5,"a, b""#)
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn plain_fields_stay_unquoted() {
        let mut t = task("Plan week", "2024-03-15");
        t.notes = "line one\nline two".into();
        let csv = to_csv(&[&t]).unwrap();
        assert!(csv.contains("2024-03-15,Plan week,To Do,1.5,\"line one\nline two\"\n"));
    }

    #[test]
    fn whole_hours_have_no_fraction() {
        let mut t = task("x", "2024-03-15");
        t.hours = 2.0;
        assert!(to_csv(&[&t]).unwrap().contains(",To Do,2,"));
    }

    #[test]
    fn ranges_select_relative_to_today_or_board() {
        let tasks = vec![task("today", "2026-10-19"), task("sunday", "2026-10-18"), task("old", "2024-01-01")];
        let today = d("2026-10-19");
        let board = (FilterType::Month, d("2024-01-31"));
        let titles = |range| -> Vec<String> {
            select(&tasks, range, board, today).iter().map(|t| t.title.clone()).collect()
        };
        assert_eq!(titles(ExportRange::Current), ["old"]);
        assert_eq!(titles(ExportRange::Day), ["today"]);
        assert_eq!(titles(ExportRange::Week), ["today", "sunday"]);
        assert_eq!(titles(ExportRange::Month), ["today", "sunday"]);
        assert_eq!(titles(ExportRange::All).len(), 3);
    }

    #[test]
    fn export_writes_named_file_and_refuses_empty() {
        let dir = tempfile::tempdir().unwrap();
        let today = d("2026-10-19");
        let tasks = vec![task("x", "2026-10-19")];
        let refs: Vec<&Task> = tasks.iter().collect();

        let path = export_to_dir(dir.path(), &refs, ExportRange::All, today).unwrap();
        assert_eq!(path.file_name().unwrap(), "yolo-tasks-all-2026-10-19.csv");
        assert!(fs::read_to_string(&path).unwrap().starts_with("Date,Title"));

        assert!(matches!(
            export_to_dir(dir.path(), &[], ExportRange::Day, today),
            Err(ExportError::Empty)
        ));
    }
}
