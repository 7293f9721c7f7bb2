use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::date::validate_date_input;
use crate::error::ValidationError;

/// Opaque task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Fresh id: UUID v7, a millisecond timestamp followed by random bits.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Workflow states, in board column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    OnHold,
    Done,
}

impl TaskStatus {
    pub const ALL: [Self; 4] = [Self::Todo, Self::InProgress, Self::OnHold, Self::Done];

    /// Storage key (`todo`, `inprogress`, ...).
    pub const fn key(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inprogress",
            Self::OnHold => "onhold",
            Self::Done => "done",
        }
    }

    /// Human readable label used by the board and CSV export.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::OnHold => "On Hold",
            Self::Done => "Done",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or_default()
    }

    /// Neighbouring column, clamped at both ends.
    pub fn shifted(self, direction: isize) -> Self {
        let last = Self::ALL.len() as isize - 1;
        let index = (self.index() as isize + direction).clamp(0, last) as usize;
        Self::ALL[index]
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_owned()))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub date: NaiveDate,
    pub status: TaskStatus,
    #[serde(default)]
    pub hours: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a new record from validated fields.
    pub fn new(fields: TaskFields, now: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::generate(),
            title: fields.title,
            date: fields.date,
            status: fields.status,
            hours: fields.hours,
            notes: fields.notes,
            created_at: now,
            updated_at: None,
        }
    }

    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(hours) = patch.hours {
            self.hours = hours;
        }
        if let Some(notes) = &patch.notes {
            self.notes.clone_from(notes);
        }
        self.updated_at = Some(patch.updated_at);
    }
}

/// Raw form input, as typed by the user.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub title: String,
    pub date: String,
    pub status: TaskStatus,
    pub hours: String,
    pub notes: String,
}

impl TaskInput {
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            status: TaskStatus::Todo,
            hours: String::new(),
            notes: String::new(),
        }
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn hours(mut self, hours: impl Into<String>) -> Self {
        self.hours = hours.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Check every field and normalise it into [`TaskFields`].
    pub fn validate(&self) -> Result<TaskFields, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(TaskFields {
            title: title.to_owned(),
            date: validate_date_input(&self.date)?,
            status: self.status,
            hours: parse_hours(&self.hours)?,
            notes: self.notes.clone(),
        })
    }
}

/// Validated mutable fields of a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFields {
    pub title: String,
    pub date: NaiveDate,
    pub status: TaskStatus,
    pub hours: f64,
    pub notes: String,
}

impl From<&Task> for TaskFields {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            date: task.date,
            status: task.status,
            hours: task.hours,
            notes: task.notes.clone(),
        }
    }
}

/// Partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TaskPatch {
    /// Replace every mutable field.
    pub fn replace(fields: TaskFields, now: DateTime<Utc>) -> Self {
        Self {
            title: Some(fields.title),
            date: Some(fields.date),
            status: Some(fields.status),
            hours: Some(fields.hours),
            notes: Some(fields.notes),
            updated_at: now,
        }
    }

    /// Status-only change.
    pub const fn status(status: TaskStatus, now: DateTime<Utc>) -> Self {
        Self {
            title: None,
            date: None,
            status: Some(status),
            hours: None,
            notes: None,
            updated_at: now,
        }
    }
}

/// Parse an hours field from its leading number (`2h` is 2). Blank or
/// non-numeric text counts as zero.
pub fn parse_hours(value: &str) -> Result<f64, ValidationError> {
    let hours = leading_number(value.trim()).unwrap_or(0.0);
    if !hours.is_finite() {
        return Ok(0.0);
    }
    if hours < 0.0 {
        return Err(ValidationError::NegativeHours(value.trim().to_owned()));
    }
    Ok(hours)
}

/// Longest prefix of `value` that reads as a number.
fn leading_number(value: &str) -> Option<f64> {
    value
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .filter_map(|end| value[..end].parse::<f64>().ok())
        .last()
}
