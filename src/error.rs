//! Error types shared by the tracker library.

use thiserror::Error;

/// User input rejected before any state changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title was empty after trimming.
    #[error("Task title must not be empty")]
    EmptyTitle,

    /// Date failed submit validation.
    #[error("Please enter a valid date with a 4-digit year between 1900 and 2100 (got {0:?})")]
    InvalidDate(String),

    /// Hours were negative.
    #[error("Hours must not be negative (got {0})")]
    NegativeHours(String),

    /// Unknown workflow status.
    #[error("Unknown status: {0} (expected todo, inprogress, onhold or done)")]
    UnknownStatus(String),

    /// Unknown filter window.
    #[error("Unknown filter: {0} (expected day, week, month or all)")]
    UnknownFilter(String),

    /// Unknown export range.
    #[error("Unknown export range: {0} (expected current, day, week, month or all)")]
    UnknownRange(String),

    /// Heatmap year outside the supported calendar.
    #[error("Unsupported year: {0}")]
    InvalidYear(i32),

    /// Heatmap month was neither `all` nor 0..=11.
    #[error("Unknown month: {0} (expected all or 0-11)")]
    UnknownMonth(String),
}

/// Failures at the local storage boundary.
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Collection could not be serialized.
    #[error("Failed to serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures reported by a sync backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Task id does not exist in the identity's collection.
    #[error("Task not found: {0}")]
    NotFound(String),

    /// Backend refused or failed the write.
    #[error("Remote write failed: {0}")]
    Write(String),

    /// Backend could not be reached or read.
    #[error("Remote unavailable: {0}")]
    Unavailable(String),
}

/// Failures while exporting tasks.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Nothing matched the requested range.
    #[error("No tasks to export for the selected range.")]
    Empty,

    /// CSV writer failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Output could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Any failure of a task store operation.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
