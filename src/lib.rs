//! Personal daily task tracker: a kanban board over dated tasks with
//! day/week/month filters, an activity heatmap, CSV export and an optional
//! per-identity sync backend.

pub mod app;
pub mod config;
pub mod date;
pub mod error;
pub mod export;
pub mod filter;
pub mod heatmap;
pub mod storage;
pub mod store;
pub mod sync;
pub mod task;
pub mod ui;

pub use app::{Clock, Tracker, View};
pub use error::{ExportError, RemoteError, StorageError, TrackerError, ValidationError};
pub use filter::{filter, FilterType};
pub use heatmap::{activity_level, aggregate, Heatmap, MonthFilter};
pub use store::TaskStore;
pub use task::{Task, TaskId, TaskInput, TaskStatus};
