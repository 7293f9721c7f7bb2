//! Date-window filtering and the board groupings built on top of it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::date::{same_month, week_window};
use crate::error::ValidationError;
use crate::task::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    #[default]
    Day,
    Week,
    Month,
    All,
}

impl FilterType {
    pub const ALL: [Self; 4] = [Self::Day, Self::Week, Self::Month, Self::All];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
        }
    }

    /// Next window in `ALL`, wrapping around.
    pub fn cycled(self) -> Self {
        let index = Self::ALL.iter().position(|f| *f == self).unwrap_or_default();
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Does `date` fall inside this window around `anchor`?
    pub fn contains(self, date: NaiveDate, anchor: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Day => date == anchor,
            Self::Week => {
                let (start, end) = week_window(anchor);
                start <= date && date <= end
            }
            Self::Month => same_month(date, anchor),
        }
    }
}

impl FromStr for FilterType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownFilter(s.to_owned()))
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tasks inside the window, in collection order.
pub fn filter(tasks: &[Task], filter_type: FilterType, anchor: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| filter_type.contains(t.date, anchor))
        .collect()
}

/// Kanban column contents.
pub fn by_status<'a>(tasks: &[&'a Task], status: TaskStatus) -> Vec<&'a Task> {
    tasks.iter().copied().filter(|t| t.status == status).collect()
}

/// List view groups, newest date first.
pub fn group_by_date<'a>(tasks: &[&'a Task]) -> Vec<(NaiveDate, Vec<&'a Task>)> {
    let mut groups: BTreeMap<NaiveDate, Vec<&'a Task>> = BTreeMap::new();
    for task in tasks {
        groups.entry(task.date).or_default().push(task);
    }
    groups.into_iter().rev().collect()
}

/// Totals shown above the board.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub hours: f64,
}

impl Stats {
    pub fn from_tasks(tasks: &[&Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut stats, task| {
            stats.total += 1;
            match task.status {
                TaskStatus::Done => stats.completed += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Todo | TaskStatus::OnHold => {}
            }
            stats.hours += task.hours;
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::task::TaskInput;

    fn task(title: &str, date: &str, status: TaskStatus) -> Task {
        let fields = TaskInput::new(title, date).status(status).hours("1").validate().unwrap();
        Task::new(fields, Utc::now())
    }

    fn d(value: &str) -> NaiveDate {
        value.parse().unwrap()
    }

    fn titles(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.title.clone()).collect()
    }

    fn sample() -> Vec<Task> {
        vec![
            task("sat-before", "2024-03-16", TaskStatus::Todo),
            task("sun", "2024-03-17", TaskStatus::Done),
            task("wed", "2024-03-20", TaskStatus::InProgress),
            task("sat", "2024-03-23", TaskStatus::Todo),
            task("sun-after", "2024-03-24", TaskStatus::OnHold),
            task("april", "2024-04-01", TaskStatus::Todo),
            task("last-year", "2023-03-20", TaskStatus::Todo),
        ]
    }

    #[test]
    fn all_returns_everything_in_order() {
        let tasks = sample();
        let all = filter(&tasks, FilterType::All, d("1999-01-01"));
        assert_eq!(all.len(), tasks.len());
        assert!(all.iter().zip(&tasks).all(|(a, b)| a.id == b.id));
    }

    #[test]
    fn day_matches_exact_date() {
        let tasks = sample();
        assert_eq!(titles(&filter(&tasks, FilterType::Day, d("2024-03-20"))), ["wed"]);
        assert!(filter(&tasks, FilterType::Day, d("2024-03-21")).is_empty());
    }

    #[test]
    fn week_is_sunday_to_saturday_inclusive() {
        let tasks = sample();
        assert_eq!(
            titles(&filter(&tasks, FilterType::Week, d("2024-03-20"))),
            ["sun", "wed", "sat"]
        );
    }

    #[test]
    fn month_requires_same_year() {
        let tasks = sample();
        assert_eq!(
            titles(&filter(&tasks, FilterType::Month, d("2024-03-01"))),
            ["sat-before", "sun", "wed", "sat", "sun-after"]
        );
    }

    #[test]
    fn columns_groups_and_stats() {
        let tasks = sample();
        let visible = filter(&tasks, FilterType::Week, d("2024-03-20"));
        assert_eq!(titles(&by_status(&visible, TaskStatus::Todo)), ["sat"]);

        let groups = group_by_date(&visible);
        let dates: Vec<_> = groups.iter().map(|(date, _)| date.to_string()).collect();
        assert_eq!(dates, ["2024-03-23", "2024-03-20", "2024-03-17"]);

        let stats = Stats::from_tasks(&visible);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.hours, 3.0);
    }

    #[test]
    fn parse_and_cycle() {
        assert_eq!("Week".parse::<FilterType>(), Ok(FilterType::Week));
        assert!("year".parse::<FilterType>().is_err());
        assert_eq!(FilterType::All.cycled(), FilterType::Day);
    }
}
