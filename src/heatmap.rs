//! Contribution-graph style activity calendar.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Month, NaiveDate};

use crate::date::{last_day_of_month, week_start};
use crate::error::ValidationError;
use crate::task::Task;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Years offered in the year picker besides the current one.
const YEAR_OPTION_RANGE: std::ops::RangeInclusive<i32> = 2020..=2100;

/// Whole year or a single month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    Month(Month),
}

impl MonthFilter {
    /// Zero-based month index, matching the picker values.
    pub fn from_index(index: u32) -> Option<Self> {
        let number = u8::try_from(index.checked_add(1)?).ok()?;
        Month::try_from(number).ok().map(Self::Month)
    }

    fn matches(self, date: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Month(month) => date.month() == month.number_from_month(),
        }
    }
}

impl FromStr for MonthFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<u32>()
            .ok()
            .and_then(Self::from_index)
            .ok_or_else(|| ValidationError::UnknownMonth(s.to_owned()))
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Month(month) => write!(f, "{}", month.number_from_month() - 1),
        }
    }
}

/// Intensity bucket for a day's task count.
pub const fn activity_level(count: usize) -> u8 {
    match count {
        0 => 0,
        1 => 1,
        2..=3 => 2,
        4..=5 => 3,
        _ => 4,
    }
}

/// Inclusive display range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatmapCell {
    Day { date: NaiveDate, count: usize, level: u8 },
    /// Before the range start or after today.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub year: i32,
    pub month: MonthFilter,
    pub per_day: BTreeMap<NaiveDate, usize>,
    pub total_tasks: usize,
    pub total_hours: f64,
    pub active_days: usize,
    pub range: DateRange,
}

/// Count tasks per day for `year` (and `month`), with the display range
/// clamped to `today` when the period contains it.
pub fn aggregate(
    tasks: &[Task],
    year: i32,
    month: MonthFilter,
    today: NaiveDate,
) -> Result<Heatmap, ValidationError> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut total_hours = 0.0;
    let mut total_tasks = 0;
    for task in tasks
        .iter()
        .filter(|t| t.date.year() == year && month.matches(t.date))
    {
        *per_day.entry(task.date).or_default() += 1;
        total_tasks += 1;
        total_hours += task.hours;
    }

    Ok(Heatmap {
        year,
        month,
        active_days: per_day.len(),
        per_day,
        total_tasks,
        total_hours,
        range: display_range(year, month, today)?,
    })
}

fn display_range(year: i32, month: MonthFilter, today: NaiveDate) -> Result<DateRange, ValidationError> {
    let invalid = || ValidationError::InvalidYear(year);
    let (start, end, contains_today) = match month {
        MonthFilter::All => (
            NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?,
            NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?,
            today.year() == year,
        ),
        MonthFilter::Month(m) => {
            let number = m.number_from_month();
            (
                NaiveDate::from_ymd_opt(year, number, 1).ok_or_else(invalid)?,
                last_day_of_month(year, number).ok_or_else(invalid)?,
                today.year() == year && today.month() == number,
            )
        }
    };
    Ok(DateRange {
        start,
        end: if contains_today { today } else { end },
    })
}

impl Heatmap {
    pub fn count(&self, date: NaiveDate) -> usize {
        self.per_day.get(&date).copied().unwrap_or_default()
    }

    pub fn level(&self, date: NaiveDate) -> u8 {
        activity_level(self.count(date))
    }

    /// Week columns from the Sunday on or before the range start. Every
    /// week has seven cells so the grid stays rectangular.
    pub fn weeks(&self, today: NaiveDate) -> Vec<[HeatmapCell; 7]> {
        let mut weeks = Vec::new();
        let mut current = week_start(self.range.start);
        while current <= self.range.end {
            let mut week = [HeatmapCell::Placeholder; 7];
            for (offset, cell) in (0i64..).zip(week.iter_mut()) {
                let date = current + Duration::days(offset);
                if date <= today && date >= self.range.start {
                    let count = self.count(date);
                    *cell = HeatmapCell::Day {
                        date,
                        count,
                        level: activity_level(count),
                    };
                }
            }
            weeks.push(week);
            current += Duration::days(7);
        }
        weeks
    }

    /// `2024` or `Mar 2024`.
    pub fn period_label(&self) -> String {
        match self.month {
            MonthFilter::All => self.year.to_string(),
            MonthFilter::Month(m) => format!("{} {}", month_name(m), self.year),
        }
    }

    pub fn month_labels(&self) -> Vec<&'static str> {
        match self.month {
            MonthFilter::All => MONTH_NAMES.to_vec(),
            MonthFilter::Month(m) => vec![month_name(m)],
        }
    }
}

fn month_name(month: Month) -> &'static str {
    MONTH_NAMES[month.number_from_month() as usize - 1]
}

/// Hover text for a heatmap day.
pub fn tooltip(date: NaiveDate, count: usize) -> String {
    let day = date.format("%a, %b %-d, %Y");
    match count {
        0 => format!("No contributions on {day}"),
        1 => format!("1 contribution on {day}"),
        n => format!("{n} contributions on {day}"),
    }
}

/// Years for the picker: the current one plus any task year in range, newest first.
pub fn year_options(tasks: &[Task], today: NaiveDate) -> Vec<i32> {
    let mut years: BTreeSet<i32> = tasks
        .iter()
        .map(|t| t.date.year())
        .filter(|y| YEAR_OPTION_RANGE.contains(y))
        .collect();
    years.insert(today.year());
    years.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::task::TaskInput;

    fn d(value: &str) -> NaiveDate {
        value.parse().unwrap()
    }

    fn task(date: &str, hours: &str) -> Task {
        let fields = TaskInput::new("t", date).hours(hours).validate().unwrap();
        Task::new(fields, Utc::now())
    }

    #[test]
    fn level_thresholds() {
        let levels: Vec<u8> = [0, 1, 2, 3, 4, 5, 6, 100]
            .into_iter()
            .map(activity_level)
            .collect();
        assert_eq!(levels, [0, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn march_scenario() {
        let tasks = vec![task("2024-03-15", "2")];
        let map = aggregate(&tasks, 2024, "2".parse().unwrap(), d("2026-10-19")).unwrap();
        assert_eq!(map.total_tasks, 1);
        assert_eq!(map.total_hours, 2.0);
        assert_eq!(map.active_days, 1);
        assert_eq!(map.level(d("2024-03-15")), 1);
        assert_eq!(map.range, DateRange { start: d("2024-03-01"), end: d("2024-03-31") });
        assert_eq!(map.period_label(), "Mar 2024");
    }

    #[test]
    fn counts_tasks_not_hours_and_filters_period() {
        let tasks = vec![
            task("2024-05-01", "8"),
            task("2024-05-01", "0"),
            task("2024-06-01", "1"),
            task("2023-05-01", "1"),
        ];
        let year = aggregate(&tasks, 2024, MonthFilter::All, d("2026-01-01")).unwrap();
        assert_eq!(year.count(d("2024-05-01")), 2);
        assert_eq!(year.total_tasks, 3);
        assert_eq!(year.active_days, 2);
        assert_eq!(year.total_hours, 9.0);

        let may = aggregate(&tasks, 2024, MonthFilter::from_index(4).unwrap(), d("2026-01-01")).unwrap();
        assert_eq!(may.total_tasks, 2);
        assert_eq!(may.active_days, 1);
    }

    #[test]
    fn range_clamps_to_today_only_in_current_period() {
        let today = d("2026-10-19");
        let year = aggregate(&[], 2026, MonthFilter::All, today).unwrap();
        assert_eq!(year.range, DateRange { start: d("2026-01-01"), end: today });

        let october = aggregate(&[], 2026, "9".parse().unwrap(), today).unwrap();
        assert_eq!(october.range, DateRange { start: d("2026-10-01"), end: today });

        let september = aggregate(&[], 2026, "8".parse().unwrap(), today).unwrap();
        assert_eq!(september.range.end, d("2026-09-30"));

        let past = aggregate(&[], 2025, MonthFilter::All, today).unwrap();
        assert_eq!(past.range.end, d("2025-12-31"));
    }

    #[test]
    fn grid_is_rectangular_with_placeholders() {
        // March 2024 starts on a Friday.
        let map = aggregate(&[task("2024-03-15", "1")], 2024, "2".parse().unwrap(), d("2026-01-01")).unwrap();
        let weeks = map.weeks(d("2026-01-01"));
        assert_eq!(weeks.len(), 6);
        assert!(weeks[0][..5].iter().all(|c| *c == HeatmapCell::Placeholder));
        assert_eq!(
            weeks[0][5],
            HeatmapCell::Day { date: d("2024-03-01"), count: 0, level: 0 }
        );
        assert_eq!(
            weeks[2][5],
            HeatmapCell::Day { date: d("2024-03-15"), count: 1, level: 1 }
        );
        // Trailing April days before today stay visible with zero counts.
        assert_eq!(
            weeks[5][6],
            HeatmapCell::Day { date: d("2024-04-06"), count: 0, level: 0 }
        );
    }

    #[test]
    fn days_after_today_are_placeholders() {
        let today = d("2026-10-19"); // Monday
        let map = aggregate(&[], 2026, "9".parse().unwrap(), today).unwrap();
        let last = map.weeks(today).pop().unwrap();
        assert!(matches!(last[1], HeatmapCell::Day { .. }));
        assert!(last[2..].iter().all(|c| *c == HeatmapCell::Placeholder));
    }

    #[test]
    fn month_filter_parsing() {
        assert_eq!("all".parse::<MonthFilter>(), Ok(MonthFilter::All));
        assert_eq!("0".parse::<MonthFilter>(), Ok(MonthFilter::Month(Month::January)));
        assert_eq!("11".parse::<MonthFilter>(), Ok(MonthFilter::Month(Month::December)));
        assert!("12".parse::<MonthFilter>().is_err());
        assert_eq!(MonthFilter::Month(Month::March).to_string(), "2");
    }

    #[test]
    fn tooltips_and_years() {
        assert_eq!(tooltip(d("2024-03-05"), 0), "No contributions on Tue, Mar 5, 2024");
        assert_eq!(tooltip(d("2024-03-05"), 1), "1 contribution on Tue, Mar 5, 2024");
        assert_eq!(tooltip(d("2024-03-05"), 3), "3 contributions on Tue, Mar 5, 2024");

        let tasks = vec![task("2019-01-01", "0"), task("2024-01-01", "0"), task("2024-02-01", "0")];
        assert_eq!(year_options(&tasks, d("2026-10-19")), [2026, 2024]);
    }
}
