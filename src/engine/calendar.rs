//! Date ranges and day classification.

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Serialize;

use crate::database::models::{DayType, WeekSchedule};
use crate::error::AppError;

/// Shortest and longest span a week schedule may cover, inclusive.
pub const MIN_WEEK_DAYS: i64 = 5;
pub const MAX_WEEK_DAYS: i64 = 9;

/// Inclusive `[start, end]` range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::InvalidRange(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Range of `days` days beginning at `start`.
    pub fn starting_at(start: NaiveDate, days: i64) -> Result<Self, AppError> {
        if days < 1 {
            return Err(AppError::InvalidRange(format!(
                "a range needs at least one day, got {}",
                days
            )));
        }
        Self::new(start, start + Duration::days(days - 1))
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let count = self.len_days() as usize;
        self.start.iter_days().take(count)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Either boundary of one range falls inside the other, or one contains the other.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.contains(other.start)
            || self.contains(other.end)
            || other.contains(self.start)
            || other.contains(self.end)
    }

    pub fn intersection(&self, other: &DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateRange { start, end })
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl WeekSchedule {
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }
}

pub fn validate_week_span(range: &DateRange) -> Result<(), AppError> {
    let days = range.len_days();
    if !(MIN_WEEK_DAYS..=MAX_WEEK_DAYS).contains(&days) {
        return Err(AppError::InvalidRange(format!(
            "a week schedule must span {} to {} days, {} spans {}",
            MIN_WEEK_DAYS, MAX_WEEK_DAYS, range, days
        )));
    }
    Ok(())
}

/// How a resolved schedule treats a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayClass {
    /// Normal day; `entry` is the expected clock-in when one is set.
    Working { entry: Option<NaiveTime> },
    NonWorking(DayType),
    Unscheduled,
}

pub fn classify_day(day_type: Option<&DayType>, entry: Option<NaiveTime>) -> DayClass {
    match day_type {
        None => DayClass::Unscheduled,
        Some(day_type) if day_type.is_working() => DayClass::Working { entry },
        Some(day_type) => DayClass::NonWorking(day_type.clone()),
    }
}
