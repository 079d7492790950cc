use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::{open_string_enum, string_enum};

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[serde(rename_all = "lowercase")]
    pub enum Weekday {
        Monday => "monday",
        Tuesday => "tuesday",
        Wednesday => "wednesday",
        Thursday => "thursday",
        Friday => "friday",
        Saturday => "saturday",
        Sunday => "sunday",
    }
}

impl Weekday {
    pub fn from_date(date: NaiveDate) -> Self {
        date.weekday().into()
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

open_string_enum! {
    /// Classification of a scheduled day. Anything outside the known labels is
    /// carried through as `Other` so leave types added later still land somewhere.
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
    pub enum DayType {
        Normal => "normal",
        Rest => "rest",
        Compensated => "compensated",
        Vacation => "vacation",
        Permission => "permission",
    }
}

impl DayType {
    pub fn is_working(&self) -> bool {
        matches!(self, DayType::Normal)
    }

    /// Capitalised label used in reports, e.g. "Rest" or "Vacation".
    pub fn display_label(&self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl Default for DayType {
    fn default() -> Self {
        DayType::Normal
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "lowercase")]
    pub enum Shift {
        Morning => "morning",
        Afternoon => "afternoon",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
    #[serde(rename_all = "snake_case")]
    pub enum ScheduleOrigin {
        #[default]
        Manual => "manual",
        LeaveRequest => "leave_request",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
    #[serde(rename_all = "lowercase")]
    pub enum WeekStatus {
        #[default]
        Draft => "draft",
        Active => "active",
        Historical => "historical",
    }
}

/// Per-employee, per-weekday template.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BaseDaySchedule {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub weekday: Weekday,
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
    pub lunch_start: Option<NaiveTime>,
    pub lunch_end: Option<NaiveTime>,
    pub day_type: DayType,
    pub shift: Option<Shift>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseDayScheduleInput {
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
    pub lunch_start: Option<NaiveTime>,
    pub lunch_end: Option<NaiveTime>,
    #[serde(default)]
    pub day_type: DayType,
    pub shift: Option<Shift>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WeekSchedule {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: WeekStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct WeekScheduleInput {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub id: Uuid,
    pub week_schedule_id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
    pub lunch_start: Option<NaiveTime>,
    pub lunch_end: Option<NaiveTime>,
    pub day_type: DayType,
    pub shift: Option<Shift>,
    pub origin: ScheduleOrigin,
    pub leave_request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DaySchedule {
    /// Rows produced by an approved leave request cannot be edited by hand.
    pub fn is_locked(&self) -> bool {
        self.origin == ScheduleOrigin::LeaveRequest
    }

    pub fn fields(&self) -> DayFields {
        DayFields {
            entry_time: self.entry_time,
            exit_time: self.exit_time,
            lunch_start: self.lunch_start,
            lunch_end: self.lunch_end,
            day_type: self.day_type.clone(),
            shift: self.shift,
            origin: self.origin,
            leave_request_id: self.leave_request_id,
        }
    }
}

/// The mutable part of a day row, written as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayFields {
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
    pub lunch_start: Option<NaiveTime>,
    pub lunch_end: Option<NaiveTime>,
    pub day_type: DayType,
    pub shift: Option<Shift>,
    pub origin: ScheduleOrigin,
    pub leave_request_id: Option<Uuid>,
}

impl DayFields {
    /// Manual day copied from a base template, or a bare normal day when there is none.
    pub fn from_base(base: Option<&BaseDaySchedule>) -> Self {
        match base {
            Some(base) => DayFields {
                entry_time: base.entry_time,
                exit_time: base.exit_time,
                lunch_start: base.lunch_start,
                lunch_end: base.lunch_end,
                day_type: base.day_type.clone(),
                shift: base.shift,
                origin: ScheduleOrigin::Manual,
                leave_request_id: None,
            },
            None => DayFields::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDaySchedule {
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub fields: DayFields,
}

impl NewDaySchedule {
    pub fn weekday(&self) -> Weekday {
        Weekday::from_date(self.date)
    }
}

/// Partial edit of a day row. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayScheduleUpdate {
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
    pub lunch_start: Option<NaiveTime>,
    pub lunch_end: Option<NaiveTime>,
    pub day_type: Option<DayType>,
    pub shift: Option<Shift>,
}

impl DayScheduleUpdate {
    pub fn is_empty(&self) -> bool {
        self.entry_time.is_none()
            && self.exit_time.is_none()
            && self.lunch_start.is_none()
            && self.lunch_end.is_none()
            && self.day_type.is_none()
            && self.shift.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekScheduleDetail {
    pub week: WeekSchedule,
    pub days: Vec<DaySchedule>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEditOutcome {
    pub updated: Vec<DaySchedule>,
    pub skipped: Vec<Uuid>,
}
