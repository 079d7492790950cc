use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use super::{DayType, Role, Weekday};

/// Where the schedule used for a report row came from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSource {
    WeekSchedule,
    BaseSchedule,
    None,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    OnTime,
    Late,
    Absent,
    Pending,
    Permission,
    NoSchedule,
    NonWorking(DayType),
}

impl ReportStatus {
    pub fn label(&self) -> String {
        match self {
            ReportStatus::OnTime => "On time".to_string(),
            ReportStatus::Late => "Late".to_string(),
            ReportStatus::Absent => "Absent".to_string(),
            ReportStatus::Pending => "Pending".to_string(),
            ReportStatus::Permission => "Permission".to_string(),
            ReportStatus::NoSchedule => "No schedule".to_string(),
            ReportStatus::NonWorking(day_type) => day_type.display_label(),
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// One reconciled (employee, date) line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub role: Role,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub source: ScheduleSource,
    pub day_type: Option<DayType>,
    pub scheduled_entry: Option<NaiveTime>,
    pub scheduled_exit: Option<NaiveTime>,
    pub actual_entry: Option<NaiveTime>,
    pub actual_exit: Option<NaiveTime>,
    pub status: ReportStatus,
    pub status_label: String,
    pub lateness_minutes: Option<i64>,
    pub observations: Option<String>,
    pub auto_closed: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeReportSummary {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub on_time: u32,
    pub late: u32,
    pub absent: u32,
    pub pending: u32,
    pub permission: u32,
    pub non_working: u32,
    pub no_schedule: u32,
    pub total_late_minutes: i64,
}
