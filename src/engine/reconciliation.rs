//! Merging schedules and punches into one status line per (employee, date).
//!
//! Schedule priority is fixed: the active week's day row wins, the base
//! template for the weekday is the fallback, and with neither the day is
//! unscheduled. Non-working day types short-circuit everything else, so an
//! employee who punched in on a rest day is still reported as resting.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::database::models::{
    AttendanceRecord, AttendanceStatus, BaseDaySchedule, DaySchedule, DayType, Employee,
    EmployeeReportSummary, ReportRow, ReportStatus, ScheduleSource, Weekday,
};
use crate::engine::calendar::{DateRange, DayClass, classify_day};
use crate::engine::week_plan::BaseScheduleIndex;

pub const LATE_PUNCH_OBSERVATION: &str = "Late punch";
pub const OBSERVATION_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendancePolicy {
    /// Entries later than this past the scheduled time are late. The boundary itself is on time.
    pub late_tolerance: Duration,
    pub auto_checkout_after: Duration,
    pub auto_checkout_shift: Duration,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            late_tolerance: Duration::minutes(5),
            auto_checkout_after: Duration::hours(12),
            auto_checkout_shift: Duration::hours(9),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchedule {
    pub source: ScheduleSource,
    pub day_type: Option<DayType>,
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
}

impl ResolvedSchedule {
    pub fn none() -> Self {
        Self {
            source: ScheduleSource::None,
            day_type: None,
            entry_time: None,
            exit_time: None,
        }
    }

    pub fn class(&self) -> DayClass {
        classify_day(self.day_type.as_ref(), self.entry_time)
    }
}

pub fn resolve_schedule(
    week_day: Option<&DaySchedule>,
    base: Option<&BaseDaySchedule>,
) -> ResolvedSchedule {
    if let Some(day) = week_day {
        return ResolvedSchedule {
            source: ScheduleSource::WeekSchedule,
            day_type: Some(day.day_type.clone()),
            entry_time: day.entry_time,
            exit_time: day.exit_time,
        };
    }
    if let Some(base) = base {
        return ResolvedSchedule {
            source: ScheduleSource::BaseSchedule,
            day_type: Some(base.day_type.clone()),
            entry_time: base.entry_time,
            exit_time: base.exit_time,
        };
    }
    ResolvedSchedule::none()
}

/// Whole minutes after the scheduled entry, or `None` when within tolerance.
pub fn lateness(policy: &AttendancePolicy, scheduled: NaiveTime, actual: NaiveTime) -> Option<i64> {
    let delta = actual - scheduled;
    (delta > policy.late_tolerance).then(|| delta.num_minutes())
}

/// Status stored on a fresh entry punch.
pub fn entry_status(
    policy: &AttendancePolicy,
    schedule: &ResolvedSchedule,
    actual: NaiveTime,
) -> AttendanceStatus {
    match schedule.entry_time {
        Some(scheduled) if lateness(policy, scheduled, actual).is_some() => AttendanceStatus::Late,
        _ => AttendanceStatus::Present,
    }
}

/// Joins non-empty observation fragments with `" | "`.
pub fn merge_observations(existing: Option<&str>, addition: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [existing, addition]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    (!parts.is_empty()).then(|| parts.join(OBSERVATION_SEPARATOR))
}

fn day_status(
    policy: &AttendancePolicy,
    schedule: &ResolvedSchedule,
    record: Option<&AttendanceRecord>,
    date: NaiveDate,
    today: NaiveDate,
) -> (ReportStatus, Option<i64>) {
    match schedule.class() {
        DayClass::Unscheduled => (ReportStatus::NoSchedule, None),
        DayClass::NonWorking(day_type) => (ReportStatus::NonWorking(day_type), None),
        DayClass::Working { entry } => {
            let actual_entry = record.and_then(|r| r.entry_time);
            match (actual_entry, record) {
                (Some(actual), _) => {
                    match entry.and_then(|scheduled| lateness(policy, scheduled, actual)) {
                        Some(minutes) => (ReportStatus::Late, Some(minutes)),
                        None => (ReportStatus::OnTime, Some(0)),
                    }
                }
                (None, Some(r)) if r.status == AttendanceStatus::Permission => {
                    (ReportStatus::Permission, None)
                }
                _ if date <= today => (ReportStatus::Absent, None),
                _ => (ReportStatus::Pending, None),
            }
        }
    }
}

pub fn reconcile_day(
    policy: &AttendancePolicy,
    employee: &Employee,
    date: NaiveDate,
    today: NaiveDate,
    schedule: &ResolvedSchedule,
    record: Option<&AttendanceRecord>,
) -> ReportRow {
    let (status, lateness_minutes) = day_status(policy, schedule, record, date, today);

    ReportRow {
        employee_id: employee.id,
        employee_name: employee.full_name.clone(),
        role: employee.role,
        date,
        weekday: Weekday::from_date(date),
        source: schedule.source,
        day_type: schedule.day_type.clone(),
        scheduled_entry: schedule.entry_time,
        scheduled_exit: schedule.exit_time,
        actual_entry: record.and_then(|r| r.entry_time),
        actual_exit: record.and_then(|r| r.exit_time),
        status_label: status.label(),
        status,
        lateness_minutes,
        observations: record.and_then(|r| r.observations.clone()),
        auto_closed: record.is_some_and(|r| r.auto_closed),
    }
}

/// Everything a range report reads, already loaded.
pub struct ReportInputs<'a> {
    pub employees: &'a [Employee],
    /// Day rows of active weeks intersecting the range.
    pub week_days: &'a [DaySchedule],
    pub base: &'a BaseScheduleIndex,
    pub records: &'a [AttendanceRecord],
}

/// One row per (eligible employee, date), grouped by employee in input order.
pub fn build_report(
    policy: &AttendancePolicy,
    range: &DateRange,
    today: NaiveDate,
    inputs: &ReportInputs<'_>,
) -> Vec<ReportRow> {
    let week_days: HashMap<(Uuid, NaiveDate), &DaySchedule> = inputs
        .week_days
        .iter()
        .map(|day| ((day.employee_id, day.date), day))
        .collect();
    let records: HashMap<(Uuid, NaiveDate), &AttendanceRecord> = inputs
        .records
        .iter()
        .map(|record| ((record.employee_id, record.date), record))
        .collect();

    let mut rows = Vec::new();
    for employee in inputs.employees.iter().filter(|e| e.is_eligible()) {
        for date in range.days() {
            let key = (employee.id, date);
            let schedule = resolve_schedule(
                week_days.get(&key).copied(),
                inputs.base.for_date(employee.id, date),
            );
            let record = records.get(&key).copied();
            rows.push(reconcile_day(policy, employee, date, today, &schedule, record));
        }
    }
    rows
}

/// Per-employee tallies, in the order employees first appear in `rows`.
pub fn summarize(rows: &[ReportRow]) -> Vec<EmployeeReportSummary> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut summaries: HashMap<Uuid, EmployeeReportSummary> = HashMap::new();

    for row in rows {
        let summary = summaries.entry(row.employee_id).or_insert_with(|| {
            order.push(row.employee_id);
            EmployeeReportSummary {
                employee_id: row.employee_id,
                employee_name: row.employee_name.clone(),
                ..Default::default()
            }
        });

        match &row.status {
            ReportStatus::OnTime => summary.on_time += 1,
            ReportStatus::Late => {
                summary.late += 1;
                summary.total_late_minutes += row.lateness_minutes.unwrap_or(0);
            }
            ReportStatus::Absent => summary.absent += 1,
            ReportStatus::Pending => summary.pending += 1,
            ReportStatus::Permission => summary.permission += 1,
            ReportStatus::NoSchedule => summary.no_schedule += 1,
            ReportStatus::NonWorking(_) => summary.non_working += 1,
        }
    }

    order
        .into_iter()
        .filter_map(|id| summaries.remove(&id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Role, ScheduleOrigin};
    use crate::engine::test_support::*;
    use pretty_assertions::assert_eq;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn base_only(entry: NaiveTime) -> ResolvedSchedule {
        ResolvedSchedule {
            source: ScheduleSource::BaseSchedule,
            day_type: Some(DayType::Normal),
            entry_time: Some(entry),
            exit_time: None,
        }
    }

    #[test]
    fn test_lateness_boundary_is_exclusive() {
        let policy = AttendancePolicy::default();
        assert_eq!(lateness(&policy, time(8, 0), hms(8, 5, 0)), None);
        assert_eq!(lateness(&policy, time(8, 0), hms(8, 5, 1)), Some(5));
        assert_eq!(lateness(&policy, time(8, 0), time(8, 6)), Some(6));
        assert_eq!(lateness(&policy, time(8, 0), time(7, 40)), None);
    }

    #[test]
    fn test_report_on_time_and_late_at_boundary() {
        let policy = AttendancePolicy::default();
        let tech = employee(Role::Technician);
        let monday = date(2025, 2, 3);
        let schedule = base_only(time(8, 0));

        let on_time = attendance(tech.id, monday, Some(hms(8, 5, 0)));
        let row = reconcile_day(&policy, &tech, monday, monday, &schedule, Some(&on_time));
        assert_eq!(row.status, ReportStatus::OnTime);
        assert_eq!(row.status_label, "On time");
        assert_eq!(row.lateness_minutes, Some(0));

        let late = attendance(tech.id, monday, Some(hms(8, 5, 1)));
        let row = reconcile_day(&policy, &tech, monday, monday, &schedule, Some(&late));
        assert_eq!(row.status, ReportStatus::Late);
        assert_eq!(row.status_label, "Late");
        assert_eq!(row.lateness_minutes, Some(5));
    }

    #[test]
    fn test_absent_in_past_pending_in_future() {
        let policy = AttendancePolicy::default();
        let tech = employee(Role::Technician);
        let base = BaseScheduleIndex::from_rows(vec![base_day(tech.id, Weekday::Monday, time(8, 0))]);
        let inputs = ReportInputs {
            employees: std::slice::from_ref(&tech),
            week_days: &[],
            base: &base,
            records: &[],
        };
        let monday = DateRange::single(date(2025, 2, 3));

        let past = build_report(&policy, &monday, date(2025, 2, 10), &inputs);
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].status, ReportStatus::Absent);
        assert_eq!(past[0].source, ScheduleSource::BaseSchedule);
        assert_eq!(past[0].lateness_minutes, None);

        let future = build_report(&policy, &monday, date(2025, 1, 27), &inputs);
        assert_eq!(future[0].status, ReportStatus::Pending);
        assert_eq!(future[0].lateness_minutes, None);
    }

    #[test]
    fn test_week_rest_day_wins_over_punch_and_base() {
        let policy = AttendancePolicy::default();
        let tech = employee(Role::Technician);
        let monday = date(2025, 2, 3);
        let mut rest = day_row(uuid::Uuid::new_v4(), tech.id, monday);
        rest.day_type = DayType::Rest;
        let base = BaseScheduleIndex::from_rows(vec![base_day(tech.id, Weekday::Monday, time(8, 0))]);
        let punched = attendance(tech.id, monday, Some(time(9, 30)));
        let week_days = [rest];
        let records = [punched];
        let inputs = ReportInputs {
            employees: std::slice::from_ref(&tech),
            week_days: &week_days,
            base: &base,
            records: &records,
        };

        let rows = build_report(&policy, &DateRange::single(monday), monday, &inputs);

        assert_eq!(rows[0].status, ReportStatus::NonWorking(DayType::Rest));
        assert_eq!(rows[0].status_label, "Rest");
        assert_eq!(rows[0].lateness_minutes, None);
        assert_eq!(rows[0].source, ScheduleSource::WeekSchedule);
        assert_eq!(rows[0].actual_entry, Some(time(9, 30)));
    }

    #[test]
    fn test_leave_overlay_reports_vacation() {
        let policy = AttendancePolicy::default();
        let tech = employee(Role::Noc);
        let day = date(2025, 2, 4);
        let mut overlaid = day_row(uuid::Uuid::new_v4(), tech.id, day);
        overlaid.day_type = DayType::Vacation;
        overlaid.origin = ScheduleOrigin::LeaveRequest;

        let schedule = resolve_schedule(Some(&overlaid), None);
        let row = reconcile_day(&policy, &tech, day, day, &schedule, None);
        assert_eq!(row.status_label, "Vacation");
    }

    #[test]
    fn test_permission_and_no_schedule() {
        let policy = AttendancePolicy::default();
        let tech = employee(Role::Helpdesk);
        let day = date(2025, 2, 4);

        let mut permission = attendance(tech.id, day, None);
        permission.status = AttendanceStatus::Permission;
        let row = reconcile_day(&policy, &tech, day, day, &base_only(time(8, 0)), Some(&permission));
        assert_eq!(row.status, ReportStatus::Permission);
        assert_eq!(row.lateness_minutes, None);

        let row = reconcile_day(&policy, &tech, day, day, &ResolvedSchedule::none(), None);
        assert_eq!(row.status, ReportStatus::NoSchedule);
        assert_eq!(row.status_label, "No schedule");
    }

    #[test]
    fn test_working_day_without_hours_is_on_time() {
        let policy = AttendancePolicy::default();
        let tech = employee(Role::Supervisor);
        let day = date(2025, 2, 4);
        let schedule = ResolvedSchedule {
            source: ScheduleSource::WeekSchedule,
            day_type: Some(DayType::Normal),
            entry_time: None,
            exit_time: None,
        };
        let record = attendance(tech.id, day, Some(time(11, 0)));

        let row = reconcile_day(&policy, &tech, day, day, &schedule, Some(&record));
        assert_eq!(row.status, ReportStatus::OnTime);
        assert_eq!(row.lateness_minutes, Some(0));
    }

    #[test]
    fn test_report_skips_ineligible_employees() {
        let policy = AttendancePolicy::default();
        let employees = vec![
            employee(Role::Admin),
            inactive(employee(Role::Noc)),
            employee(Role::Noc),
        ];
        let base = BaseScheduleIndex::default();
        let inputs = ReportInputs {
            employees: &employees,
            week_days: &[],
            base: &base,
            records: &[],
        };
        let range = DateRange::new(date(2025, 2, 3), date(2025, 2, 5)).unwrap();

        let rows = build_report(&policy, &range, date(2025, 2, 3), &inputs);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.employee_id == employees[2].id));
    }

    #[test]
    fn test_entry_status() {
        let policy = AttendancePolicy::default();
        let schedule = base_only(time(8, 0));
        assert_eq!(entry_status(&policy, &schedule, time(8, 5)), AttendanceStatus::Present);
        assert_eq!(entry_status(&policy, &schedule, time(8, 6)), AttendanceStatus::Late);
        assert_eq!(
            entry_status(&policy, &ResolvedSchedule::none(), time(23, 0)),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn test_merge_observations() {
        assert_eq!(merge_observations(None, None), None);
        assert_eq!(merge_observations(Some("  "), Some("")), None);
        assert_eq!(
            merge_observations(Some("Late punch"), Some("bus delayed")),
            Some("Late punch | bus delayed".to_string())
        );
        assert_eq!(merge_observations(None, Some(" traffic ")), Some("traffic".to_string()));
    }

    #[test]
    fn test_summarize() {
        let policy = AttendancePolicy::default();
        let tech = employee(Role::Technician);
        let base = BaseScheduleIndex::from_rows(vec![
            base_day(tech.id, Weekday::Monday, time(8, 0)),
            base_day(tech.id, Weekday::Tuesday, time(8, 0)),
            base_day(tech.id, Weekday::Wednesday, time(8, 0)),
        ]);
        let records = vec![
            attendance(tech.id, date(2025, 2, 3), Some(time(8, 0))),
            attendance(tech.id, date(2025, 2, 4), Some(time(8, 20))),
        ];
        let inputs = ReportInputs {
            employees: std::slice::from_ref(&tech),
            week_days: &[],
            base: &base,
            records: &records,
        };
        let range = DateRange::new(date(2025, 2, 3), date(2025, 2, 6)).unwrap();

        let rows = build_report(&policy, &range, date(2025, 2, 10), &inputs);
        let summary = summarize(&rows);

        assert_eq!(
            summary,
            vec![EmployeeReportSummary {
                employee_id: tech.id,
                employee_name: tech.full_name.clone(),
                on_time: 1,
                late: 1,
                absent: 1,
                no_schedule: 1,
                total_late_minutes: 20,
                ..Default::default()
            }]
        );
    }
}
