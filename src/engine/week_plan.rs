//! Building and editing week schedules: generation from base templates,
//! positional cloning, and the per-row edit rules.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::database::models::{
    BaseDaySchedule, DayFields, DaySchedule, DayScheduleUpdate, Employee, NewDaySchedule,
    ScheduleOrigin, Shift, WeekSchedule, Weekday,
};
use crate::engine::calendar::{DateRange, validate_week_span};
use crate::error::AppError;

/// Clone always produces a full calendar week.
pub const CLONE_SPAN_DAYS: i64 = 7;

/// Base templates keyed by (employee, weekday).
#[derive(Debug, Default, Clone)]
pub struct BaseScheduleIndex {
    rows: HashMap<(Uuid, Weekday), BaseDaySchedule>,
}

impl BaseScheduleIndex {
    pub fn from_rows(rows: impl IntoIterator<Item = BaseDaySchedule>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| ((row.employee_id, row.weekday), row))
            .collect();
        Self { rows }
    }

    pub fn get(&self, employee_id: Uuid, weekday: Weekday) -> Option<&BaseDaySchedule> {
        self.rows.get(&(employee_id, weekday))
    }

    pub fn for_date(&self, employee_id: Uuid, date: NaiveDate) -> Option<&BaseDaySchedule> {
        self.get(employee_id, Weekday::from_date(date))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn week_display_name(range: &DateRange) -> String {
    format!(
        "Week {} - {}",
        range.start.format("%d/%m/%Y"),
        range.end.format("%d/%m/%Y")
    )
}

/// A new week must have a valid span and must not touch any stored week.
pub fn check_week_range(range: &DateRange, existing: &[WeekSchedule]) -> Result<(), AppError> {
    validate_week_span(range)?;

    if let Some(duplicate) = existing.iter().find(|week| week.range() == *range) {
        return Err(AppError::Conflict(format!(
            "week schedule '{}' ({}) already covers exactly {}",
            duplicate.name, duplicate.id, range
        )));
    }

    if let Some(overlapping) = existing.iter().find(|week| week.range().overlaps(range)) {
        return Err(AppError::Conflict(format!(
            "{} overlaps week schedule '{}' ({}, {})",
            range,
            overlapping.name,
            overlapping.id,
            overlapping.range()
        )));
    }

    Ok(())
}

fn eligible(employees: &[Employee]) -> Result<Vec<&Employee>, AppError> {
    let eligible: Vec<&Employee> = employees.iter().filter(|e| e.is_eligible()).collect();
    if eligible.is_empty() {
        return Err(AppError::NoEligibleEmployees);
    }
    Ok(eligible)
}

/// One manual row per (eligible employee, day), copied from the base template when present.
pub fn plan_generated_days(
    range: &DateRange,
    employees: &[Employee],
    base: &BaseScheduleIndex,
) -> Result<Vec<NewDaySchedule>, AppError> {
    let employees = eligible(employees)?;

    let mut days = Vec::with_capacity(employees.len() * range.len_days() as usize);
    for employee in employees {
        for date in range.days() {
            days.push(NewDaySchedule {
                employee_id: employee.id,
                date,
                fields: DayFields::from_base(base.for_date(employee.id, date)),
            });
        }
    }
    Ok(days)
}

/// Copies each source employee's rows by position (day 0 onto day 0, ...).
///
/// Hours, day type and shift are copied as they are, leave-derived rows
/// included, but every copy is a manual row without a leave link. Destination
/// days with no positional source row, and eligible employees missing from the
/// source week, are seeded from the base template.
pub fn plan_cloned_days(
    source_days: &[DaySchedule],
    destination: &DateRange,
    employees: &[Employee],
    base: &BaseScheduleIndex,
) -> Result<Vec<NewDaySchedule>, AppError> {
    if destination.len_days() != CLONE_SPAN_DAYS {
        return Err(AppError::InvalidRange(format!(
            "clone destination must span {} days, {} spans {}",
            CLONE_SPAN_DAYS,
            destination,
            destination.len_days()
        )));
    }

    let mut by_employee: BTreeMap<Uuid, Vec<&DaySchedule>> = BTreeMap::new();
    for day in source_days {
        by_employee.entry(day.employee_id).or_default().push(day);
    }
    for rows in by_employee.values_mut() {
        rows.sort_by_key(|day| day.date);
    }

    let mut employee_ids: Vec<Uuid> = by_employee.keys().copied().collect();
    employee_ids.extend(
        employees
            .iter()
            .filter(|e| e.is_eligible() && !by_employee.contains_key(&e.id))
            .map(|e| e.id),
    );
    if employee_ids.is_empty() {
        return Err(AppError::NoEligibleEmployees);
    }

    let mut days = Vec::with_capacity(employee_ids.len() * CLONE_SPAN_DAYS as usize);
    for employee_id in employee_ids {
        let source_rows = by_employee.get(&employee_id);
        for (index, date) in destination.days().enumerate() {
            let fields = match source_rows.and_then(|rows| rows.get(index)) {
                Some(day) => DayFields {
                    origin: ScheduleOrigin::Manual,
                    leave_request_id: None,
                    ..day.fields()
                },
                None => DayFields::from_base(base.for_date(employee_id, date)),
            };
            days.push(NewDaySchedule {
                employee_id,
                date,
                fields,
            });
        }
    }
    Ok(days)
}

/// Applies the provided fields of `update` to `day`.
///
/// An afternoon shift has no tracked lunch break, so selecting it clears lunch.
pub fn apply_update(current: &DayFields, update: &DayScheduleUpdate) -> DayFields {
    let mut fields = current.clone();

    if let Some(entry_time) = update.entry_time {
        fields.entry_time = Some(entry_time);
    }
    if let Some(exit_time) = update.exit_time {
        fields.exit_time = Some(exit_time);
    }
    if let Some(lunch_start) = update.lunch_start {
        fields.lunch_start = Some(lunch_start);
    }
    if let Some(lunch_end) = update.lunch_end {
        fields.lunch_end = Some(lunch_end);
    }
    if let Some(day_type) = &update.day_type {
        fields.day_type = day_type.clone();
    }
    if let Some(shift) = update.shift {
        fields.shift = Some(shift);
        if shift == Shift::Afternoon {
            fields.lunch_start = None;
            fields.lunch_end = None;
        }
    }

    fields
}

pub fn edit_day(day: &DaySchedule, update: &DayScheduleUpdate) -> Result<DayFields, AppError> {
    if day.is_locked() {
        return Err(AppError::LockedByLeaveRequest(day.id));
    }
    if update.is_empty() {
        return Err(AppError::BadRequest("no fields to update".to_string()));
    }
    Ok(apply_update(&day.fields(), update))
}

pub struct BulkEditPlan {
    pub updates: Vec<(Uuid, DayFields)>,
    pub skipped: Vec<Uuid>,
}

/// Same rule as [`edit_day`] per row, except locked rows are skipped instead of failing.
pub fn plan_bulk_edit(
    days: &[DaySchedule],
    update: &DayScheduleUpdate,
) -> Result<BulkEditPlan, AppError> {
    if update.is_empty() {
        return Err(AppError::BadRequest("no fields to update".to_string()));
    }

    let (locked, editable): (Vec<&DaySchedule>, Vec<&DaySchedule>) =
        days.iter().partition(|day| day.is_locked());

    if editable.is_empty() {
        return Err(AppError::NothingUpdated);
    }

    Ok(BulkEditPlan {
        updates: editable
            .into_iter()
            .map(|day| (day.id, apply_update(&day.fields(), update)))
            .collect(),
        skipped: locked.into_iter().map(|day| day.id).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{DayType, Role, WeekStatus};
    use crate::engine::test_support::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn week(start: NaiveDate, days: i64) -> WeekSchedule {
        let range = DateRange::starting_at(start, days).unwrap();
        WeekSchedule {
            id: Uuid::new_v4(),
            name: week_display_name(&range),
            start_date: range.start,
            end_date: range.end,
            status: WeekStatus::Draft,
            created_by: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_display_name() {
        let range = DateRange::starting_at(date(2025, 2, 3), 7).unwrap();
        assert_eq!(week_display_name(&range), "Week 03/02/2025 - 09/02/2025");
    }

    #[test]
    fn test_check_week_range_rejects_duplicate_and_overlap() {
        let existing = vec![week(date(2025, 2, 3), 7)];

        let same = DateRange::starting_at(date(2025, 2, 3), 7).unwrap();
        let err = check_week_range(&same, &existing).unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg.contains("exactly")));

        let overlapping = DateRange::starting_at(date(2025, 2, 9), 7).unwrap();
        let err = check_week_range(&overlapping, &existing).unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg.contains(&existing[0].name)));

        let next = DateRange::starting_at(date(2025, 2, 10), 7).unwrap();
        assert!(check_week_range(&next, &existing).is_ok());
    }

    #[test]
    fn test_check_week_range_rejects_bad_span() {
        let short = DateRange::starting_at(date(2025, 2, 3), 4).unwrap();
        assert!(matches!(
            check_week_range(&short, &[]),
            Err(AppError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_generation_covers_every_employee_and_day_once() {
        let employees = vec![
            employee(Role::Technician),
            employee(Role::Noc),
            employee(Role::Admin),
            inactive(employee(Role::Helpdesk)),
        ];
        let monday = date(2025, 2, 3);
        let base = BaseScheduleIndex::from_rows(vec![base_day(
            employees[0].id,
            Weekday::Monday,
            time(8, 0),
        )]);
        let range = DateRange::starting_at(monday, 7).unwrap();

        let days = plan_generated_days(&range, &employees, &base).unwrap();

        assert_eq!(days.len(), 14);
        let keys: HashSet<(Uuid, NaiveDate)> =
            days.iter().map(|d| (d.employee_id, d.date)).collect();
        assert_eq!(keys.len(), 14);
        assert!(days.iter().all(|d| d.fields.origin == ScheduleOrigin::Manual));

        let seeded = days
            .iter()
            .find(|d| d.employee_id == employees[0].id && d.date == monday)
            .unwrap();
        assert_eq!(seeded.fields.entry_time, Some(time(8, 0)));

        let bare = days
            .iter()
            .find(|d| d.employee_id == employees[1].id && d.date == monday)
            .unwrap();
        assert_eq!(bare.fields, DayFields::default());
    }

    #[test]
    fn test_generation_without_eligible_employees() {
        let range = DateRange::starting_at(date(2025, 2, 3), 7).unwrap();
        let employees = vec![employee(Role::Admin)];
        assert!(matches!(
            plan_generated_days(&range, &employees, &BaseScheduleIndex::default()),
            Err(AppError::NoEligibleEmployees)
        ));
    }

    #[test]
    fn test_clone_copies_positionally_and_drops_leave_links() {
        let tech = employee(Role::Technician);
        let source_week = Uuid::new_v4();
        let source_start = date(2025, 2, 3);
        let mut source: Vec<DaySchedule> = (0..7)
            .map(|i| {
                let mut day = day_row(
                    source_week,
                    tech.id,
                    source_start + chrono::Duration::days(i),
                );
                day.entry_time = Some(time(7 + i as u32, 0));
                day
            })
            .collect();
        // Day 2 was overlaid by a leave request.
        source[2].entry_time = None;
        source[2].day_type = DayType::Vacation;
        source[2].origin = ScheduleOrigin::LeaveRequest;
        source[2].leave_request_id = Some(Uuid::new_v4());
        // Day 5 is a manual rest day.
        source[5].day_type = DayType::Rest;
        source.reverse();

        let base = BaseScheduleIndex::from_rows(vec![base_day(
            tech.id,
            Weekday::Wednesday,
            time(9, 30),
        )]);
        let destination = DateRange::starting_at(date(2025, 2, 10), 7).unwrap();

        let days =
            plan_cloned_days(&source, &destination, &[tech.clone()], &base).unwrap();

        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, date(2025, 2, 10));
        assert_eq!(days[0].fields.entry_time, Some(time(7, 0)));
        assert_eq!(days[2].fields.entry_time, None);
        assert_eq!(days[2].fields.day_type, DayType::Vacation);
        assert_eq!(days[5].fields.day_type, DayType::Rest);
        assert_eq!(days[6].fields.entry_time, Some(time(13, 0)));
        assert!(days.iter().all(|d| d.fields.leave_request_id.is_none()));
        assert!(days.iter().all(|d| d.fields.origin == ScheduleOrigin::Manual));
    }

    #[test]
    fn test_clone_fills_short_source_and_new_employees() {
        let veteran = employee(Role::Technician);
        let newcomer = employee(Role::Supervisor);
        let source_week = Uuid::new_v4();
        let source: Vec<DaySchedule> = (0..5)
            .map(|i| day_row(source_week, veteran.id, date(2025, 2, 3) + chrono::Duration::days(i)))
            .collect();
        let base = BaseScheduleIndex::from_rows(vec![base_day(
            veteran.id,
            Weekday::Saturday,
            time(10, 0),
        )]);
        let destination = DateRange::starting_at(date(2025, 2, 10), 7).unwrap();

        let days = plan_cloned_days(
            &source,
            &destination,
            &[veteran.clone(), newcomer.clone()],
            &base,
        )
        .unwrap();

        assert_eq!(days.len(), 14);
        let saturday = days
            .iter()
            .find(|d| d.employee_id == veteran.id && d.date == date(2025, 2, 15))
            .unwrap();
        assert_eq!(saturday.fields.entry_time, Some(time(10, 0)));
        assert_eq!(
            days.iter().filter(|d| d.employee_id == newcomer.id).count(),
            7
        );
    }

    #[test]
    fn test_clone_keeps_every_source_employee() {
        let departed = inactive(employee(Role::Helpdesk));
        let source_week = Uuid::new_v4();
        let source: Vec<DaySchedule> = (0..7)
            .map(|i| {
                let mut day = day_row(
                    source_week,
                    departed.id,
                    date(2025, 2, 3) + chrono::Duration::days(i),
                );
                day.entry_time = Some(time(6, 0));
                day
            })
            .collect();
        let destination = DateRange::starting_at(date(2025, 2, 10), 7).unwrap();

        let days = plan_cloned_days(
            &source,
            &destination,
            &[departed.clone()],
            &BaseScheduleIndex::default(),
        )
        .unwrap();

        assert_eq!(days.len(), 7);
        assert!(days.iter().all(|d| d.employee_id == departed.id));
        assert!(days.iter().all(|d| d.fields.entry_time == Some(time(6, 0))));

        let empty = plan_cloned_days(
            &[],
            &destination,
            &[departed],
            &BaseScheduleIndex::default(),
        );
        assert!(matches!(empty, Err(AppError::NoEligibleEmployees)));
    }

    #[test]
    fn test_clone_requires_seven_day_destination() {
        let destination = DateRange::starting_at(date(2025, 2, 10), 6).unwrap();
        let employees = [employee(Role::Noc)];
        let planned = plan_cloned_days(&[], &destination, &employees, &BaseScheduleIndex::default());
        assert!(matches!(planned, Err(AppError::InvalidRange(_))));
    }

    #[test]
    fn test_afternoon_shift_clears_lunch() {
        let current = DayFields {
            entry_time: Some(time(8, 0)),
            lunch_start: Some(time(12, 0)),
            lunch_end: Some(time(13, 0)),
            shift: Some(Shift::Morning),
            ..Default::default()
        };
        let update = DayScheduleUpdate {
            entry_time: Some(time(14, 0)),
            lunch_start: Some(time(17, 0)),
            shift: Some(Shift::Afternoon),
            ..Default::default()
        };

        let fields = apply_update(&current, &update);

        assert_eq!(fields.entry_time, Some(time(14, 0)));
        assert_eq!(fields.shift, Some(Shift::Afternoon));
        assert_eq!(fields.lunch_start, None);
        assert_eq!(fields.lunch_end, None);
    }

    #[test]
    fn test_edit_rejects_locked_day() {
        let mut day = day_row(Uuid::new_v4(), Uuid::new_v4(), date(2025, 2, 3));
        day.origin = ScheduleOrigin::LeaveRequest;
        day.leave_request_id = Some(Uuid::new_v4());
        let update = DayScheduleUpdate {
            entry_time: Some(time(9, 0)),
            ..Default::default()
        };

        let err = edit_day(&day, &update).unwrap_err();
        assert!(matches!(err, AppError::LockedByLeaveRequest(id) if id == day.id));
    }

    #[test]
    fn test_bulk_edit_skips_locked_rows() {
        let week_id = Uuid::new_v4();
        let free = day_row(week_id, Uuid::new_v4(), date(2025, 2, 3));
        let mut locked = day_row(week_id, Uuid::new_v4(), date(2025, 2, 3));
        locked.origin = ScheduleOrigin::LeaveRequest;
        let update = DayScheduleUpdate {
            exit_time: Some(time(18, 0)),
            ..Default::default()
        };

        let plan = plan_bulk_edit(&[free.clone(), locked.clone()], &update).unwrap();
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].0, free.id);
        assert_eq!(plan.updates[0].1.exit_time, Some(time(18, 0)));
        assert_eq!(plan.skipped, vec![locked.id]);

        assert!(matches!(
            plan_bulk_edit(&[locked], &update),
            Err(AppError::NothingUpdated)
        ));
    }
}
