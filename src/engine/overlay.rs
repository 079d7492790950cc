//! Projecting approved leave requests onto week schedules, and taking them back off.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::database::models::{
    BaseDaySchedule, DayFields, DaySchedule, DayType, Employee, LeaveRequest, LeaveType,
    NewDaySchedule, ScheduleOrigin, WeekSchedule,
};
use crate::engine::calendar::DateRange;
use crate::engine::week_plan::BaseScheduleIndex;

/// Day type a leave request turns its days into.
pub fn day_type_for(leave_type: &LeaveType) -> DayType {
    match leave_type {
        LeaveType::Vacation => DayType::Vacation,
        LeaveType::Rest => DayType::Rest,
        LeaveType::Permission => DayType::Permission,
        LeaveType::Compensation => DayType::Compensated,
        LeaveType::Other(label) => keyword_day_type(label).unwrap_or_else(|| {
            log::warn!(
                "Leave type '{}' has no day type mapping, using it as a literal day type",
                label
            );
            DayType::from(label.as_str())
        }),
    }
}

/// Labels like "annual vacation" or "compensatory day" name a known kind by one of their words.
fn keyword_day_type(label: &str) -> Option<DayType> {
    label
        .split(|c: char| !c.is_alphanumeric())
        .find_map(|word| match word {
            "vacation" | "vacations" | "holiday" | "holidays" => Some(DayType::Vacation),
            "rest" => Some(DayType::Rest),
            "permission" | "permissions" => Some(DayType::Permission),
            w if w.starts_with("compensat") => Some(DayType::Compensated),
            _ => None,
        })
}

pub fn overlay_fields(request: &LeaveRequest) -> DayFields {
    DayFields {
        day_type: day_type_for(&request.leave_type),
        shift: None,
        origin: ScheduleOrigin::LeaveRequest,
        leave_request_id: Some(request.id),
        ..DayFields::default()
    }
}

/// A reverted day is a manual normal day again, with base hours when the employee has them.
pub fn revert_fields(base: Option<&BaseDaySchedule>) -> DayFields {
    let mut fields = DayFields::from_base(base);
    fields.day_type = DayType::Normal;
    fields
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayStep {
    Update(Uuid, DayFields),
    /// The week has no row for this (employee, date) yet.
    Insert(NewDaySchedule),
}

/// Steps that overlay `request` onto one week, given that week's current rows.
///
/// Missing rows are only created for a requester who can be scheduled; an
/// admin or deactivated employee only has existing rows overlaid.
pub fn plan_overlay(
    request: &LeaveRequest,
    requester: &Employee,
    week: &WeekSchedule,
    days: &[DaySchedule],
) -> Vec<OverlayStep> {
    let requested = DateRange {
        start: request.start_date,
        end: request.end_date,
    };
    let Some(covered) = requested.intersection(&week.range()) else {
        return Vec::new();
    };

    let fields = overlay_fields(request);
    covered
        .days()
        .filter_map(|date| match find_day(days, request.employee_id, date) {
            Some(day) => Some(OverlayStep::Update(day.id, fields.clone())),
            None if requester.is_eligible() => Some(OverlayStep::Insert(NewDaySchedule {
                employee_id: request.employee_id,
                date,
                fields: fields.clone(),
            })),
            None => None,
        })
        .collect()
}

fn find_day(days: &[DaySchedule], employee_id: Uuid, date: NaiveDate) -> Option<&DaySchedule> {
    days.iter()
        .find(|day| day.employee_id == employee_id && day.date == date)
}

pub fn plan_revert(linked: &[DaySchedule], base: &BaseScheduleIndex) -> Vec<(Uuid, DayFields)> {
    linked
        .iter()
        .map(|day| (day.id, revert_fields(base.for_date(day.employee_id, day.date))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Role, Shift, WeekStatus, Weekday};
    use crate::engine::test_support::*;
    use pretty_assertions::assert_eq;

    fn week(start: NaiveDate, end: NaiveDate) -> WeekSchedule {
        WeekSchedule {
            id: Uuid::new_v4(),
            name: "test week".to_string(),
            start_date: start,
            end_date: end,
            status: WeekStatus::Active,
            created_by: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_mapping_table() {
        assert_eq!(day_type_for(&LeaveType::Vacation), DayType::Vacation);
        assert_eq!(day_type_for(&LeaveType::Rest), DayType::Rest);
        assert_eq!(day_type_for(&LeaveType::Permission), DayType::Permission);
        assert_eq!(day_type_for(&LeaveType::Compensation), DayType::Compensated);
        assert_eq!(
            day_type_for(&LeaveType::from("Medical")),
            DayType::Other("medical".to_string())
        );
    }

    #[test]
    fn test_free_form_labels_map_by_keyword() {
        let cases = [
            ("Annual Vacation", DayType::Vacation),
            ("compensatory", DayType::Compensated),
            ("Compensated day", DayType::Compensated),
            ("weekly rest", DayType::Rest),
            ("personal-permission", DayType::Permission),
        ];
        for (label, expected) in cases {
            assert_eq!(day_type_for(&LeaveType::from(label)), expected, "{}", label);
        }

        assert_eq!(
            day_type_for(&LeaveType::from("interest seminar")),
            DayType::Other("interest seminar".to_string())
        );
    }

    #[test]
    fn test_overlay_clears_hours() {
        let day = date(2025, 2, 4);
        let request = leave(Uuid::new_v4(), LeaveType::Vacation, day, day);
        let fields = overlay_fields(&request);

        assert_eq!(fields.entry_time, None);
        assert_eq!(fields.lunch_start, None);
        assert_eq!(fields.shift, None);
        assert_eq!(fields.day_type, DayType::Vacation);
        assert_eq!(fields.origin, ScheduleOrigin::LeaveRequest);
        assert_eq!(fields.leave_request_id, Some(request.id));
    }

    #[test]
    fn test_plan_only_touches_intersection() {
        let requester = employee(Role::Technician);
        let employee_id = requester.id;
        let other_id = Uuid::new_v4();
        let week = week(date(2025, 2, 3), date(2025, 2, 9));
        let mut days: Vec<DaySchedule> = week
            .range()
            .days()
            .map(|d| day_row(week.id, employee_id, d))
            .collect();
        days.push(day_row(week.id, other_id, date(2025, 2, 8)));
        let request = leave(employee_id, LeaveType::Rest, date(2025, 2, 8), date(2025, 2, 12));

        let steps = plan_overlay(&request, &requester, &week, &days);

        let expected: Vec<OverlayStep> = days[5..7]
            .iter()
            .map(|day| OverlayStep::Update(day.id, overlay_fields(&request)))
            .collect();
        assert_eq!(steps, expected);
    }

    #[test]
    fn test_plan_inserts_missing_rows() {
        let requester = employee(Role::Noc);
        let week = week(date(2025, 2, 3), date(2025, 2, 9));
        let request = leave(
            requester.id,
            LeaveType::Permission,
            date(2025, 2, 1),
            date(2025, 2, 3),
        );

        let steps = plan_overlay(&request, &requester, &week, &[]);

        assert_eq!(steps.len(), 1);
        match &steps[0] {
            OverlayStep::Insert(row) => {
                assert_eq!(row.date, date(2025, 2, 3));
                assert_eq!(row.fields.day_type, DayType::Permission);
            }
            other => panic!("expected insert, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_outside_week_is_empty() {
        let requester = employee(Role::Helpdesk);
        let week = week(date(2025, 2, 3), date(2025, 2, 9));
        let request = leave(requester.id, LeaveType::Rest, date(2025, 2, 10), date(2025, 2, 11));
        assert!(plan_overlay(&request, &requester, &week, &[]).is_empty());
    }

    #[test]
    fn test_plan_never_creates_rows_for_unscheduled_requesters() {
        let week = week(date(2025, 2, 3), date(2025, 2, 9));
        let admin = employee(Role::Admin);
        let request = leave(admin.id, LeaveType::Vacation, date(2025, 2, 3), date(2025, 2, 4));
        assert!(plan_overlay(&request, &admin, &week, &[]).is_empty());

        let departed = inactive(employee(Role::Technician));
        let kept = day_row(week.id, departed.id, date(2025, 2, 4));
        let request = leave(departed.id, LeaveType::Vacation, date(2025, 2, 3), date(2025, 2, 4));
        let steps = plan_overlay(&request, &departed, &week, std::slice::from_ref(&kept));
        assert_eq!(steps, vec![OverlayStep::Update(kept.id, overlay_fields(&request))]);
    }

    #[test]
    fn test_revert_restores_base_hours() {
        let employee_id = Uuid::new_v4();
        let mut monday = day_row(Uuid::new_v4(), employee_id, date(2025, 2, 3));
        monday.day_type = DayType::Vacation;
        monday.origin = ScheduleOrigin::LeaveRequest;
        monday.leave_request_id = Some(Uuid::new_v4());
        let mut tuesday = monday.clone();
        tuesday.id = Uuid::new_v4();
        tuesday.date = date(2025, 2, 4);

        let mut base_monday = base_day(employee_id, Weekday::Monday, time(8, 0));
        base_monday.shift = Some(Shift::Morning);
        let base = BaseScheduleIndex::from_rows(vec![base_monday]);

        let reverted = plan_revert(&[monday.clone(), tuesday.clone()], &base);

        assert_eq!(reverted[0].0, monday.id);
        assert_eq!(reverted[0].1.entry_time, Some(time(8, 0)));
        assert_eq!(reverted[0].1.shift, Some(Shift::Morning));
        assert_eq!(reverted[0].1.origin, ScheduleOrigin::Manual);
        assert_eq!(reverted[0].1.leave_request_id, None);

        assert_eq!(reverted[1].0, tuesday.id);
        assert_eq!(reverted[1].1, DayFields::default());
    }
}
