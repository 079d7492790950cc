//! Row builders shared by the engine unit tests.

use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::database::models::{
    AttendanceRecord, AttendanceStatus, BaseDaySchedule, DaySchedule, DayType, Employee,
    LeaveRequest, LeaveStatus, LeaveType, Role, ScheduleOrigin, Weekday,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn employee(role: Role) -> Employee {
    let id = Uuid::new_v4();
    Employee {
        id,
        full_name: format!("{} {}", role, &id.to_string()[..8]),
        email: format!("{}@rollcall.test", id),
        role,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn inactive(mut employee: Employee) -> Employee {
    employee.is_active = false;
    employee
}

pub fn base_day(employee_id: Uuid, weekday: Weekday, entry: NaiveTime) -> BaseDaySchedule {
    BaseDaySchedule {
        id: Uuid::new_v4(),
        employee_id,
        weekday,
        entry_time: Some(entry),
        exit_time: Some(entry + chrono::Duration::hours(9)),
        lunch_start: None,
        lunch_end: None,
        day_type: DayType::Normal,
        shift: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn day_row(week_schedule_id: Uuid, employee_id: Uuid, date: NaiveDate) -> DaySchedule {
    DaySchedule {
        id: Uuid::new_v4(),
        week_schedule_id,
        employee_id,
        date,
        weekday: Weekday::from_date(date),
        entry_time: None,
        exit_time: None,
        lunch_start: None,
        lunch_end: None,
        day_type: DayType::Normal,
        shift: None,
        origin: ScheduleOrigin::Manual,
        leave_request_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn leave(
    employee_id: Uuid,
    leave_type: LeaveType,
    start: NaiveDate,
    end: NaiveDate,
) -> LeaveRequest {
    LeaveRequest {
        id: Uuid::new_v4(),
        employee_id,
        leave_type,
        requested_at: Utc::now(),
        start_date: start,
        end_date: end,
        reason: None,
        status: LeaveStatus::Pending,
        approved_by: None,
        approved_at: None,
        decision_notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn attendance(
    employee_id: Uuid,
    date: NaiveDate,
    entry: Option<NaiveTime>,
) -> AttendanceRecord {
    AttendanceRecord {
        id: Uuid::new_v4(),
        employee_id,
        date,
        entry_time: entry,
        exit_time: None,
        status: AttendanceStatus::Present,
        observations: None,
        auto_closed: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
