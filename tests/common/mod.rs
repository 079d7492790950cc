#![allow(dead_code)]

use std::env;
use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use fake::Fake;
use fake::faker::name::en::Name;
use sqlx::PgPool;
use uuid::Uuid;

use rollcall::database::init_database;
use rollcall::database::models::{
    BaseDayScheduleInput, DayType, Employee, EmployeeInput, Role, Weekday,
};
use rollcall::database::repositories::employee as employee_repo;
use rollcall::engine::AttendancePolicy;
use rollcall::{
    AttendanceService, BaseScheduleService, FixedClock, LeaveRequestService, LogNotifier,
    WeekScheduleService,
};

/// Postgres-backed fixture. Tables are emptied on every connect.
pub struct TestDb {
    pub pool: PgPool,
}

impl TestDb {
    pub async fn connect() -> Result<Option<Self>> {
        setup_test_env();

        let Ok(database_url) = env::var("TEST_DATABASE_URL") else {
            log::warn!("TEST_DATABASE_URL not set, skipping database test");
            return Ok(None);
        };

        let pool = init_database(&database_url, 2).await?;
        sqlx::query(
            "TRUNCATE attendance_records, day_schedules, week_schedules, leave_requests, \
             base_day_schedules, employees CASCADE",
        )
        .execute(&pool)
        .await?;

        Ok(Some(TestDb { pool }))
    }

    pub async fn employee(&self, role: Role) -> Result<Employee> {
        let full_name: String = Name().fake();
        let mut tx = self.pool.begin().await?;
        let employee = employee_repo::create_employee(
            &mut tx,
            EmployeeInput {
                email: format!("{}@rollcall.test", Uuid::new_v4()),
                full_name,
                role,
            },
        )
        .await?;
        tx.commit().await?;
        Ok(employee)
    }

    pub async fn deactivate(&self, employee_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        employee_repo::set_active(&mut tx, employee_id, false).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Monday to Friday from `entry` for nine hours, weekend as rest days.
    pub async fn office_week(&self, employee_id: Uuid, entry: NaiveTime) -> Result<()> {
        let service = self.base_schedules();
        for weekday in [
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
        ] {
            service
                .upsert_base_day(
                    employee_id,
                    weekday,
                    BaseDayScheduleInput {
                        entry_time: Some(entry),
                        exit_time: Some(entry + chrono::Duration::hours(9)),
                        lunch_start: Some(entry + chrono::Duration::hours(4)),
                        lunch_end: Some(entry + chrono::Duration::hours(5)),
                        day_type: DayType::Normal,
                        shift: None,
                    },
                )
                .await?;
        }
        for weekday in [Weekday::Saturday, Weekday::Sunday] {
            service
                .upsert_base_day(
                    employee_id,
                    weekday,
                    BaseDayScheduleInput {
                        day_type: DayType::Rest,
                        ..Default::default()
                    },
                )
                .await?;
        }
        Ok(())
    }

    pub fn base_schedules(&self) -> BaseScheduleService {
        BaseScheduleService::new(self.pool.clone())
    }

    pub fn weeks(&self) -> WeekScheduleService {
        WeekScheduleService::new(self.pool.clone())
    }

    pub fn leave(&self) -> LeaveRequestService {
        LeaveRequestService::new(self.pool.clone(), Arc::new(LogNotifier))
    }

    pub fn attendance_at(&self, now: NaiveDateTime) -> AttendanceService {
        AttendanceService::new(
            self.pool.clone(),
            Arc::new(FixedClock(now)),
            AttendancePolicy::default(),
        )
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_time(time(hour, minute))
}

/// 2025-02-03, a Monday.
pub fn monday() -> NaiveDate {
    date(2025, 2, 3)
}

pub fn setup_test_env() {
    let _ = env_logger::builder().is_test(true).try_init();
}
