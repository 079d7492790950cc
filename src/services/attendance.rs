use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::clock::Clock;
use crate::database::{
    models::{
        AttendanceRecord, AttendanceStatus, EmployeeReportSummary, PunchInput, PunchKind,
        ReportRow, Weekday,
    },
    repositories::{
        attendance as attendance_repo, base_schedule as base_repo, day_schedule as day_repo,
        employee as employee_repo, week_schedule as week_repo,
    },
    transaction::DatabaseTransaction,
};
use crate::engine::{
    AttendancePolicy, BaseScheduleIndex, DateRange, LATE_PUNCH_OBSERVATION, ResolvedSchedule,
    plan_auto_close,
    reconciliation::{
        ReportInputs, build_report, entry_status, merge_observations, resolve_schedule, summarize,
    },
};
use crate::error::AppError;

/// Active week row for the date, else the base template for its weekday.
async fn resolve_schedule_for(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: Uuid,
    date: NaiveDate,
) -> Result<ResolvedSchedule, AppError> {
    let week_day = match week_repo::find_active_containing(tx, date).await? {
        Some(week) => day_repo::find_in_week(tx, week.id, employee_id, date).await?,
        None => None,
    };

    let weekday = Weekday::from_date(date);
    let base = base_repo::list_for_employee(tx, employee_id)
        .await?
        .into_iter()
        .find(|row| row.weekday == weekday);

    Ok(resolve_schedule(week_day.as_ref(), base.as_ref()))
}

#[derive(Clone)]
pub struct AttendanceService {
    pool: PgPool,
    clock: Arc<dyn Clock>,
    policy: AttendancePolicy,
}

impl AttendanceService {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>, policy: AttendancePolicy) -> Self {
        Self {
            pool,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &AttendancePolicy {
        &self.policy
    }

    /// Clock-in or clock-out. Date and time default to the clock's "now".
    pub async fn record_punch(&self, input: PunchInput) -> Result<AttendanceRecord, AppError> {
        let now = self.clock.now();
        let date = input.date.unwrap_or(now.date());
        let time = input.time.unwrap_or(now.time());
        let policy = self.policy;

        let record = DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let employee_id = input.employee_id;
                employee_repo::find_by_id(tx, employee_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("employee {}", employee_id)))?;

                let existing =
                    attendance_repo::find_record_for_update(tx, employee_id, date).await?;

                match input.kind {
                    PunchKind::Entry => {
                        if existing.as_ref().is_some_and(|r| r.entry_time.is_some()) {
                            return Err(AppError::AlreadyClockedIn { employee_id, date });
                        }

                        let schedule = resolve_schedule_for(tx, employee_id, date).await?;
                        let status = entry_status(&policy, &schedule, time);
                        let late_note =
                            (status == AttendanceStatus::Late).then_some(LATE_PUNCH_OBSERVATION);

                        match existing {
                            Some(record) => {
                                let observations = merge_observations(
                                    merge_observations(record.observations.as_deref(), late_note)
                                        .as_deref(),
                                    input.observations.as_deref(),
                                );
                                Ok(attendance_repo::set_entry(
                                    tx,
                                    record.id,
                                    time,
                                    status,
                                    observations,
                                )
                                .await?)
                            }
                            None => {
                                let observations =
                                    merge_observations(late_note, input.observations.as_deref());
                                Ok(attendance_repo::insert_record(
                                    tx,
                                    employee_id,
                                    date,
                                    Some(time),
                                    status,
                                    observations,
                                )
                                .await?)
                            }
                        }
                    }
                    PunchKind::Exit => {
                        let record = existing
                            .filter(|r| r.entry_time.is_some())
                            .ok_or(AppError::NoEntryYet { employee_id, date })?;
                        if record.exit_time.is_some() {
                            return Err(AppError::AlreadyClockedOut { employee_id, date });
                        }

                        let observations = merge_observations(
                            record.observations.as_deref(),
                            input.observations.as_deref(),
                        );
                        Ok(attendance_repo::set_exit(tx, record.id, time, observations, false)
                            .await?)
                    }
                }
            })
        })
        .await?;

        log::debug!(
            "Punch recorded for {} on {} (status {})",
            record.employee_id,
            record.date,
            record.status
        );
        Ok(record)
    }

    /// Marks the day as an authorised absence so the report shows "Permission".
    pub async fn mark_permission(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
        observations: Option<String>,
    ) -> Result<AttendanceRecord, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                employee_repo::find_by_id(tx, employee_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("employee {}", employee_id)))?;

                match attendance_repo::find_record_for_update(tx, employee_id, date).await? {
                    Some(record) => {
                        let merged = merge_observations(
                            record.observations.as_deref(),
                            observations.as_deref(),
                        );
                        Ok(attendance_repo::set_status(
                            tx,
                            record.id,
                            AttendanceStatus::Permission,
                            merged,
                        )
                        .await?)
                    }
                    None => Ok(attendance_repo::insert_record(
                        tx,
                        employee_id,
                        date,
                        None,
                        AttendanceStatus::Permission,
                        merge_observations(None, observations.as_deref()),
                    )
                    .await?),
                }
            })
        })
        .await
    }

    pub async fn get_record(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> Result<AttendanceRecord, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                attendance_repo::find_record(tx, employee_id, date)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "attendance for employee {} on {}",
                            employee_id, date
                        ))
                    })
            })
        })
        .await
    }

    pub async fn list_records(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        employee_id: Option<Uuid>,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let range = DateRange::new(start_date, end_date)?;

        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                Ok(attendance_repo::list_in_range(tx, &range, employee_id).await?)
            })
        })
        .await
    }

    /// One reconciled row per eligible employee and date in the range.
    pub async fn generate_range_report(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ReportRow>, AppError> {
        let range = DateRange::new(start_date, end_date)?;
        let today = self.clock.today();
        let policy = self.policy;

        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let employees = employee_repo::list_eligible(tx).await?;
                let ids: Vec<Uuid> = employees.iter().map(|e| e.id).collect();
                let base =
                    BaseScheduleIndex::from_rows(base_repo::list_for_employees(tx, &ids).await?);
                let week_days = day_repo::list_active_in_range(tx, &range).await?;
                let records = attendance_repo::list_in_range(tx, &range, None).await?;

                let inputs = ReportInputs {
                    employees: &employees,
                    week_days: &week_days,
                    base: &base,
                    records: &records,
                };
                Ok(build_report(&policy, &range, today, &inputs))
            })
        })
        .await
    }

    pub async fn summarize_report(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<EmployeeReportSummary>, AppError> {
        let rows = self.generate_range_report(start_date, end_date).await?;
        Ok(summarize(&rows))
    }

    /// Closes entries left open past the policy threshold. Returns the closed records.
    pub async fn auto_close_stale_entries(&self) -> Result<Vec<AttendanceRecord>, AppError> {
        let now = self.clock.now();
        let policy = self.policy;

        let closed = DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let open = attendance_repo::list_open_up_to(tx, now.date()).await?;

                let mut closed = Vec::new();
                for record in &open {
                    let Some(close) = plan_auto_close(&policy, now, record) else {
                        continue;
                    };
                    closed.push(
                        attendance_repo::set_exit(
                            tx,
                            record.id,
                            close.exit_time,
                            close.observations,
                            true,
                        )
                        .await?,
                    );
                }
                Ok(closed)
            })
        })
        .await?;

        if !closed.is_empty() {
            log::info!("Auto-closed {} stale attendance record(s)", closed.len());
        }
        Ok(closed)
    }
}
