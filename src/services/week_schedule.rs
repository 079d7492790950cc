use std::collections::HashSet;

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{
        BulkEditOutcome, DaySchedule, DayScheduleUpdate, NewDaySchedule, WeekSchedule,
        WeekScheduleDetail, WeekScheduleInput, WeekStatus,
    },
    repositories::{
        base_schedule as base_repo, day_schedule as day_repo, employee as employee_repo,
        leave_request as leave_repo, week_schedule as week_repo,
    },
    transaction::DatabaseTransaction,
};
use crate::engine::{
    BaseScheduleIndex, DateRange,
    week_plan::{
        CLONE_SPAN_DAYS, check_week_range, edit_day, plan_bulk_edit, plan_cloned_days,
        plan_generated_days, week_display_name,
    },
};
use crate::error::AppError;
use crate::services::leave_request::apply_to_weeks;

async fn require_week(
    tx: &mut Transaction<'_, Postgres>,
    week_id: Uuid,
) -> Result<WeekSchedule, AppError> {
    week_repo::find_by_id(tx, week_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("week schedule {}", week_id)))
}

/// Serialises against other week writers, then rejects a span or overlap problem.
async fn reserve_range(
    tx: &mut Transaction<'_, Postgres>,
    range: &DateRange,
) -> Result<(), AppError> {
    week_repo::lock_week_calendar(tx).await?;
    let existing = week_repo::list_overlapping(tx, range).await?;
    check_week_range(range, &existing)
}

async fn load_base_index(
    tx: &mut Transaction<'_, Postgres>,
    employee_ids: &[Uuid],
) -> Result<BaseScheduleIndex, AppError> {
    let rows = base_repo::list_for_employees(tx, employee_ids).await?;
    Ok(BaseScheduleIndex::from_rows(rows))
}

/// Stores the week and its rows, then re-applies approved leave for its dates.
async fn store_week(
    tx: &mut Transaction<'_, Postgres>,
    range: DateRange,
    created_by: Uuid,
    days: Vec<NewDaySchedule>,
) -> Result<WeekScheduleDetail, AppError> {
    let week = week_repo::create_week(
        tx,
        WeekScheduleInput {
            name: week_display_name(&range),
            start_date: range.start,
            end_date: range.end,
            created_by,
        },
    )
    .await?;
    day_repo::insert_days(tx, week.id, &days).await?;

    let approved = leave_repo::list_approved_overlapping(tx, &range).await?;
    for request in &approved {
        let Some(requester) = employee_repo::find_by_id(tx, request.employee_id).await? else {
            continue;
        };
        let outcome =
            apply_to_weeks(tx, request, &requester, std::slice::from_ref(&week)).await?;
        if !outcome.is_complete() {
            log::warn!(
                "Approved leave request {} could not be applied to new week {}",
                request.id,
                week.id
            );
        }
    }

    let days = day_repo::list_for_week(tx, week.id).await?;
    Ok(WeekScheduleDetail { week, days })
}

#[derive(Clone)]
pub struct WeekScheduleService {
    pool: PgPool,
}

impl WeekScheduleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a draft week from the base templates of every eligible employee.
    pub async fn generate(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        created_by: Uuid,
    ) -> Result<WeekScheduleDetail, AppError> {
        let range = DateRange::new(start_date, end_date)?;

        let detail = DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                reserve_range(tx, &range).await?;

                let employees = employee_repo::list_eligible(tx).await?;
                let ids: Vec<Uuid> = employees.iter().map(|e| e.id).collect();
                let base = load_base_index(tx, &ids).await?;
                let days = plan_generated_days(&range, &employees, &base)?;

                store_week(tx, range, created_by, days).await
            })
        })
        .await?;

        log::info!(
            "Generated week schedule {} ({}) with {} day rows",
            detail.week.id,
            detail.week.name,
            detail.days.len()
        );
        Ok(detail)
    }

    /// Copies a week onto the seven days starting at `new_start_date`.
    pub async fn clone_week(
        &self,
        source_week_id: Uuid,
        new_start_date: NaiveDate,
        created_by: Uuid,
    ) -> Result<WeekScheduleDetail, AppError> {
        let range = DateRange::starting_at(new_start_date, CLONE_SPAN_DAYS)?;

        let detail = DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let source = require_week(tx, source_week_id).await?;
                reserve_range(tx, &range).await?;

                let source_days = day_repo::list_for_week(tx, source.id).await?;
                let employees = employee_repo::list_eligible(tx).await?;
                let ids: Vec<Uuid> = employees.iter().map(|e| e.id).collect();
                let base = load_base_index(tx, &ids).await?;
                let days = plan_cloned_days(&source_days, &range, &employees, &base)?;

                store_week(tx, range, created_by, days).await
            })
        })
        .await?;

        log::info!(
            "Cloned week schedule {} into {} ({})",
            source_week_id,
            detail.week.id,
            detail.week.range()
        );
        Ok(detail)
    }

    pub async fn get_week(&self, week_id: Uuid) -> Result<WeekScheduleDetail, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let week = require_week(tx, week_id).await?;
                let days = day_repo::list_for_week(tx, week.id).await?;
                Ok(WeekScheduleDetail { week, days })
            })
        })
        .await
    }

    /// Newest first.
    pub async fn list_weeks(&self) -> Result<Vec<WeekSchedule>, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move { Ok(week_repo::list_weeks(tx).await?) })
        })
        .await
    }

    /// The week punches and reports currently reconcile against for `date`.
    pub async fn find_active_week_containing(
        &self,
        date: NaiveDate,
    ) -> Result<Option<WeekSchedule>, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move { Ok(week_repo::find_active_containing(tx, date).await?) })
        })
        .await
    }

    pub async fn edit_day(
        &self,
        day_id: Uuid,
        update: DayScheduleUpdate,
    ) -> Result<DaySchedule, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let day = day_repo::find_by_id(tx, day_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("day schedule {}", day_id)))?;

                let fields = edit_day(&day, &update)?;
                Ok(day_repo::update_fields(tx, day.id, &fields).await?)
            })
        })
        .await
    }

    /// Applies one edit to many rows. Rows locked by a leave request are skipped.
    pub async fn bulk_edit_days(
        &self,
        day_ids: Vec<Uuid>,
        update: DayScheduleUpdate,
    ) -> Result<BulkEditOutcome, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let wanted: HashSet<Uuid> = day_ids.iter().copied().collect();
                let days = day_repo::list_by_ids(tx, &day_ids).await?;

                let found: HashSet<Uuid> = days.iter().map(|day| day.id).collect();
                if let Some(missing) = wanted.difference(&found).next() {
                    return Err(AppError::NotFound(format!("day schedule {}", missing)));
                }

                let plan = plan_bulk_edit(&days, &update)?;
                let mut updated = Vec::with_capacity(plan.updates.len());
                for (id, fields) in &plan.updates {
                    updated.push(day_repo::update_fields(tx, *id, fields).await?);
                }

                if !plan.skipped.is_empty() {
                    log::debug!(
                        "Bulk edit skipped {} day(s) locked by leave requests",
                        plan.skipped.len()
                    );
                }

                Ok(BulkEditOutcome {
                    updated,
                    skipped: plan.skipped,
                })
            })
        })
        .await
    }

    /// Any of draft, active and historical may follow any other.
    pub async fn change_status(
        &self,
        week_id: Uuid,
        status: WeekStatus,
    ) -> Result<WeekSchedule, AppError> {
        let week = DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                week_repo::update_status(tx, week_id, status)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("week schedule {}", week_id)))
            })
        })
        .await?;

        log::info!("Week schedule {} is now {}", week.id, week.status);
        Ok(week)
    }

    /// Only drafts can be deleted.
    pub async fn delete_week(&self, week_id: Uuid) -> Result<(), AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let week = require_week(tx, week_id).await?;
                if week.status != WeekStatus::Draft {
                    return Err(AppError::NotDeletable(format!(
                        "week schedule {} is {}",
                        week.id, week.status
                    )));
                }

                week_repo::delete_week(tx, week.id).await?;
                log::info!("Deleted week schedule {} ({})", week.id, week.name);
                Ok(())
            })
        })
        .await
    }
}
