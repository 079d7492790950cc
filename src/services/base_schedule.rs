use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{BaseDaySchedule, BaseDayScheduleInput, Shift, Weekday},
    repositories::{base_schedule as base_repo, employee as employee_repo},
    transaction::DatabaseTransaction,
};
use crate::error::AppError;

/// Per-employee weekday templates.
#[derive(Clone)]
pub struct BaseScheduleService {
    pool: PgPool,
}

impl BaseScheduleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert_base_day(
        &self,
        employee_id: Uuid,
        weekday: Weekday,
        mut input: BaseDayScheduleInput,
    ) -> Result<BaseDaySchedule, AppError> {
        if input.shift == Some(Shift::Afternoon) {
            input.lunch_start = None;
            input.lunch_end = None;
        }

        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                let employee = employee_repo::find_by_id(tx, employee_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("employee {}", employee_id)))?;

                if !employee.role.has_schedule() {
                    return Err(AppError::BadRequest(format!(
                        "{} employees do not have schedules",
                        employee.role
                    )));
                }

                let row = base_repo::upsert_base_day(tx, employee_id, weekday, input).await?;
                log::debug!("Base schedule for {} on {} saved", employee_id, weekday);
                Ok(row)
            })
        })
        .await
    }

    pub async fn get_base_week(&self, employee_id: Uuid) -> Result<Vec<BaseDaySchedule>, AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                employee_repo::find_by_id(tx, employee_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("employee {}", employee_id)))?;

                Ok(base_repo::list_for_employee(tx, employee_id).await?)
            })
        })
        .await
    }

    pub async fn delete_base_day(
        &self,
        employee_id: Uuid,
        weekday: Weekday,
    ) -> Result<(), AppError> {
        DatabaseTransaction::run(&self.pool, move |tx| {
            Box::pin(async move {
                if !base_repo::delete_base_day(tx, employee_id, weekday).await? {
                    return Err(AppError::NotFound(format!(
                        "base schedule for employee {} on {}",
                        employee_id, weekday
                    )));
                }
                Ok(())
            })
        })
        .await
    }
}
