use chrono::Utc;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{BaseDaySchedule, BaseDayScheduleInput, Weekday},
    utils::sql,
};

/// Inserts or replaces the (employee, weekday) template row.
pub async fn upsert_base_day(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: Uuid,
    weekday: Weekday,
    input: BaseDayScheduleInput,
) -> Result<BaseDaySchedule, sqlx::Error> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, BaseDaySchedule>(&sql(r#"
            INSERT INTO
                base_day_schedules (
                    employee_id,
                    weekday,
                    entry_time,
                    exit_time,
                    lunch_start,
                    lunch_end,
                    day_type,
                    shift,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (employee_id, weekday) DO UPDATE
            SET
                entry_time = EXCLUDED.entry_time,
                exit_time = EXCLUDED.exit_time,
                lunch_start = EXCLUDED.lunch_start,
                lunch_end = EXCLUDED.lunch_end,
                day_type = EXCLUDED.day_type,
                shift = EXCLUDED.shift,
                updated_at = EXCLUDED.updated_at
            RETURNING
                id,
                employee_id,
                weekday,
                entry_time,
                exit_time,
                lunch_start,
                lunch_end,
                day_type,
                shift,
                created_at,
                updated_at
        "#))
    .bind(employee_id)
    .bind(weekday)
    .bind(input.entry_time)
    .bind(input.exit_time)
    .bind(input.lunch_start)
    .bind(input.lunch_end)
    .bind(input.day_type)
    .bind(input.shift)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}

/// The employee's template, Monday first.
pub async fn list_for_employee(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: Uuid,
) -> Result<Vec<BaseDaySchedule>, sqlx::Error> {
    let mut rows = list_for_employees(tx, &[employee_id]).await?;
    rows.sort_by_key(|row| row.weekday);
    Ok(rows)
}

pub async fn list_for_employees(
    tx: &mut Transaction<'_, Postgres>,
    employee_ids: &[Uuid],
) -> Result<Vec<BaseDaySchedule>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BaseDaySchedule>(&sql(r#"
            SELECT
                id,
                employee_id,
                weekday,
                entry_time,
                exit_time,
                lunch_start,
                lunch_end,
                day_type,
                shift,
                created_at,
                updated_at
            FROM
                base_day_schedules
            WHERE
                employee_id = ANY(?)
        "#))
    .bind(employee_ids)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

pub async fn delete_base_day(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: Uuid,
    weekday: Weekday,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql(r#"
            DELETE FROM
                base_day_schedules
            WHERE
                employee_id = ?
                AND weekday = ?
        "#))
    .bind(employee_id)
    .bind(weekday)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}
