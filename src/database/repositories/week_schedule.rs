use chrono::{NaiveDate, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{WeekSchedule, WeekScheduleInput, WeekStatus},
    utils::sql,
};
use crate::engine::DateRange;

/// Advisory lock key serialising week creation across connections.
const WEEK_CALENDAR_LOCK: i64 = 0x0057_4545_4b53;

/// Held until the transaction ends. Take it before checking for overlapping weeks.
pub async fn lock_week_calendar(tx: &mut Transaction<'_, Postgres>) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(WEEK_CALENDAR_LOCK)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

pub async fn create_week(
    tx: &mut Transaction<'_, Postgres>,
    input: WeekScheduleInput,
) -> Result<WeekSchedule, sqlx::Error> {
    let now = Utc::now();
    let week = sqlx::query_as::<_, WeekSchedule>(&sql(r#"
            INSERT INTO
                week_schedules (
                    name,
                    start_date,
                    end_date,
                    status,
                    created_by,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                name,
                start_date,
                end_date,
                status,
                created_by,
                created_at,
                updated_at
        "#))
    .bind(input.name)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(WeekStatus::Draft)
    .bind(input.created_by)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    Ok(week)
}

pub async fn find_by_id(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<WeekSchedule>, sqlx::Error> {
    let week = sqlx::query_as::<_, WeekSchedule>(&sql(r#"
            SELECT
                id,
                name,
                start_date,
                end_date,
                status,
                created_by,
                created_at,
                updated_at
            FROM
                week_schedules
            WHERE
                id = ?
        "#))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(week)
}

pub async fn list_weeks(
    tx: &mut Transaction<'_, Postgres>,
) -> Result<Vec<WeekSchedule>, sqlx::Error> {
    let weeks = sqlx::query_as::<_, WeekSchedule>(&sql(r#"
            SELECT
                id,
                name,
                start_date,
                end_date,
                status,
                created_by,
                created_at,
                updated_at
            FROM
                week_schedules
            ORDER BY
                start_date DESC
        "#))
    .fetch_all(&mut **tx)
    .await?;

    Ok(weeks)
}

/// Weeks whose range intersects `range`, any status.
pub async fn list_overlapping(
    tx: &mut Transaction<'_, Postgres>,
    range: &DateRange,
) -> Result<Vec<WeekSchedule>, sqlx::Error> {
    let weeks = sqlx::query_as::<_, WeekSchedule>(&sql(r#"
            SELECT
                id,
                name,
                start_date,
                end_date,
                status,
                created_by,
                created_at,
                updated_at
            FROM
                week_schedules
            WHERE
                start_date <= ?
                AND end_date >= ?
            ORDER BY
                start_date
        "#))
    .bind(range.end)
    .bind(range.start)
    .fetch_all(&mut **tx)
    .await?;

    Ok(weeks)
}

/// The active week covering `date`, if any.
pub async fn find_active_containing(
    tx: &mut Transaction<'_, Postgres>,
    date: NaiveDate,
) -> Result<Option<WeekSchedule>, sqlx::Error> {
    let week = sqlx::query_as::<_, WeekSchedule>(&sql(r#"
            SELECT
                id,
                name,
                start_date,
                end_date,
                status,
                created_by,
                created_at,
                updated_at
            FROM
                week_schedules
            WHERE
                start_date <= ?
                AND end_date >= ?
                AND status = ?
            ORDER BY
                start_date DESC
            LIMIT 1
        "#))
    .bind(date)
    .bind(date)
    .bind(WeekStatus::Active)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(week)
}

pub async fn update_status(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: WeekStatus,
) -> Result<Option<WeekSchedule>, sqlx::Error> {
    let week = sqlx::query_as::<_, WeekSchedule>(&sql(r#"
            UPDATE
                week_schedules
            SET
                status = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING
                id,
                name,
                start_date,
                end_date,
                status,
                created_by,
                created_at,
                updated_at
        "#))
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(week)
}

/// Day rows go with the week through the foreign key cascade.
pub async fn delete_week(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql(r#"
            DELETE FROM
                week_schedules
            WHERE
                id = ?
        "#))
    .bind(id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}
