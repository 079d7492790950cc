use chrono::{NaiveDate, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{DayFields, DaySchedule, NewDaySchedule, WeekStatus},
    utils::sql,
};
use crate::engine::DateRange;

pub async fn insert_day(
    tx: &mut Transaction<'_, Postgres>,
    week_schedule_id: Uuid,
    day: &NewDaySchedule,
) -> Result<DaySchedule, sqlx::Error> {
    let now = Utc::now();
    let fields = &day.fields;
    let row = sqlx::query_as::<_, DaySchedule>(&sql(r#"
            INSERT INTO
                day_schedules (
                    week_schedule_id,
                    employee_id,
                    date,
                    weekday,
                    entry_time,
                    exit_time,
                    lunch_start,
                    lunch_end,
                    day_type,
                    shift,
                    origin,
                    leave_request_id,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                week_schedule_id,
                employee_id,
                date,
                weekday,
                entry_time,
                exit_time,
                lunch_start,
                lunch_end,
                day_type,
                shift,
                origin,
                leave_request_id,
                created_at,
                updated_at
        "#))
    .bind(week_schedule_id)
    .bind(day.employee_id)
    .bind(day.date)
    .bind(day.weekday())
    .bind(fields.entry_time)
    .bind(fields.exit_time)
    .bind(fields.lunch_start)
    .bind(fields.lunch_end)
    .bind(fields.day_type.clone())
    .bind(fields.shift)
    .bind(fields.origin)
    .bind(fields.leave_request_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}

pub async fn insert_days(
    tx: &mut Transaction<'_, Postgres>,
    week_schedule_id: Uuid,
    days: &[NewDaySchedule],
) -> Result<Vec<DaySchedule>, sqlx::Error> {
    let mut rows = Vec::with_capacity(days.len());
    for day in days {
        rows.push(insert_day(tx, week_schedule_id, day).await?);
    }
    Ok(rows)
}

pub async fn find_by_id(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<DaySchedule>, sqlx::Error> {
    let row = sqlx::query_as::<_, DaySchedule>(&sql(r#"
            SELECT
                id,
                week_schedule_id,
                employee_id,
                date,
                weekday,
                entry_time,
                exit_time,
                lunch_start,
                lunch_end,
                day_type,
                shift,
                origin,
                leave_request_id,
                created_at,
                updated_at
            FROM
                day_schedules
            WHERE
                id = ?
            FOR UPDATE
        "#))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row)
}

pub async fn list_by_ids(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[Uuid],
) -> Result<Vec<DaySchedule>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DaySchedule>(&sql(r#"
            SELECT
                id,
                week_schedule_id,
                employee_id,
                date,
                weekday,
                entry_time,
                exit_time,
                lunch_start,
                lunch_end,
                day_type,
                shift,
                origin,
                leave_request_id,
                created_at,
                updated_at
            FROM
                day_schedules
            WHERE
                id = ANY(?)
            ORDER BY
                employee_id,
                date
            FOR UPDATE
        "#))
    .bind(ids)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

pub async fn list_for_week(
    tx: &mut Transaction<'_, Postgres>,
    week_schedule_id: Uuid,
) -> Result<Vec<DaySchedule>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DaySchedule>(&sql(r#"
            SELECT
                id,
                week_schedule_id,
                employee_id,
                date,
                weekday,
                entry_time,
                exit_time,
                lunch_start,
                lunch_end,
                day_type,
                shift,
                origin,
                leave_request_id,
                created_at,
                updated_at
            FROM
                day_schedules
            WHERE
                week_schedule_id = ?
            ORDER BY
                employee_id,
                date
        "#))
    .bind(week_schedule_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

/// Rows of active weeks dated inside `range`.
pub async fn list_active_in_range(
    tx: &mut Transaction<'_, Postgres>,
    range: &DateRange,
) -> Result<Vec<DaySchedule>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DaySchedule>(&sql(r#"
            SELECT
                d.id,
                d.week_schedule_id,
                d.employee_id,
                d.date,
                d.weekday,
                d.entry_time,
                d.exit_time,
                d.lunch_start,
                d.lunch_end,
                d.day_type,
                d.shift,
                d.origin,
                d.leave_request_id,
                d.created_at,
                d.updated_at
            FROM
                day_schedules d
                INNER JOIN week_schedules w ON d.week_schedule_id = w.id
            WHERE
                d.date BETWEEN ? AND ?
                AND w.status = ?
            ORDER BY
                d.employee_id,
                d.date
        "#))
    .bind(range.start)
    .bind(range.end)
    .bind(WeekStatus::Active)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

pub async fn find_in_week(
    tx: &mut Transaction<'_, Postgres>,
    week_schedule_id: Uuid,
    employee_id: Uuid,
    date: NaiveDate,
) -> Result<Option<DaySchedule>, sqlx::Error> {
    let row = sqlx::query_as::<_, DaySchedule>(&sql(r#"
            SELECT
                id,
                week_schedule_id,
                employee_id,
                date,
                weekday,
                entry_time,
                exit_time,
                lunch_start,
                lunch_end,
                day_type,
                shift,
                origin,
                leave_request_id,
                created_at,
                updated_at
            FROM
                day_schedules
            WHERE
                week_schedule_id = ?
                AND employee_id = ?
                AND date = ?
        "#))
    .bind(week_schedule_id)
    .bind(employee_id)
    .bind(date)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row)
}

pub async fn list_by_leave_request(
    tx: &mut Transaction<'_, Postgres>,
    leave_request_id: Uuid,
) -> Result<Vec<DaySchedule>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DaySchedule>(&sql(r#"
            SELECT
                id,
                week_schedule_id,
                employee_id,
                date,
                weekday,
                entry_time,
                exit_time,
                lunch_start,
                lunch_end,
                day_type,
                shift,
                origin,
                leave_request_id,
                created_at,
                updated_at
            FROM
                day_schedules
            WHERE
                leave_request_id = ?
            ORDER BY
                date
            FOR UPDATE
        "#))
    .bind(leave_request_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

/// Writes every mutable column of the row at once.
pub async fn update_fields(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    fields: &DayFields,
) -> Result<DaySchedule, sqlx::Error> {
    let row = sqlx::query_as::<_, DaySchedule>(&sql(r#"
            UPDATE
                day_schedules
            SET
                entry_time = ?,
                exit_time = ?,
                lunch_start = ?,
                lunch_end = ?,
                day_type = ?,
                shift = ?,
                origin = ?,
                leave_request_id = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING
                id,
                week_schedule_id,
                employee_id,
                date,
                weekday,
                entry_time,
                exit_time,
                lunch_start,
                lunch_end,
                day_type,
                shift,
                origin,
                leave_request_id,
                created_at,
                updated_at
        "#))
    .bind(fields.entry_time)
    .bind(fields.exit_time)
    .bind(fields.lunch_start)
    .bind(fields.lunch_end)
    .bind(fields.day_type.clone())
    .bind(fields.shift)
    .bind(fields.origin)
    .bind(fields.leave_request_id)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}
