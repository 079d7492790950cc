use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{AttendanceRecord, AttendanceStatus},
    utils::sql,
};
use crate::engine::DateRange;

pub async fn insert_record(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: Uuid,
    date: NaiveDate,
    entry_time: Option<NaiveTime>,
    status: AttendanceStatus,
    observations: Option<String>,
) -> Result<AttendanceRecord, sqlx::Error> {
    let now = Utc::now();
    let record = sqlx::query_as::<_, AttendanceRecord>(&sql(r#"
            INSERT INTO
                attendance_records (
                    employee_id,
                    date,
                    entry_time,
                    status,
                    observations,
                    auto_closed,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, FALSE, ?, ?)
            RETURNING
                id,
                employee_id,
                date,
                entry_time,
                exit_time,
                status,
                observations,
                auto_closed,
                created_at,
                updated_at
        "#))
    .bind(employee_id)
    .bind(date)
    .bind(entry_time)
    .bind(status)
    .bind(observations)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    Ok(record)
}

pub async fn find_record(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: Uuid,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    let record = sqlx::query_as::<_, AttendanceRecord>(&sql(r#"
            SELECT
                id,
                employee_id,
                date,
                entry_time,
                exit_time,
                status,
                observations,
                auto_closed,
                created_at,
                updated_at
            FROM
                attendance_records
            WHERE
                employee_id = ?
                AND date = ?
        "#))
    .bind(employee_id)
    .bind(date)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(record)
}

/// Same as [`find_record`] but holds a row lock until the transaction ends.
pub async fn find_record_for_update(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: Uuid,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    let record = sqlx::query_as::<_, AttendanceRecord>(&sql(r#"
            SELECT
                id,
                employee_id,
                date,
                entry_time,
                exit_time,
                status,
                observations,
                auto_closed,
                created_at,
                updated_at
            FROM
                attendance_records
            WHERE
                employee_id = ?
                AND date = ?
            FOR UPDATE
        "#))
    .bind(employee_id)
    .bind(date)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(record)
}

pub async fn set_entry(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    entry_time: NaiveTime,
    status: AttendanceStatus,
    observations: Option<String>,
) -> Result<AttendanceRecord, sqlx::Error> {
    let record = sqlx::query_as::<_, AttendanceRecord>(&sql(r#"
            UPDATE
                attendance_records
            SET
                entry_time = ?,
                status = ?,
                observations = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING
                id,
                employee_id,
                date,
                entry_time,
                exit_time,
                status,
                observations,
                auto_closed,
                created_at,
                updated_at
        "#))
    .bind(entry_time)
    .bind(status)
    .bind(observations)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(record)
}

pub async fn set_exit(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    exit_time: NaiveTime,
    observations: Option<String>,
    auto_closed: bool,
) -> Result<AttendanceRecord, sqlx::Error> {
    let record = sqlx::query_as::<_, AttendanceRecord>(&sql(r#"
            UPDATE
                attendance_records
            SET
                exit_time = ?,
                observations = ?,
                auto_closed = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING
                id,
                employee_id,
                date,
                entry_time,
                exit_time,
                status,
                observations,
                auto_closed,
                created_at,
                updated_at
        "#))
    .bind(exit_time)
    .bind(observations)
    .bind(auto_closed)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(record)
}

pub async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: AttendanceStatus,
    observations: Option<String>,
) -> Result<AttendanceRecord, sqlx::Error> {
    let record = sqlx::query_as::<_, AttendanceRecord>(&sql(r#"
            UPDATE
                attendance_records
            SET
                status = ?,
                observations = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING
                id,
                employee_id,
                date,
                entry_time,
                exit_time,
                status,
                observations,
                auto_closed,
                created_at,
                updated_at
        "#))
    .bind(status)
    .bind(observations)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(record)
}

pub async fn list_in_range(
    tx: &mut Transaction<'_, Postgres>,
    range: &DateRange,
    employee_id: Option<Uuid>,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let records = sqlx::query_as::<_, AttendanceRecord>(&sql(r#"
            SELECT
                id,
                employee_id,
                date,
                entry_time,
                exit_time,
                status,
                observations,
                auto_closed,
                created_at,
                updated_at
            FROM
                attendance_records
            WHERE
                date BETWEEN ? AND ?
                AND (?::uuid IS NULL OR employee_id = ?)
            ORDER BY
                date,
                employee_id
        "#))
    .bind(range.start)
    .bind(range.end)
    .bind(employee_id)
    .bind(employee_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(records)
}

/// Records with an entry and no exit dated on or before `date`. Rows locked by
/// an in-flight punch are skipped and picked up by the next sweep.
pub async fn list_open_up_to(
    tx: &mut Transaction<'_, Postgres>,
    date: NaiveDate,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let records = sqlx::query_as::<_, AttendanceRecord>(&sql(r#"
            SELECT
                id,
                employee_id,
                date,
                entry_time,
                exit_time,
                status,
                observations,
                auto_closed,
                created_at,
                updated_at
            FROM
                attendance_records
            WHERE
                entry_time IS NOT NULL
                AND exit_time IS NULL
                AND date <= ?
            ORDER BY
                date
            FOR UPDATE SKIP LOCKED
        "#))
    .bind(date)
    .fetch_all(&mut **tx)
    .await?;

    Ok(records)
}
