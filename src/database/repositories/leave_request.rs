use chrono::Utc;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{LeaveRequest, LeaveRequestInput, LeaveStatus, Role},
    utils::sql,
};
use crate::engine::DateRange;

pub async fn create_request(
    tx: &mut Transaction<'_, Postgres>,
    input: LeaveRequestInput,
) -> Result<LeaveRequest, sqlx::Error> {
    let now = Utc::now();
    let request = sqlx::query_as::<_, LeaveRequest>(&sql(r#"
            INSERT INTO
                leave_requests (
                    employee_id,
                    leave_type,
                    requested_at,
                    start_date,
                    end_date,
                    reason,
                    status,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                employee_id,
                leave_type,
                requested_at,
                start_date,
                end_date,
                reason,
                status,
                approved_by,
                approved_at,
                decision_notes,
                created_at,
                updated_at
        "#))
    .bind(input.employee_id)
    .bind(input.leave_type)
    .bind(now)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.reason)
    .bind(LeaveStatus::Pending)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    Ok(request)
}

/// Locks the row so concurrent decisions on the same request serialise.
pub async fn find_by_id_for_update(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    let request = sqlx::query_as::<_, LeaveRequest>(&sql(r#"
            SELECT
                id,
                employee_id,
                leave_type,
                requested_at,
                start_date,
                end_date,
                reason,
                status,
                approved_by,
                approved_at,
                decision_notes,
                created_at,
                updated_at
            FROM
                leave_requests
            WHERE
                id = ?
            FOR UPDATE
        "#))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(request)
}

pub async fn list_for_employee(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: Uuid,
) -> Result<Vec<LeaveRequest>, sqlx::Error> {
    let requests = sqlx::query_as::<_, LeaveRequest>(&sql(r#"
            SELECT
                id,
                employee_id,
                leave_type,
                requested_at,
                start_date,
                end_date,
                reason,
                status,
                approved_by,
                approved_at,
                decision_notes,
                created_at,
                updated_at
            FROM
                leave_requests
            WHERE
                employee_id = ?
            ORDER BY
                start_date DESC
        "#))
    .bind(employee_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(requests)
}

pub async fn list_by_status(
    tx: &mut Transaction<'_, Postgres>,
    status: LeaveStatus,
) -> Result<Vec<LeaveRequest>, sqlx::Error> {
    let requests = sqlx::query_as::<_, LeaveRequest>(&sql(r#"
            SELECT
                id,
                employee_id,
                leave_type,
                requested_at,
                start_date,
                end_date,
                reason,
                status,
                approved_by,
                approved_at,
                decision_notes,
                created_at,
                updated_at
            FROM
                leave_requests
            WHERE
                status = ?
            ORDER BY
                requested_at
        "#))
    .bind(status)
    .fetch_all(&mut **tx)
    .await?;

    Ok(requests)
}

/// Pending or approved requests of one employee intersecting `range`.
pub async fn list_active_overlapping(
    tx: &mut Transaction<'_, Postgres>,
    employee_id: Uuid,
    range: &DateRange,
) -> Result<Vec<LeaveRequest>, sqlx::Error> {
    let requests = sqlx::query_as::<_, LeaveRequest>(&sql(r#"
            SELECT
                id,
                employee_id,
                leave_type,
                requested_at,
                start_date,
                end_date,
                reason,
                status,
                approved_by,
                approved_at,
                decision_notes,
                created_at,
                updated_at
            FROM
                leave_requests
            WHERE
                employee_id = ?
                AND status IN (?, ?)
                AND start_date <= ?
                AND end_date >= ?
            ORDER BY
                start_date
        "#))
    .bind(employee_id)
    .bind(LeaveStatus::Pending)
    .bind(LeaveStatus::Approved)
    .bind(range.end)
    .bind(range.start)
    .fetch_all(&mut **tx)
    .await?;

    Ok(requests)
}

/// Pending or approved requests intersecting `range` from employees holding `role`.
pub async fn list_active_overlapping_for_role(
    tx: &mut Transaction<'_, Postgres>,
    role: Role,
    range: &DateRange,
) -> Result<Vec<LeaveRequest>, sqlx::Error> {
    let requests = sqlx::query_as::<_, LeaveRequest>(&sql(r#"
            SELECT
                r.id,
                r.employee_id,
                r.leave_type,
                r.requested_at,
                r.start_date,
                r.end_date,
                r.reason,
                r.status,
                r.approved_by,
                r.approved_at,
                r.decision_notes,
                r.created_at,
                r.updated_at
            FROM
                leave_requests r
                INNER JOIN employees e ON r.employee_id = e.id
            WHERE
                e.role = ?
                AND r.status IN (?, ?)
                AND r.start_date <= ?
                AND r.end_date >= ?
            ORDER BY
                r.start_date
        "#))
    .bind(role)
    .bind(LeaveStatus::Pending)
    .bind(LeaveStatus::Approved)
    .bind(range.end)
    .bind(range.start)
    .fetch_all(&mut **tx)
    .await?;

    Ok(requests)
}

/// Approved requests of any employee intersecting `range`.
pub async fn list_approved_overlapping(
    tx: &mut Transaction<'_, Postgres>,
    range: &DateRange,
) -> Result<Vec<LeaveRequest>, sqlx::Error> {
    let requests = sqlx::query_as::<_, LeaveRequest>(&sql(r#"
            SELECT
                id,
                employee_id,
                leave_type,
                requested_at,
                start_date,
                end_date,
                reason,
                status,
                approved_by,
                approved_at,
                decision_notes,
                created_at,
                updated_at
            FROM
                leave_requests
            WHERE
                status = ?
                AND start_date <= ?
                AND end_date >= ?
            ORDER BY
                approved_at,
                start_date
        "#))
    .bind(LeaveStatus::Approved)
    .bind(range.end)
    .bind(range.start)
    .fetch_all(&mut **tx)
    .await?;

    Ok(requests)
}

pub async fn record_decision(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: LeaveStatus,
    approver_id: Uuid,
    notes: Option<String>,
) -> Result<LeaveRequest, sqlx::Error> {
    let now = Utc::now();
    let request = sqlx::query_as::<_, LeaveRequest>(&sql(r#"
            UPDATE
                leave_requests
            SET
                status = ?,
                approved_by = ?,
                approved_at = ?,
                decision_notes = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING
                id,
                employee_id,
                leave_type,
                requested_at,
                start_date,
                end_date,
                reason,
                status,
                approved_by,
                approved_at,
                decision_notes,
                created_at,
                updated_at
        "#))
    .bind(status)
    .bind(approver_id)
    .bind(now)
    .bind(notes)
    .bind(now)
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(request)
}

pub async fn update_status(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: LeaveStatus,
) -> Result<LeaveRequest, sqlx::Error> {
    let request = sqlx::query_as::<_, LeaveRequest>(&sql(r#"
            UPDATE
                leave_requests
            SET
                status = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING
                id,
                employee_id,
                leave_type,
                requested_at,
                start_date,
                end_date,
                reason,
                status,
                approved_by,
                approved_at,
                decision_notes,
                created_at,
                updated_at
        "#))
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(request)
}
