use chrono::Utc;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{Employee, EmployeeInput, Role},
    utils::sql,
};

pub async fn create_employee(
    tx: &mut Transaction<'_, Postgres>,
    input: EmployeeInput,
) -> Result<Employee, sqlx::Error> {
    let now = Utc::now();
    let employee = sqlx::query_as::<_, Employee>(&sql(r#"
            INSERT INTO
                employees (
                    full_name,
                    email,
                    role,
                    is_active,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, TRUE, ?, ?)
            RETURNING
                id,
                full_name,
                email,
                role,
                is_active,
                created_at,
                updated_at
        "#))
    .bind(input.full_name)
    .bind(input.email)
    .bind(input.role)
    .bind(now)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    Ok(employee)
}

pub async fn find_by_id(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Employee>, sqlx::Error> {
    let employee = sqlx::query_as::<_, Employee>(&sql(r#"
            SELECT
                id,
                full_name,
                email,
                role,
                is_active,
                created_at,
                updated_at
            FROM
                employees
            WHERE
                id = ?
        "#))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(employee)
}

/// Active, non-admin employees ordered by name.
pub async fn list_eligible(
    tx: &mut Transaction<'_, Postgres>,
) -> Result<Vec<Employee>, sqlx::Error> {
    let employees = sqlx::query_as::<_, Employee>(&sql(r#"
            SELECT
                id,
                full_name,
                email,
                role,
                is_active,
                created_at,
                updated_at
            FROM
                employees
            WHERE
                is_active = TRUE
                AND role <> ?
            ORDER BY
                full_name,
                id
        "#))
    .bind(Role::Admin)
    .fetch_all(&mut **tx)
    .await?;

    Ok(employees)
}

pub async fn list_by_role(
    tx: &mut Transaction<'_, Postgres>,
    role: Role,
) -> Result<Vec<Employee>, sqlx::Error> {
    let employees = sqlx::query_as::<_, Employee>(&sql(r#"
            SELECT
                id,
                full_name,
                email,
                role,
                is_active,
                created_at,
                updated_at
            FROM
                employees
            WHERE
                role = ?
            ORDER BY
                full_name
        "#))
    .bind(role)
    .fetch_all(&mut **tx)
    .await?;

    Ok(employees)
}

pub async fn set_active(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    is_active: bool,
) -> Result<Option<Employee>, sqlx::Error> {
    let employee = sqlx::query_as::<_, Employee>(&sql(r#"
            UPDATE
                employees
            SET
                is_active = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING
                id,
                full_name,
                email,
                role,
                is_active,
                created_at,
                updated_at
        "#))
    .bind(is_active)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(employee)
}
