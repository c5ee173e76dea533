use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Employee, EmployeeInput, EmployeePatch};

pub async fn list(pool: &PgPool) -> Result<Vec<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn create(pool: &PgPool, input: &EmployeeInput) -> Result<Employee, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "INSERT INTO employees
            (first_name, last_name, email, position, salary, date_of_joining, department)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.email)
    .bind(&input.position)
    .bind(input.salary)
    .bind(input.date_of_joining)
    .bind(&input.department)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM employees WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Apply the submitted fields; `None` keeps the stored value.
/// Returns `None` when no employee has this id.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    patch: &EmployeePatch,
) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "UPDATE employees SET
            first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            email = COALESCE($4, email),
            position = COALESCE($5, position),
            salary = COALESCE($6, salary),
            date_of_joining = COALESCE($7, date_of_joining),
            department = COALESCE($8, department),
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(patch.first_name.as_deref())
    .bind(patch.last_name.as_deref())
    .bind(patch.email.as_deref())
    .bind(patch.position.as_deref())
    .bind(patch.salary)
    .bind(patch.date_of_joining)
    .bind(patch.department.as_deref())
    .fetch_optional(pool)
    .await
}

pub async fn set_photo(
    pool: &PgPool,
    id: Uuid,
    photo_url: &str,
) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "UPDATE employees SET photo_url = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(photo_url)
    .fetch_optional(pool)
    .await
}

/// Returns the number of rows removed (0 or 1).
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM employees WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
