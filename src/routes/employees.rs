use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::{AppError, ErrorCode};
use crate::extract::{Json, Query};
use crate::models::{EmployeeInput, EmployeePatch, EmployeeResponse};
use crate::state::SharedState;
use crate::upload;

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub eid: Uuid,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub employee_id: Uuid,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct PhotoResponse {
    pub status: bool,
    pub message: String,
    pub photo_url: String,
}

/// Ids that do not parse can never match a record.
pub fn parse_employee_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::employee_not_found())
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<EmployeeResponse>>, AppError> {
    let employees = db::employees::list(&state.pool).await?;
    Ok(Json(employees.into_iter().map(EmployeeResponse::from).collect()))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<EmployeeInput>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let input = req.normalized()?;
    let employee = db::employees::create(&state.pool, &input).await?;

    tracing::info!(employee_id = %employee.id, by = %auth.username, "Employee created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Employee created successfully.".to_string(),
            employee_id: employee.id,
        }),
    ))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<EmployeeResponse>, AppError> {
    let id = parse_employee_id(&id)?;
    let employee = db::employees::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(AppError::employee_not_found)?;
    Ok(Json(employee.into()))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<EmployeePatch>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_employee_id(&id)?;
    let patch = req.normalized()?;

    db::employees::update(&state.pool, id, &patch)
        .await?
        .ok_or_else(AppError::employee_not_found)?;

    tracing::info!(employee_id = %id, by = %auth.username, "Employee updated");

    Ok(Json(MessageResponse {
        message: "Employee details updated successfully.".to_string(),
    }))
}

/// `DELETE /emp/employees?eid=<id>`
pub async fn delete_by_query(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<DeleteQuery>,
) -> Result<StatusCode, AppError> {
    remove(&state, &auth, q.eid).await
}

/// `DELETE /emp/employees/<id>`
pub async fn delete_by_path(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::validation(format!("Invalid employee id: {id}")))?;
    remove(&state, &auth, id).await
}

async fn remove(state: &SharedState, auth: &AuthUser, id: Uuid) -> Result<StatusCode, AppError> {
    let removed = db::employees::delete(&state.pool, id).await?;
    if removed > 0 {
        tracing::info!(employee_id = %id, by = %auth.username, "Employee deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_photo(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PhotoResponse>, AppError> {
    let id = parse_employee_id(&id)?;
    let body = upload::body_or_error(body, state.config.max_upload_size)?;
    let mut form = upload::parse_multipart(&headers, body).await?;
    let file = form.take_file("photo").ok_or_else(|| {
        AppError::BadRequest(ErrorCode::MissingFile, "No file uploaded".to_string())
    })?;

    let photo_url = upload::attach_photo(&state, id, &file).await?;

    Ok(Json(PhotoResponse {
        status: true,
        message: "Photo uploaded".to_string(),
        photo_url,
    }))
}
