use std::collections::HashMap;

use askama::Template;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{EmployeeInput, EmployeePatch, EmployeeResponse};
use crate::routes::employees::parse_employee_id;
use crate::state::SharedState;
use crate::upload::{self, MultipartForm};
use crate::views::PageError;

#[derive(Template)]
#[template(path = "employees/list.html")]
struct ListTemplate {
    username: String,
    query: String,
    employees: Vec<EmployeeResponse>,
}

#[derive(Template)]
#[template(path = "employees/view.html")]
struct ViewTemplate {
    username: String,
    employee: EmployeeResponse,
}

#[derive(Template)]
#[template(path = "employees/form.html")]
struct FormTemplate {
    username: String,
    title: &'static str,
    action: String,
    cancel_url: String,
    submit_label: &'static str,
    values: FormValues,
    photo_url: String,
    error: Option<String>,
}

/// Raw form contents, kept as text so a rejected submission can be shown
/// back exactly as typed.
#[derive(Debug, Default, Clone)]
struct FormValues {
    first_name: String,
    last_name: String,
    email: String,
    position: String,
    salary: String,
    date_of_joining: String,
    department: String,
}

impl FormValues {
    fn from_fields(fields: &HashMap<String, String>) -> Self {
        let get = |name: &str| fields.get(name).cloned().unwrap_or_default();
        Self {
            first_name: get("first_name"),
            last_name: get("last_name"),
            email: get("email"),
            position: get("position"),
            salary: get("salary"),
            date_of_joining: get("date_of_joining"),
            department: get("department"),
        }
    }
}

impl From<&EmployeeResponse> for FormValues {
    fn from(emp: &EmployeeResponse) -> Self {
        Self {
            first_name: emp.first_name.clone(),
            last_name: emp.last_name.clone(),
            email: emp.email.clone(),
            position: emp.position.clone(),
            salary: emp.salary.to_string(),
            date_of_joining: emp.date_of_joining.to_string(),
            department: emp.department.clone(),
        }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
}

fn html<T: Template>(template: T) -> Response {
    Html(template.render().unwrap_or_default()).into_response()
}

async fn load(state: &SharedState, raw_id: &str) -> Result<EmployeeResponse, AppError> {
    let id = parse_employee_id(raw_id)?;
    db::employees::find_by_id(&state.pool, id)
        .await?
        .map(EmployeeResponse::from)
        .ok_or_else(AppError::employee_not_found)
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(q): Query<ListQuery>,
) -> Result<Response, PageError> {
    let query = q.q.unwrap_or_default();
    let employees = db::employees::list(&state.pool)
        .await?
        .into_iter()
        .map(EmployeeResponse::from)
        .filter(|emp| emp.matches(&query))
        .collect();

    Ok(html(ListTemplate {
        username: auth.username,
        query,
        employees,
    }))
}

pub async fn show(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let employee = load(&state, &id).await?;
    Ok(html(ViewTemplate {
        username: auth.username,
        employee,
    }))
}

fn add_form(username: String, values: FormValues, error: Option<String>) -> Response {
    html(FormTemplate {
        username,
        title: "Add Employee",
        action: "/employees/add".to_string(),
        cancel_url: "/employees".to_string(),
        submit_label: "Create",
        values,
        photo_url: String::new(),
        error,
    })
}

fn update_form(
    username: String,
    employee: &EmployeeResponse,
    values: FormValues,
    error: Option<String>,
) -> Response {
    html(FormTemplate {
        username,
        title: "Update Employee",
        action: format!("/employees/update/{}", employee.employee_id),
        cancel_url: format!("/employees/view/{}", employee.employee_id),
        submit_label: "Save Changes",
        values,
        photo_url: employee.photo_url.clone(),
        error,
    })
}

async fn read_form(
    state: &SharedState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<MultipartForm, AppError> {
    let body = upload::body_or_error(body, state.config.max_upload_size)?;
    upload::parse_multipart(headers, body).await
}

pub async fn add_page(auth: AuthUser) -> Response {
    add_form(auth.username, FormValues::default(), None)
}

pub async fn add_submit(
    auth: AuthUser,
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let mut form = match read_form(&state, &headers, body).await {
        Ok(form) => form,
        Err(err) => return add_form(auth.username, FormValues::default(), Some(err.user_message())),
    };

    match create_from_form(&state, &auth, &mut form).await {
        Ok(id) => Redirect::to(&format!("/employees/view/{id}")).into_response(),
        Err(err) => add_form(
            auth.username,
            FormValues::from_fields(&form.fields),
            Some(err.user_message()),
        ),
    }
}

async fn create_from_form(
    state: &SharedState,
    auth: &AuthUser,
    form: &mut MultipartForm,
) -> Result<Uuid, AppError> {
    let input = EmployeeInput::from_form(&form.fields)?;
    let photo = form.take_file("photo");
    if let Some(file) = &photo {
        upload::ensure_image(file)?;
    }

    let employee = db::employees::create(&state.pool, &input).await?;
    tracing::info!(employee_id = %employee.id, by = %auth.username, "Employee created");

    if let Some(file) = &photo {
        // Roll the row back so resubmitting the form cannot create a duplicate.
        if let Err(err) = upload::attach_photo(state, employee.id, file).await {
            db::employees::delete(&state.pool, employee.id).await?;
            tracing::warn!(employee_id = %employee.id, "Employee discarded after photo failure: {err}");
            return Err(err);
        }
    }
    Ok(employee.id)
}

pub async fn update_page(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let employee = load(&state, &id).await?;
    let values = FormValues::from(&employee);
    Ok(update_form(auth.username, &employee, values, None))
}

pub async fn update_submit(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, PageError> {
    // Unknown ids get the error page rather than a form that can never save.
    let existing = load(&state, &id).await?;

    let mut form = match read_form(&state, &headers, body).await {
        Ok(form) => form,
        Err(err) => {
            let values = FormValues::from(&existing);
            return Ok(update_form(auth.username, &existing, values, Some(err.user_message())));
        }
    };

    match update_from_form(&state, &auth, existing.employee_id, &mut form).await {
        Ok(()) => Ok(
            Redirect::to(&format!("/employees/view/{}", existing.employee_id)).into_response(),
        ),
        Err(err @ AppError::NotFound(..)) => Err(err.into()),
        Err(err) => Ok(update_form(
            auth.username,
            &existing,
            FormValues::from_fields(&form.fields),
            Some(err.user_message()),
        )),
    }
}

async fn update_from_form(
    state: &SharedState,
    auth: &AuthUser,
    id: Uuid,
    form: &mut MultipartForm,
) -> Result<(), AppError> {
    let patch = EmployeePatch::from(EmployeeInput::from_form(&form.fields)?);
    let photo = form.take_file("photo");
    if let Some(file) = &photo {
        upload::ensure_image(file)?;
    }

    db::employees::update(&state.pool, id, &patch)
        .await?
        .ok_or_else(AppError::employee_not_found)?;
    tracing::info!(employee_id = %id, by = %auth.username, "Employee updated");

    if let Some(file) = &photo {
        upload::attach_photo(state, id, file).await?;
    }
    Ok(())
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    // Same idempotent semantics as the API: unknown ids are a no-op.
    if let Ok(id) = Uuid::parse_str(&id) {
        if db::employees::delete(&state.pool, id).await? > 0 {
            tracing::info!(employee_id = %id, by = %auth.username, "Employee deleted");
        }
    }
    Ok(Redirect::to("/employees").into_response())
}
