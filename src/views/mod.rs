pub mod auth;
pub mod employees;

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::error::AppError;
use crate::state::SharedState;

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/employees") }))
        // Auth views
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/signup", get(auth::signup_page).post(auth::signup_submit))
        .route("/logout", post(auth::logout))
        // Employees
        .route("/employees", get(employees::list))
        .route(
            "/employees/add",
            get(employees::add_page).post(employees::add_submit),
        )
        .route("/employees/view/{id}", get(employees::show))
        .route(
            "/employees/update/{id}",
            get(employees::update_page).post(employees::update_submit),
        )
        .route("/employees/delete/{id}", post(employees::delete))
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    title: String,
    message: String,
}

/// Error type for page handlers. Renders an HTML error page, except for 401
/// which is passed through so the redirect middleware can send the browser to
/// the login page.
pub struct PageError(AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        PageError(err)
    }
}

impl From<sqlx::Error> for PageError {
    fn from(err: sqlx::Error) -> Self {
        PageError(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.code().http_status();
        if status == StatusCode::UNAUTHORIZED {
            return self.0.into_response();
        }
        if status.is_server_error() {
            tracing::error!("Page error: {}", self.0);
        }

        let template = ErrorTemplate {
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.0.user_message(),
        };
        (status, Html(template.render().unwrap_or_default())).into_response()
    }
}
