pub mod auth;
pub mod employees;

use axum::http::Uri;
use axum::routing::{any, get, post};
use axum::Router;

use crate::error::{AppError, ErrorCode};
use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/user/signup", post(auth::signup))
        .route("/api/v1/user/login", post(auth::login))
        // Employees
        .route(
            "/api/v1/emp/employees",
            get(employees::list)
                .post(employees::create)
                .delete(employees::delete_by_query),
        )
        .route(
            "/api/v1/emp/employees/{id}",
            get(employees::get)
                .put(employees::update)
                .delete(employees::delete_by_path),
        )
        .route(
            "/api/v1/emp/employees/{id}/photo",
            post(employees::upload_photo),
        )
        // Unknown API paths still get the JSON error envelope
        .route("/api/v1/{*rest}", any(not_found))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(ErrorCode::NotFound, format!("No such endpoint: {}", uri.path()))
}
