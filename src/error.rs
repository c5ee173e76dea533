use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Machine-readable error code carried in every error body.
///
/// Clients branch on this instead of matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ValidationFailed,
    UsernameTaken,
    EmailTaken,
    MissingFile,
    UnsupportedMedia,
    NotAuthenticated,
    TokenInvalid,
    InvalidCredentials,
    NotFound,
    EmployeeNotFound,
    PayloadTooLarge,
    RateLimited,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "validation_failed",
            ErrorCode::UsernameTaken => "username_taken",
            ErrorCode::EmailTaken => "email_taken",
            ErrorCode::MissingFile => "missing_file",
            ErrorCode::UnsupportedMedia => "unsupported_media",
            ErrorCode::NotAuthenticated => "not_authenticated",
            ErrorCode::TokenInvalid => "token_invalid",
            ErrorCode::InvalidCredentials => "invalid_credentials",
            ErrorCode::NotFound => "not_found",
            ErrorCode::EmployeeNotFound => "employee_not_found",
            ErrorCode::PayloadTooLarge => "payload_too_large",
            ErrorCode::RateLimited => "rate_limited",
            ErrorCode::InternalError => "internal_error",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::UsernameTaken
            | ErrorCode::EmailTaken
            | ErrorCode::MissingFile
            | ErrorCode::UnsupportedMedia => StatusCode::BAD_REQUEST,
            ErrorCode::NotAuthenticated
            | ErrorCode::TokenInvalid
            | ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound | ErrorCode::EmployeeNotFound => StatusCode::NOT_FOUND,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to a person filling in a form.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Please check the highlighted details and try again.",
            ErrorCode::UsernameTaken => "That username is already taken.",
            ErrorCode::EmailTaken => "An account with that email already exists.",
            ErrorCode::MissingFile => "Please choose a photo to upload.",
            ErrorCode::UnsupportedMedia => "Only image files can be uploaded.",
            ErrorCode::NotAuthenticated => "Please log in to continue.",
            ErrorCode::TokenInvalid => "Your session has expired. Please log in again.",
            ErrorCode::InvalidCredentials => "Invalid username/email or password.",
            ErrorCode::NotFound => "The requested page does not exist.",
            ErrorCode::EmployeeNotFound => "That employee no longer exists.",
            ErrorCode::PayloadTooLarge => "The selected file is too large.",
            ErrorCode::RateLimited => "Too many attempts. Please wait a few minutes and try again.",
            ErrorCode::InternalError => "Something went wrong. Please try again.",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("Unknown error code: {s}"))
    }
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(ErrorCode, String),
    Unauthorized(ErrorCode, String),
    NotFound(ErrorCode, String),
    PayloadTooLarge(String),
    /// Seconds until the caller may retry.
    RateLimited(u64),
    Internal(String),
    Database(sqlx::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::BadRequest(ErrorCode::ValidationFailed, msg.into())
    }

    pub fn employee_not_found() -> Self {
        AppError::NotFound(ErrorCode::EmployeeNotFound, "Employee not found".to_string())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::BadRequest(code, _)
            | AppError::Unauthorized(code, _)
            | AppError::NotFound(code, _) => *code,
            AppError::PayloadTooLarge(_) => ErrorCode::PayloadTooLarge,
            AppError::RateLimited(_) => ErrorCode::RateLimited,
            AppError::Internal(_) | AppError::Database(_) => ErrorCode::InternalError,
        }
    }

    /// Message suitable for rendering next to a form. Validation messages are
    /// specific enough to show as-is; everything else uses the code's text.
    pub fn user_message(&self) -> String {
        match self {
            AppError::BadRequest(ErrorCode::ValidationFailed, msg) => msg.clone(),
            other => other.code().user_message().to_string(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::BadRequest(code, msg) => write!(f, "Bad Request ({code}): {msg}"),
            AppError::Unauthorized(code, msg) => write!(f, "Unauthorized ({code}): {msg}"),
            AppError::NotFound(code, msg) => write!(f, "Not Found ({code}): {msg}"),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload Too Large: {msg}"),
            AppError::RateLimited(secs) => write!(f, "Rate Limited: retry in {secs}s"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let message = match &self {
            AppError::BadRequest(_, msg)
            | AppError::Unauthorized(_, msg)
            | AppError::NotFound(_, msg)
            | AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::RateLimited(_) => {
                "Too many login attempts. Please try again later.".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                "Internal server error".to_string()
            }
        };

        let body = json!({ "status": false, "code": code, "message": message });
        let mut response = (code.http_status(), axum::Json(body)).into_response();

        if let AppError::RateLimited(secs) = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("employees_salary_positive") =>
            {
                AppError::validation("salary must be greater than zero")
            }
            _ => AppError::Database(err),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("I/O error: {err}"))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}
