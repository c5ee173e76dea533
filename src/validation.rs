use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+$").unwrap());

/// Trim `value` and reject it when nothing is left.
pub fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Like [`required`] and additionally checks the `local@domain` shape.
pub fn email(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = required(field, value)?;
    if !EMAIL_RE.is_match(&trimmed) {
        return Err(AppError::validation(format!(
            "{field} must be a valid email address"
        )));
    }
    Ok(trimmed)
}

pub fn salary(value: f64) -> Result<f64, AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::validation("salary must be greater than zero"));
    }
    Ok(value)
}
