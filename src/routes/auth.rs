use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::{encode_token, Claims};
use crate::auth::password;
use crate::db;
use crate::error::{AppError, ErrorCode};
use crate::extract::Json;
use crate::models::User;
use crate::state::{AppState, SharedState};
use crate::validation;

#[derive(Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub jwt_token: String,
    pub user_id: Uuid,
    pub username: String,
}

pub async fn signup(
    State(state): State<SharedState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let user = register_user(&state, &req.username, &req.email, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully.".to_string(),
            user_id: user.id,
        }),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let identifier = req
        .username
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .or(req.email.as_deref().filter(|s| !s.trim().is_empty()))
        .ok_or_else(|| AppError::validation("username or email is required"))?;

    let (user, jwt_token) = authenticate(&state, identifier, &req.password).await?;

    Ok(Json(LoginResponse {
        message: "Login successful.".to_string(),
        jwt_token,
        user_id: user.id,
        username: user.username,
    }))
}

/// Validate, hash and persist a new user. Shared by the API and the signup page.
pub async fn register_user(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let username = validation::required("username", username)?;
    let email = validation::email("email", email)?;
    if password.is_empty() {
        return Err(AppError::validation("password is required"));
    }

    let pw_hash = password::hash(password).map_err(AppError::Internal)?;

    let user = db::users::create(&state.pool, &username, &email, &pw_hash)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                if db_err.constraint() == Some("users_email_key") {
                    AppError::BadRequest(
                        ErrorCode::EmailTaken,
                        "A user with this email already exists".to_string(),
                    )
                } else {
                    AppError::BadRequest(
                        ErrorCode::UsernameTaken,
                        "A user with this username already exists".to_string(),
                    )
                }
            }
            _ => AppError::from(e),
        })?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");
    Ok(user)
}

/// Check credentials and issue a signed token. Shared by the API and the
/// login page.
pub async fn authenticate(
    state: &AppState,
    identifier: &str,
    password: &str,
) -> Result<(User, String), AppError> {
    let identifier = identifier.trim();

    state
        .login_limiter
        .check(identifier)
        .map_err(AppError::RateLimited)?;

    let invalid = || {
        AppError::Unauthorized(
            ErrorCode::InvalidCredentials,
            "Invalid username/email or password".to_string(),
        )
    };

    let Some(user) = db::users::find_by_identifier(&state.pool, identifier).await? else {
        state.login_limiter.record_failure(identifier);
        tracing::warn!("Login failed for unknown identifier");
        return Err(invalid());
    };

    let valid = password::verify(password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        state.login_limiter.record_failure(identifier);
        tracing::warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    let claims = Claims::new(
        user.id,
        user.username.clone(),
        state.config.token_ttl_minutes,
    );
    let token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok((user, token))
}
