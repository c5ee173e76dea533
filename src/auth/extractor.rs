use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::{AppError, ErrorCode};
use crate::state::SharedState;

/// Cookie used by the server-rendered pages to carry the same JWT that API
/// clients send as a bearer token.
pub const ACCESS_COOKIE: &str = "access_token";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

impl AuthUser {
    fn from_token(token: &str, secret: &str) -> Result<Self, AppError> {
        let claims = jwt::decode_token(token, secret).map_err(|e| {
            tracing::debug!("Rejected token: {e}");
            AppError::Unauthorized(
                ErrorCode::TokenInvalid,
                "Invalid or expired token".to_string(),
            )
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.username,
        })
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        // Try Bearer token from Authorization header first
        if let Some(auth_header) = parts.headers.get(AUTHORIZATION) {
            let auth_str = auth_header.to_str().map_err(|_| {
                AppError::Unauthorized(
                    ErrorCode::TokenInvalid,
                    "Invalid authorization header".to_string(),
                )
            })?;

            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return AuthUser::from_token(token.trim(), &state.config.jwt_secret);
            }
        }

        // Then the browser session cookie
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(ACCESS_COOKIE) {
            return AuthUser::from_token(cookie.value(), &state.config.jwt_secret);
        }

        Err(AppError::Unauthorized(
            ErrorCode::NotAuthenticated,
            "Missing authentication token".to_string(),
        ))
    }
}
