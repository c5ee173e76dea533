use std::net::IpAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_size: usize,
    pub token_ttl_minutes: i64,
    pub cors_origins: Vec<HeaderValue>,
    pub secure_cookies: bool,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("STAFFDESK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid STAFFDESK_HOST: {e}"))?;

        let port: u16 = env_or("STAFFDESK_PORT", "3001")
            .parse()
            .map_err(|e| format!("Invalid STAFFDESK_PORT: {e}"))?;

        let upload_dir = PathBuf::from(env_or("STAFFDESK_UPLOAD_DIR", "uploads"));

        let max_upload_size: usize = env_or("STAFFDESK_MAX_UPLOAD_SIZE", "5242880")
            .parse()
            .map_err(|e| format!("Invalid STAFFDESK_MAX_UPLOAD_SIZE: {e}"))?;

        let token_ttl_minutes: i64 = env_or("STAFFDESK_TOKEN_TTL_MINUTES", "60")
            .parse()
            .map_err(|e| format!("Invalid STAFFDESK_TOKEN_TTL_MINUTES: {e}"))?;
        if token_ttl_minutes <= 0 {
            return Err("STAFFDESK_TOKEN_TTL_MINUTES must be positive".to_string());
        }

        let cors_origins = parse_origins(&env_or("STAFFDESK_CORS_ORIGINS", ""))?;

        let secure_cookies = matches!(
            env_or("STAFFDESK_SECURE_COOKIES", "false").as_str(),
            "1" | "true" | "yes"
        );

        let log_level = env_or("STAFFDESK_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            upload_dir,
            max_upload_size,
            token_ttl_minutes,
            cors_origins,
            secure_cookies,
            log_level,
        })
    }
}

/// Comma-separated origin list. Empty means any origin is allowed.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            HeaderValue::from_str(s)
                .map_err(|e| format!("Invalid STAFFDESK_CORS_ORIGINS entry '{s}': {e}"))
        })
        .collect()
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
