use std::collections::HashMap;
use std::path::Path;

use axum::extract::rejection::BytesRejection;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, ErrorCode};
use crate::state::AppState;

/// URL prefix under which `upload_dir` is served.
pub const PUBLIC_PREFIX: &str = "/uploads";

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A decoded `multipart/form-data` body: text fields plus file parts keyed
/// by field name.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

/// Unwrap a buffered request body, reporting an oversized one as 413.
pub fn body_or_error(body: Result<Bytes, BytesRejection>, limit: usize) -> Result<Bytes, AppError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(format!("Upload exceeds the {limit} byte limit"))
        } else {
            AppError::validation(rejection.body_text())
        }
    })
}

/// Parse multipart form data using multer.
///
/// File parts with no content are dropped: that is what a browser sends for
/// a file input left empty.
pub async fn parse_multipart(headers: &HeaderMap, body: Bytes) -> Result<MultipartForm, AppError> {
    let boundary = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| AppError::validation("Expected a multipart/form-data body"))?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut form = MultipartForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(|m| m.essence_str().to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("File read error: {e}")))?;
                if data.is_empty() {
                    continue;
                }
                form.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        data,
                    },
                );
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Field read error: {e}")))?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}

/// Reduce a client-supplied file name to a safe basename.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return "photo".to_string();
    }

    // Keep the tail so the extension survives truncation.
    let skip = cleaned.chars().count().saturating_sub(MAX_NAME_LEN);
    cleaned.chars().skip(skip).collect()
}

/// `<unix millis>-<4 hex chars>-<sanitized name>`
pub fn stored_file_name(original: &str) -> String {
    let suffix: [u8; 2] = rand::random();
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        hex::encode(suffix),
        sanitize_file_name(original)
    )
}

pub fn ensure_image(file: &UploadedFile) -> Result<(), AppError> {
    match file.content_type.as_deref() {
        Some(ct) if !ct.starts_with("image/") => Err(AppError::BadRequest(
            ErrorCode::UnsupportedMedia,
            format!("Expected an image upload, got {ct}"),
        )),
        _ => Ok(()),
    }
}

/// Write the file under `dir` and return its public URL.
pub async fn save_photo(dir: &Path, file: &UploadedFile) -> Result<String, AppError> {
    tokio::fs::create_dir_all(dir).await?;

    let name = stored_file_name(&file.file_name);
    tokio::fs::write(dir.join(&name), &file.data).await?;

    Ok(format!("{PUBLIC_PREFIX}/{name}"))
}

/// Delete a file previously stored by [`save_photo`]. Best effort.
pub async fn remove_photo(dir: &Path, photo_url: &str) {
    let Some(name) = photo_url.strip_prefix(&format!("{PUBLIC_PREFIX}/")) else {
        return;
    };
    if let Err(e) = tokio::fs::remove_file(dir.join(name)).await {
        tracing::warn!(%photo_url, "Could not remove photo: {e}");
    }
}

/// Store `file` as the photo of employee `id` and return the new `photo_url`.
/// Nothing is written when the employee does not exist.
pub async fn attach_photo(state: &AppState, id: Uuid, file: &UploadedFile) -> Result<String, AppError> {
    ensure_image(file)?;

    if !db::employees::exists(&state.pool, id).await? {
        return Err(AppError::employee_not_found());
    }

    let photo_url = save_photo(&state.config.upload_dir, file).await?;

    match db::employees::set_photo(&state.pool, id, &photo_url).await {
        Ok(Some(_)) => {}
        // Deleted between the check and the update.
        Ok(None) => {
            remove_photo(&state.config.upload_dir, &photo_url).await;
            return Err(AppError::employee_not_found());
        }
        Err(e) => {
            remove_photo(&state.config.upload_dir, &photo_url).await;
            return Err(e.into());
        }
    }

    tracing::info!(employee_id = %id, %photo_url, "Employee photo updated");
    Ok(photo_url)
}
