//! CV handlers

use axum::extract::{Extension, Json, Path};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::{CvCreateRequest, CvRecord, CvResponse, CvStatus, CvStatusResponse};
use super::validators::CvCreateValidator;
use crate::auth::AuthedUser;
use crate::common::{generate_cv_id, ApiError, AppState, Validator};
use crate::profile::PersonalData;
use crate::services::queue::OptimizeJob;
use crate::services::OptimizeRequest;
use crate::services::{QueueError, SettingsError};

/// GET /api/v1/cvs
/// Lists the user's CVs, newest first
///
/// # Response
/// ```json
/// { "cvs": [ { "id": "CV_...", "status": "completed", ... } ] }
/// ```
pub async fn list_cvs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let records: Vec<CvRecord> = sqlx::query_as::<_, CvRecord>(
        "SELECT * FROM cvs WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let cvs: Vec<CvResponse> = records.into_iter().map(CvResponse::from).collect();
    Ok(Json(json!({ "cvs": cvs })))
}

/// POST /api/v1/cvs
/// Creates a CV record and queues it for optimization
///
/// The record is returned immediately with status `pending`; clients poll
/// the status endpoint until it reaches a terminal state.
pub async fn create_cv(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<CvCreateRequest>,
) -> Result<(StatusCode, Json<CvResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    let validation = CvCreateValidator.validate(&request);
    if !validation.is_valid {
        return Err(validation.into());
    }

    // Settings and credential must be in place before any record is created
    let settings = state
        .keys_service
        .get_settings(&authed.id)
        .await
        .map_err(map_settings_error)?;

    let api_key = state
        .keys_service
        .get_credential(&authed.id, &settings.provider)
        .await
        .map_err(map_settings_error)?
        .ok_or_else(|| {
            ApiError::BadRequest(
                "Missing API key in settings. Please configure your API key first.".to_string(),
            )
        })?;

    let cv_content = load_cv_content(&state, &authed.id).await?;
    if !has_base_content(&cv_content) {
        return Err(ApiError::BadRequest(
            "CV content is empty. Fill in your profile before creating a tailored CV.".to_string(),
        ));
    }

    let cv_id = generate_cv_id();

    sqlx::query(
        "INSERT INTO cvs (id, user_id, description, job_description, link, model, provider, \
         status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', datetime('now'), datetime('now'))",
    )
    .bind(&cv_id)
    .bind(&authed.id)
    .bind(request.description.trim())
    .bind(&request.job_description)
    .bind(request.link.as_deref())
    .bind(&settings.model)
    .bind(&settings.provider)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let job = OptimizeJob {
        cv_id: cv_id.clone(),
        request: OptimizeRequest {
            job_description: request.job_description.clone(),
            cv_content,
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            api_key,
        },
    };

    if let Err(e) = state.optimize_queue.submit(job) {
        // The record must not linger as pending when nothing will pick it up
        if let Err(db_err) = sqlx::query("DELETE FROM cvs WHERE id = ?")
            .bind(&cv_id)
            .execute(&state.db)
            .await
        {
            error!(cv_id = %cv_id, error = %db_err, "Failed to clean up rejected CV record");
        }

        return match e {
            QueueError::Full => {
                warn!(user_id = %authed.id, "CV creation rejected: optimization queue full");
                Err(ApiError::ServiceUnavailable(
                    "Optimization queue is full, try again shortly".to_string(),
                ))
            }
            QueueError::Closed => Err(ApiError::InternalServer(
                "Optimization queue is unavailable".to_string(),
            )),
        };
    }

    info!(cv_id = %cv_id, user_id = %authed.id, "CV created and queued for optimization");

    let record = fetch_owned_cv(&state, &cv_id, &authed.id).await?;
    Ok((StatusCode::CREATED, Json(CvResponse::from(record))))
}

/// GET /api/v1/cvs/:cv_id
/// Returns one CV record
pub async fn get_cv(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(cv_id): Path<String>,
) -> Result<Json<CvResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let record = fetch_owned_cv(&state, &cv_id, &authed.id).await?;
    Ok(Json(CvResponse::from(record)))
}

/// DELETE /api/v1/cvs/:cv_id
/// Deletes a CV record
pub async fn delete_cv(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(cv_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    // Ownership check before delete
    fetch_owned_cv(&state, &cv_id, &authed.id).await?;

    sqlx::query("DELETE FROM cvs WHERE id = ?")
        .bind(&cv_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(cv_id = %cv_id, user_id = %authed.id, "CV deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/cvs/:cv_id/status
/// Lightweight status endpoint for polling
pub async fn get_cv_status(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(cv_id): Path<String>,
) -> Result<Json<CvStatusResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let record = fetch_owned_cv(&state, &cv_id, &authed.id).await?;

    Ok(Json(CvStatusResponse {
        status: record.status,
        error_message: record.error_message,
    }))
}

/// GET /api/v1/cvs/:cv_id/pdf
/// Renders the optimized CV to PDF and returns it as a download
pub async fn download_cv_pdf(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(cv_id): Path<String>,
) -> Result<(HeaderMap, Vec<u8>), ApiError> {
    let state = state_lock.read().await.clone();
    let record = fetch_owned_cv(&state, &cv_id, &authed.id).await?;

    if record.status != CvStatus::Completed.as_str() {
        return Err(ApiError::BadRequest(format!(
            "CV is not ready. Current status: {}",
            record.status
        )));
    }

    let optimized = record.optimized_content().ok_or_else(|| {
        error!(cv_id = %record.id, "Completed CV has no stored optimized content");
        ApiError::InternalServer("Optimized CV content is missing".to_string())
    })?;

    let personal_data = load_personal_data(&state, &authed.id).await?;
    let personal = serde_json::to_value(&personal_data)
        .map_err(|e| ApiError::RenderError(e.to_string()))?;

    let sections = state.renderer.sections_from_value(&optimized);
    let html = state.renderer.render(&personal, &sections);

    let bytes = state.pdf_service.html_to_pdf(&html).await.map_err(|e| {
        error!(cv_id = %record.id, error = %e, "PDF generation failed");
        ApiError::RenderError("PDF generation failed".to_string())
    })?;

    info!(cv_id = %record.id, size = bytes.len(), "PDF generated for download");

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    let disposition = format!(
        "attachment; filename=\"{}.pdf\"",
        sanitize_filename(&record.description)
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"cv.pdf\"")),
    );

    Ok((headers, bytes))
}

// ---- Helper Functions ----

/// Fetch a CV and enforce ownership: missing -> 404, someone else's -> 403
async fn fetch_owned_cv(
    state: &AppState,
    cv_id: &str,
    user_id: &str,
) -> Result<CvRecord, ApiError> {
    let record: Option<CvRecord> = sqlx::query_as::<_, CvRecord>("SELECT * FROM cvs WHERE id = ?")
        .bind(cv_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let record = record.ok_or_else(|| ApiError::NotFound("CV not found".to_string()))?;

    if record.user_id != user_id {
        warn!(cv_id = %cv_id, user_id = %user_id, "Access denied to CV owned by another user");
        return Err(ApiError::Forbidden(
            "Not authorized to access this CV".to_string(),
        ));
    }

    Ok(record)
}

async fn load_cv_content(state: &AppState, user_id: &str) -> Result<Value, ApiError> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT cv_content FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    let (stored,) = row.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(stored
        .as_deref()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_else(|| json!({})))
}

async fn load_personal_data(state: &AppState, user_id: &str) -> Result<PersonalData, ApiError> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT personal_data FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    let (stored,) = row.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(PersonalData::from_stored(stored.as_deref()))
}

fn has_base_content(cv_content: &Value) -> bool {
    cv_content
        .as_object()
        .map(|map| !map.is_empty())
        .unwrap_or(false)
}

/// Keep the filename header safe: drop quotes, control chars, and path
/// separators
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '"' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "cv".to_string()
    } else {
        trimmed.to_string()
    }
}

fn map_settings_error(error: SettingsError) -> ApiError {
    match error {
        SettingsError::UserNotFound => ApiError::NotFound("User not found".to_string()),
        SettingsError::MissingProvider | SettingsError::MissingModel => {
            ApiError::BadRequest(error.to_string())
        }
        SettingsError::Database(e) => ApiError::DatabaseError(e),
        SettingsError::Encryption(_) => {
            ApiError::InternalServer("Credential processing failed".to_string())
        }
    }
}
