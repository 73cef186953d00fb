//! Profile handlers

use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::models::{CvContentUpdate, PersonalData, PersonalDataUpdate};
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};

/// GET /api/v1/profile
/// Returns the user's personal data and base CV content
///
/// # Response
/// ```json
/// {
///   "personal_data": { "full_name": "...", ... },
///   "cv_content": { "professional_summary": "...", ... }
/// }
/// ```
pub async fn get_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let (personal_data, cv_content) = load_profile_columns(&state, &authed.id).await?;

    Ok(Json(json!({
        "personal_data": PersonalData::from_stored(personal_data.as_deref()),
        "cv_content": parse_cv_content(cv_content.as_deref()),
    })))
}

/// PUT /api/v1/profile/personal
/// Partially updates personal data; absent fields are left unchanged
pub async fn update_personal_data(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(patch): Json<PersonalDataUpdate>,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    let (stored, _) = load_profile_columns(&state, &authed.id).await?;
    let mut personal_data = PersonalData::from_stored(stored.as_deref());
    personal_data.merge_patch(&patch);

    let serialized = serde_json::to_string(&personal_data)
        .map_err(|e| ApiError::InternalServer(format!("Failed to serialize profile: {}", e)))?;

    sqlx::query("UPDATE users SET personal_data = ? WHERE id = ?")
        .bind(&serialized)
        .bind(&authed.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    debug!(user_id = %authed.id, "Personal data updated");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/profile/content
/// Replaces the user's base CV content
pub async fn update_cv_content(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(update): Json<CvContentUpdate>,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    let serialized = serde_json::to_string(&update.cv_content)
        .map_err(|e| ApiError::InternalServer(format!("Failed to serialize content: {}", e)))?;

    let result = sqlx::query("UPDATE users SET cv_content = ? WHERE id = ?")
        .bind(&serialized)
        .bind(&authed.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!(user_id = %authed.id, "CV content replaced");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/profile/preview
/// Renders the stored CV content as an HTML document
///
/// # Response
/// ```json
/// { "html": "<!DOCTYPE html>..." }
/// ```
pub async fn get_cv_preview(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let (personal_data, cv_content) = load_profile_columns(&state, &authed.id).await?;

    let personal = serde_json::to_value(PersonalData::from_stored(personal_data.as_deref()))
        .map_err(|e| ApiError::RenderError(e.to_string()))?;
    let content = parse_cv_content(cv_content.as_deref());

    let sections = state.renderer.sections_from_value(&content);
    let html = state.renderer.render(&personal, &sections);

    Ok(Json(json!({ "html": html })))
}

// ---- Helper Functions ----

async fn load_profile_columns(
    state: &AppState,
    user_id: &str,
) -> Result<(Option<String>, Option<String>), ApiError> {
    let row: Option<(Option<String>, Option<String>)> =
        sqlx::query_as("SELECT personal_data, cv_content FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    row.ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

fn parse_cv_content(stored: Option<&str>) -> Value {
    stored
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_else(|| json!({}))
}
