//! Settings handlers

use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::models::{SettingsResponse, SettingsUpdateRequest};
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};
use crate::providers::registry::{find_provider, is_valid_model};
use crate::services::SettingsError;

/// GET /api/v1/settings
/// Returns the current provider, model, and masked key status
///
/// # Response
/// ```json
/// {
///   "provider": "google",
///   "model": "gemini-2.5-flash",
///   "api_key_display": "•••5a2f",
///   "has_api_key": true
/// }
/// ```
pub async fn get_settings(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<SettingsResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let settings = state
        .keys_service
        .get_settings(&authed.id)
        .await
        .map_err(map_settings_error)?;

    Ok(Json(SettingsResponse {
        provider: settings.provider,
        model: settings.model,
        api_key_display: settings.api_key_display,
        has_api_key: settings.has_api_key,
    }))
}

/// PUT /api/v1/settings
/// Updates provider and model, optionally replacing the API key
pub async fn update_settings(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<SettingsUpdateRequest>,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    if find_provider(&request.provider).is_none() {
        return Err(ApiError::BadRequest(format!(
            "Provider '{}' not supported",
            request.provider
        )));
    }
    if !is_valid_model(&request.provider, &request.model) {
        return Err(ApiError::BadRequest(format!(
            "Model '{}' not available for provider '{}'",
            request.model, request.provider
        )));
    }

    state
        .keys_service
        .update_settings(
            &authed.id,
            &request.provider,
            &request.model,
            request.api_key.as_deref(),
        )
        .await
        .map_err(map_settings_error)?;

    info!(
        user_id = %authed.id,
        provider = %request.provider,
        model = %request.model,
        key_updated = request.api_key.as_deref().map_or(false, |k| !k.is_empty()),
        "User settings updated"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/settings/api-key
/// Removes the stored API key for the currently selected provider
pub async fn delete_api_key(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    let settings = state
        .keys_service
        .get_settings(&authed.id)
        .await
        .map_err(map_settings_error)?;

    let deleted = state
        .keys_service
        .delete_credential(&authed.id, &settings.provider)
        .await
        .map_err(map_settings_error)?;

    if !deleted {
        warn!(
            user_id = %authed.id,
            provider = %settings.provider,
            "API key deletion requested but no key was stored"
        );
        return Err(ApiError::NotFound("API key not found".to_string()));
    }

    info!(user_id = %authed.id, provider = %settings.provider, "API key deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---- Helper Functions ----

fn map_settings_error(error: SettingsError) -> ApiError {
    match error {
        SettingsError::UserNotFound => ApiError::NotFound("User not found".to_string()),
        SettingsError::MissingProvider | SettingsError::MissingModel => {
            ApiError::BadRequest(error.to_string())
        }
        SettingsError::Database(e) => ApiError::DatabaseError(e),
        SettingsError::Encryption(_) => {
            // Detail stays in the logs; the client gets a generic failure
            ApiError::InternalServer("Credential processing failed".to_string())
        }
    }
}
