//! Provider listing handlers

use axum::extract::{Json, Path};
use serde_json::{json, Value};

use super::registry::{find_provider, PROVIDERS};
use crate::common::ApiError;

/// GET /api/v1/providers
/// Lists all providers with their models
///
/// # Response
/// ```json
/// {
///   "providers": [
///     { "id": "google", "name": "Google", "models": [ ... ] }
///   ]
/// }
/// ```
pub async fn list_providers() -> Result<Json<Value>, ApiError> {
    let providers: Vec<Value> = PROVIDERS
        .iter()
        .map(|provider| {
            json!({
                "id": provider.id,
                "name": provider.name,
                "models": provider.models.iter().map(|m| json!({
                    "id": m.id,
                    "name": m.name,
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    Ok(Json(json!({ "providers": providers })))
}

/// GET /api/v1/providers/:provider_id/models
/// Lists the models for one provider
pub async fn list_provider_models(
    Path(provider_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let provider = find_provider(&provider_id)
        .ok_or_else(|| ApiError::NotFound(format!("Provider '{}' not found", provider_id)))?;

    let models: Vec<Value> = provider
        .models
        .iter()
        .map(|m| json!({ "id": m.id, "name": m.name }))
        .collect();

    Ok(Json(json!(models)))
}
