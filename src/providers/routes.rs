//! Provider routes

use axum::{routing::get, Router};

use super::handlers;

/// Creates and returns the provider router
///
/// # Routes
/// - `GET /api/v1/providers` - List providers and models
/// - `GET /api/v1/providers/:provider_id/models` - List models for a provider
pub fn provider_routes() -> Router {
    Router::new()
        .route("/api/v1/providers", get(handlers::list_providers))
        .route(
            "/api/v1/providers/:provider_id/models",
            get(handlers::list_provider_models),
        )
}
