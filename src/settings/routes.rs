//! Settings routes

use axum::{
    routing::{delete, get},
    Router,
};

use super::handlers;

/// Creates and returns the settings router
///
/// # Routes
/// - `GET /api/v1/settings` - Current provider/model and key status
/// - `PUT /api/v1/settings` - Update provider/model, optionally the key
/// - `DELETE /api/v1/settings/api-key` - Remove the stored key
pub fn settings_routes() -> Router {
    Router::new()
        .route(
            "/api/v1/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route("/api/v1/settings/api-key", delete(handlers::delete_api_key))
}
