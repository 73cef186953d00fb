//! Profile routes

use axum::{
    routing::{get, put},
    Router,
};

use super::handlers;

/// Creates and returns the profile router
///
/// # Routes
/// - `GET /api/v1/profile` - Personal data plus base CV content
/// - `PUT /api/v1/profile/personal` - Partial personal data update
/// - `PUT /api/v1/profile/content` - Replace base CV content
/// - `GET /api/v1/profile/preview` - Rendered HTML preview
pub fn profile_routes() -> Router {
    Router::new()
        .route("/api/v1/profile", get(handlers::get_profile))
        .route(
            "/api/v1/profile/personal",
            put(handlers::update_personal_data),
        )
        .route("/api/v1/profile/content", put(handlers::update_cv_content))
        .route("/api/v1/profile/preview", get(handlers::get_cv_preview))
}
