//! CV routes

use axum::{routing::get, Router};

use super::handlers;

/// Creates and returns the CV router
///
/// # Routes
/// - `GET /api/v1/cvs` - List the user's CVs
/// - `POST /api/v1/cvs` - Create a CV and queue optimization
/// - `GET /api/v1/cvs/:cv_id` - Fetch one CV
/// - `DELETE /api/v1/cvs/:cv_id` - Delete a CV
/// - `GET /api/v1/cvs/:cv_id/status` - Poll optimization status
/// - `GET /api/v1/cvs/:cv_id/pdf` - Download the completed CV as PDF
pub fn cv_routes() -> Router {
    Router::new()
        .route(
            "/api/v1/cvs",
            get(handlers::list_cvs).post(handlers::create_cv),
        )
        .route(
            "/api/v1/cvs/:cv_id",
            get(handlers::get_cv).delete(handlers::delete_cv),
        )
        .route("/api/v1/cvs/:cv_id/status", get(handlers::get_cv_status))
        .route("/api/v1/cvs/:cv_id/pdf", get(handlers::download_cv_pdf))
}
