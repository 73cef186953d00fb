//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/v1/auth/signup` - Create an account (auto-login)
/// - `POST /api/v1/auth/login` - Email/password login
/// - `POST /api/v1/auth/logout` - Logout (client-side token removal)
/// - `GET /api/v1/auth/me` - Get current user information
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/v1/auth/signup", post(handlers::signup))
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/logout", post(handlers::logout))
        .route("/api/v1/auth/me", get(handlers::me))
}
