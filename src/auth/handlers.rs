//! Authentication handlers

use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::extractors::AuthedUser;
use super::models::{Claims, LoginRequest, SignupRequest, TokenResponse, User};
use crate::common::{generate_user_id, safe_email_log, ApiError, AppState};
use crate::providers::registry::{DEFAULT_MODEL, DEFAULT_PROVIDER};

// Tokens live for 7 days; clients discard them on logout
const TOKEN_TTL_DAYS: i64 = 7;

const MIN_PASSWORD_LEN: usize = 8;

/// POST /api/v1/auth/signup
/// Creates a new account and returns a token (auto-login)
///
/// # Request Body
/// ```json
/// {
///   "email": "user@example.com",
///   "password": "at least 8 chars"
/// }
/// ```
///
/// # Response
/// ```json
/// {
///   "access_token": "<jwt>",
///   "token_type": "bearer",
///   "email": "user@example.com"
/// }
/// ```
pub async fn signup(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    let email = payload.email.trim().to_lowercase();
    if !is_plausible_email(&email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST).map_err(|e| {
        error!(error = %e, "Password hashing failed during signup");
        ApiError::InternalServer("Failed to create account".to_string())
    })?;

    let id = generate_user_id();

    // New accounts start on the default provider/model so CV creation works
    // as soon as an API key is configured
    let result = sqlx::query(
        "INSERT INTO users (id, email, password_hash, provider, model, created_at) \
         VALUES (?, ?, ?, ?, ?, datetime('now'))",
    )
    .bind(&id)
    .bind(&email)
    .bind(&password_hash)
    .bind(DEFAULT_PROVIDER)
    .bind(DEFAULT_MODEL)
    .execute(&state.db)
    .await;

    if let Err(e) = result {
        if is_unique_violation(&e) {
            warn!(email = %safe_email_log(&email), "Signup rejected: email already registered");
            return Err(ApiError::BadRequest("Email already registered".to_string()));
        }
        error!(error = %e, "Database error inserting new user during signup");
        return Err(ApiError::DatabaseError(e));
    }

    info!(
        user_id = %id,
        email = %safe_email_log(&email),
        "New user account created"
    );

    let token = issue_token(&state.jwt_secret, &id)?;
    Ok((StatusCode::CREATED, Json(TokenResponse::bearer(token, email))))
}

/// POST /api/v1/auth/login
/// Authenticates with email and password
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let email = payload.email.trim().to_lowercase();

    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    // Same response for unknown email and wrong password
    let Some(user) = user else {
        warn!(email = %safe_email_log(&email), "Login failed: unknown email");
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    };

    let verified = bcrypt::verify(&payload.password, &user.password_hash).unwrap_or(false);
    if !verified {
        warn!(
            user_id = %user.id,
            email = %safe_email_log(&email),
            "Login failed: password mismatch"
        );
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "User login successful"
    );

    let token = issue_token(&state.jwt_secret, &user.id)?;
    Ok(Json(TokenResponse::bearer(token, user.email)))
}

/// POST /api/v1/auth/logout
/// Logout is client-side token disposal; the endpoint only confirms it
pub async fn logout(authed: AuthedUser) -> Result<StatusCode, ApiError> {
    info!(user_id = %authed.id, "User logout");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
/// Returns the authenticated user's identity
pub async fn me(authed: AuthedUser) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(serde_json::json!({ "email": authed.email })))
}

// ---- Helper Functions ----

fn issue_token(secret: &str, user_id: &str) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, user_id = %user_id, "JWT encoding error");
        ApiError::InternalServer("jwt error".to_string())
    })
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint failed")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausible_email_check() {
        assert!(is_plausible_email("user@example.com"));
        assert!(is_plausible_email("a.b+c@sub.domain.org"));
        assert!(!is_plausible_email("no-at-sign"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("user@nodot"));
        assert!(!is_plausible_email("user@.leading"));
    }
}
