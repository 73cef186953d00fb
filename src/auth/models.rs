//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// JWT claims structure
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// User database model
///
/// The password hash never leaves the server, and the JSON profile columns
/// are stored as raw text and parsed at the edges.
#[derive(FromRow, Serialize, Deserialize, Debug)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    #[serde(skip_serializing)]
    pub personal_data: Option<String>,
    #[serde(skip_serializing)]
    pub cv_content: Option<String>,
    pub created_at: Option<String>,
}

/// Signup request payload
#[derive(Deserialize, Debug)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

/// Login request payload
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token response returned by signup and login
#[derive(Serialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub email: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String, email: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            email,
        }
    }
}
