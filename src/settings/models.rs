//! Settings request/response models

use serde::{Deserialize, Serialize};

/// Current settings for display; the key is only ever shown masked
#[derive(Serialize, Debug)]
pub struct SettingsResponse {
    pub provider: String,
    pub model: String,
    pub api_key_display: Option<String>,
    pub has_api_key: bool,
}

/// Settings update payload; a missing or empty api_key keeps the stored one
#[derive(Deserialize, Debug)]
pub struct SettingsUpdateRequest {
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
}
