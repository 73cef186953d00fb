// src/services/keys.rs
//! User settings and encrypted provider credentials
//!
//! Settings (provider/model choice) live on the users table; API keys are
//! stored AES-encrypted in api_keys, one row per (user, provider). A missing
//! credential is reported as absent, never as an error, so orchestration can
//! map it to a pre-submission validation failure.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::common::mask_api_key;
use crate::services::encryption::{EncryptionError, EncryptionService};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("User not found")]
    UserNotFound,

    // Missing provider and missing model are distinct conditions so callers
    // can tell the user exactly what to configure
    #[error("Missing provider in user settings")]
    MissingProvider,

    #[error("Missing model in user settings")]
    MissingModel,

    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Resolved user settings for display and submission checks
#[derive(Debug, Clone)]
pub struct UserSettings {
    pub provider: String,
    pub model: String,
    pub api_key_display: Option<String>,
    pub has_api_key: bool,
}

#[derive(Debug)]
pub struct ApiKeyService {
    pool: SqlitePool,
    encryption: EncryptionService,
}

impl ApiKeyService {
    pub fn new(pool: SqlitePool, encryption: EncryptionService) -> Self {
        Self { pool, encryption }
    }

    /// Resolve the user's provider/model settings plus credential status
    pub async fn get_settings(&self, user_id: &str) -> Result<UserSettings, SettingsError> {
        let row: Option<(Option<String>, Option<String>)> =
            sqlx::query_as("SELECT provider, model FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        let (provider, model) = row.ok_or(SettingsError::UserNotFound)?;

        let provider = provider
            .filter(|p| !p.is_empty())
            .ok_or(SettingsError::MissingProvider)?;
        let model = model
            .filter(|m| !m.is_empty())
            .ok_or(SettingsError::MissingModel)?;

        let api_key_display = self.get_credential_display(user_id, &provider).await?;
        let has_api_key = self.get_credential(user_id, &provider).await?.is_some();

        Ok(UserSettings {
            provider,
            model,
            api_key_display,
            has_api_key,
        })
    }

    /// Update the user's provider/model choice, optionally storing a new key
    pub async fn update_settings(
        &self,
        user_id: &str,
        provider: &str,
        model: &str,
        api_key: Option<&str>,
    ) -> Result<(), SettingsError> {
        let result = sqlx::query("UPDATE users SET provider = ?, model = ? WHERE id = ?")
            .bind(provider)
            .bind(model)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SettingsError::UserNotFound);
        }

        if let Some(key) = api_key {
            if !key.is_empty() {
                self.store_credential(user_id, provider, key).await?;
            }
        }

        Ok(())
    }

    /// Store or replace the encrypted credential for (user, provider)
    pub async fn store_credential(
        &self,
        user_id: &str,
        provider: &str,
        api_key: &str,
    ) -> Result<(), SettingsError> {
        let encrypted = self.encryption.encrypt(api_key)?;
        let chars: Vec<char> = api_key.chars().collect();
        let last_chars: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO api_keys (user_id, provider, api_key_encrypted, last_chars, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, provider) DO UPDATE SET
                api_key_encrypted = excluded.api_key_encrypted,
                last_chars = excluded.last_chars,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(provider)
        .bind(&encrypted)
        .bind(&last_chars)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(provider = %provider, "Stored encrypted API key");
        Ok(())
    }

    /// Fetch and decrypt the credential, or None when absent.
    ///
    /// A credential that fails to decrypt (e.g. APP_SECRET_KEY changed) is
    /// treated as absent so the user is prompted to re-enter it.
    pub async fn get_credential(
        &self,
        user_id: &str,
        provider: &str,
    ) -> Result<Option<String>, SettingsError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT api_key_encrypted FROM api_keys WHERE user_id = ? AND provider = ?",
        )
        .bind(user_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await?;

        let Some((encrypted,)) = row else {
            return Ok(None);
        };

        match self.encryption.decrypt(&encrypted) {
            Ok(key) => Ok(Some(key)),
            Err(e) => {
                warn!(provider = %provider, error = %e, "Stored API key could not be decrypted");
                Ok(None)
            }
        }
    }

    /// Masked key for display, or None when no credential is stored
    pub async fn get_credential_display(
        &self,
        user_id: &str,
        provider: &str,
    ) -> Result<Option<String>, SettingsError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT last_chars FROM api_keys WHERE user_id = ? AND provider = ?")
                .bind(user_id)
                .bind(provider)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(last_chars,)| mask_api_key(&last_chars)))
    }

    /// Delete the credential for (user, provider); false when none existed
    pub async fn delete_credential(
        &self,
        user_id: &str,
        provider: &str,
    ) -> Result<bool, SettingsError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE user_id = ? AND provider = ?")
            .bind(user_id)
            .bind(provider)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        migrations::run_migrations(&pool).await.expect("migrations");
        pool
    }

    async fn insert_user(pool: &SqlitePool, id: &str, provider: Option<&str>, model: Option<&str>) {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, provider, model, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(format!("{}@example.com", id))
        .bind("hash")
        .bind(provider)
        .bind(model)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .expect("insert user");
    }

    fn service(pool: SqlitePool) -> ApiKeyService {
        ApiKeyService::new(pool, EncryptionService::from_secret("test-secret"))
    }

    #[tokio::test]
    async fn test_credential_roundtrip() {
        let pool = test_pool().await;
        let service = service(pool);

        assert!(service
            .get_credential("U_TEST01", "google")
            .await
            .unwrap()
            .is_none());

        service
            .store_credential("U_TEST01", "google", "sk-test-key-5a2f")
            .await
            .unwrap();

        let key = service.get_credential("U_TEST01", "google").await.unwrap();
        assert_eq!(key.as_deref(), Some("sk-test-key-5a2f"));

        let display = service
            .get_credential_display("U_TEST01", "google")
            .await
            .unwrap();
        assert_eq!(display.as_deref(), Some("•••5a2f"));

        assert!(service.delete_credential("U_TEST01", "google").await.unwrap());
        assert!(!service.delete_credential("U_TEST01", "google").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_settings_distinguishes_missing_fields() {
        let pool = test_pool().await;
        insert_user(&pool, "U_NOPROV", None, Some("gemini-2.5-flash")).await;
        insert_user(&pool, "U_NOMODL", Some("google"), None).await;
        insert_user(&pool, "U_FULL01", Some("google"), Some("gemini-2.5-flash")).await;
        let service = service(pool);

        assert!(matches!(
            service.get_settings("U_MISSING").await,
            Err(SettingsError::UserNotFound)
        ));
        assert!(matches!(
            service.get_settings("U_NOPROV").await,
            Err(SettingsError::MissingProvider)
        ));
        assert!(matches!(
            service.get_settings("U_NOMODL").await,
            Err(SettingsError::MissingModel)
        ));

        let settings = service.get_settings("U_FULL01").await.unwrap();
        assert_eq!(settings.provider, "google");
        assert_eq!(settings.model, "gemini-2.5-flash");
        assert!(!settings.has_api_key);
        assert!(settings.api_key_display.is_none());
    }

    #[tokio::test]
    async fn test_update_settings_stores_key() {
        let pool = test_pool().await;
        insert_user(&pool, "U_UPD001", Some("google"), Some("gemini-2.5-flash")).await;
        let service = service(pool);

        service
            .update_settings("U_UPD001", "groq", "openai/gpt-oss-120b", Some("gsk-abcd"))
            .await
            .unwrap();

        let settings = service.get_settings("U_UPD001").await.unwrap();
        assert_eq!(settings.provider, "groq");
        assert_eq!(settings.model, "openai/gpt-oss-120b");
        assert!(settings.has_api_key);

        assert!(matches!(
            service
                .update_settings("U_GHOST1", "google", "gemini-2.5-flash", None)
                .await,
            Err(SettingsError::UserNotFound)
        ));
    }
}
