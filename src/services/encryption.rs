// src/services/encryption.rs
//! AES-256-GCM encryption for provider API keys at rest
//!
//! The key is derived from APP_SECRET_KEY, so a single configured secret
//! covers both JWT signing and credential encryption.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid encrypted data format")]
    InvalidDataFormat,
}

pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("cipher", &"<encrypted>")
            .finish()
    }
}

impl EncryptionService {
    /// Build the cipher from the application secret.
    ///
    /// The secret bytes are truncated or zero-padded to the 32 bytes AES-256
    /// requires, so any configured APP_SECRET_KEY produces a working cipher.
    pub fn from_secret(secret: &str) -> Self {
        let mut key_bytes = [0u8; 32];
        let src = secret.as_bytes();
        let len = src.len().min(32);
        key_bytes[..len].copy_from_slice(&src[..len]);

        let key = aes_gcm::Key::<Aes256Gcm>::from_slice(&key_bytes);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Encrypt a plaintext string and return base64-encoded nonce+ciphertext
    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        // 12-byte random nonce for GCM
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(combined))
    }

    /// Decrypt a base64-encoded nonce+ciphertext and return the plaintext
    pub fn decrypt(&self, encrypted: &str) -> Result<String, EncryptionError> {
        let combined = BASE64
            .decode(encrypted.as_bytes())
            .map_err(|_| EncryptionError::InvalidDataFormat)?;

        if combined.len() < 12 {
            return Err(EncryptionError::InvalidDataFormat);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext_bytes = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| EncryptionError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext_bytes)
            .map_err(|_| EncryptionError::DecryptionFailed("invalid UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let service = EncryptionService::from_secret("a-test-application-secret");

        let plaintext = "sensitive_api_key_12345";
        let encrypted = service.encrypt(plaintext).unwrap();

        assert_ne!(encrypted, plaintext);
        assert_eq!(service.decrypt(&encrypted).unwrap(), plaintext);
    }

    #[test]
    fn test_encrypt_produces_different_ciphertext() {
        let service = EncryptionService::from_secret("a-test-application-secret");

        let plaintext = "test_data";
        let encrypted1 = service.encrypt(plaintext).unwrap();
        let encrypted2 = service.encrypt(plaintext).unwrap();

        // Random nonce: same plaintext, different ciphertext
        assert_ne!(encrypted1, encrypted2);
        assert_eq!(service.decrypt(&encrypted1).unwrap(), plaintext);
        assert_eq!(service.decrypt(&encrypted2).unwrap(), plaintext);
    }

    #[test]
    fn test_short_and_long_secrets_are_accepted() {
        let short = EncryptionService::from_secret("s");
        let long = EncryptionService::from_secret(&"x".repeat(100));

        let encrypted = short.encrypt("value").unwrap();
        assert_eq!(short.decrypt(&encrypted).unwrap(), "value");

        let encrypted = long.encrypt("value").unwrap();
        assert_eq!(long.decrypt(&encrypted).unwrap(), "value");
    }

    #[test]
    fn test_decrypt_with_wrong_secret_fails() {
        let service = EncryptionService::from_secret("secret-one");
        let other = EncryptionService::from_secret("secret-two");

        let encrypted = service.encrypt("value").unwrap();
        assert!(other.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_decrypt_invalid_data() {
        let service = EncryptionService::from_secret("a-test-application-secret");
        assert!(service.decrypt("not-valid-base64!!").is_err());
        assert!(service.decrypt("c2hvcnQ=").is_err()); // too short for a nonce
    }
}
