//! Per-file encryption engine.
//!
//! Every physical blob is encrypted with its own AES-256-GCM key. A fresh
//! 96-bit nonce is generated per encryption call and prefixed to the
//! ciphertext; the 128-bit authentication tag makes decryption fail closed
//! on tamper or truncation. Keys are stored base64-encoded on the owning
//! file record and never leave the core.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};

use crate::AppError;

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;
/// GCM nonce size in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;
/// GCM authentication tag size in bytes (128 bits).
pub const TAG_SIZE: usize = 16;

/// A per-file symmetric key.
///
/// Debug output is redacted so keys cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct FileKey([u8; KEY_SIZE]);

impl FileKey {
    /// Wrap raw key bytes. Fails unless exactly 32 bytes are supplied.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AppError> {
        let arr: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| AppError::Internal("Encryption key must be 32 bytes (256 bits)".to_string()))?;
        Ok(FileKey(arr))
    }

    /// Decode a base64-encoded key as stored on a file record.
    pub fn decode(encoded: &str) -> Result<Self, AppError> {
        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| AppError::Internal(format!("Failed to decode encryption key: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Base64-encode the key for at-rest storage on the file record.
    pub fn encode(&self) -> String {
        general_purpose::STANDARD.encode(self.0)
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FileKey(<redacted>)")
    }
}

/// Authenticated encryption engine for file contents.
///
/// Stateless; the key travels with each call so one engine instance serves
/// every file.
#[derive(Clone, Copy, Default)]
pub struct EncryptionEngine;

impl EncryptionEngine {
    pub fn new() -> Self {
        EncryptionEngine
    }

    /// Generate a fresh random 256-bit key.
    pub fn generate_key(&self) -> Result<FileKey, AppError> {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Ok(FileKey(bytes))
    }

    /// Encrypt `plaintext` under `key`. Output layout: nonce || ciphertext || tag.
    pub fn encrypt(&self, key: &FileKey, plaintext: &[u8]) -> Result<Vec<u8>, AppError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| AppError::Internal(format!("Encryption failed: {}", e)))?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);
        Ok(combined)
    }

    /// Decrypt nonce-prefixed `data` under `key`.
    ///
    /// Fails closed: truncated input, a mismatched tag, or the wrong key all
    /// return `Decryption` and never partial plaintext.
    pub fn decrypt(&self, key: &FileKey, data: &[u8]) -> Result<Vec<u8>, AppError> {
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(AppError::Decryption("Ciphertext too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| AppError::Decryption(format!("Authentication failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_and_key() -> (EncryptionEngine, FileKey) {
        let engine = EncryptionEngine::new();
        let key = engine.generate_key().unwrap();
        (engine, key)
    }

    #[test]
    fn test_round_trip() {
        let (engine, key) = engine_and_key();
        let plaintext = b"the quick brown fox".to_vec();

        let ciphertext = engine.encrypt(&key, &plaintext).unwrap();
        assert_ne!(ciphertext, plaintext);
        assert_eq!(ciphertext.len(), plaintext.len() + NONCE_SIZE + TAG_SIZE);

        let decrypted = engine.decrypt(&key, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_round_trip_empty_input() {
        let (engine, key) = engine_and_key();
        let ciphertext = engine.encrypt(&key, b"").unwrap();
        assert_eq!(ciphertext.len(), NONCE_SIZE + TAG_SIZE);
        assert_eq!(engine.decrypt(&key, &ciphertext).unwrap(), b"");
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let (engine, key) = engine_and_key();
        let a = engine.encrypt(&key, b"same input").unwrap();
        let b = engine.encrypt(&key, b"same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_decrypt_fails_on_tamper() {
        let (engine, key) = engine_and_key();
        let mut ciphertext = engine.encrypt(&key, b"sensitive bytes").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;

        let result = engine.decrypt(&key, &ciphertext);
        assert!(matches!(result, Err(AppError::Decryption(_))));
    }

    #[test]
    fn test_decrypt_fails_on_wrong_key() {
        let (engine, key) = engine_and_key();
        let other_key = engine.generate_key().unwrap();
        let ciphertext = engine.encrypt(&key, b"sensitive bytes").unwrap();

        let result = engine.decrypt(&other_key, &ciphertext);
        assert!(matches!(result, Err(AppError::Decryption(_))));
    }

    #[test]
    fn test_decrypt_fails_on_truncation() {
        let (engine, key) = engine_and_key();
        let ciphertext = engine.encrypt(&key, b"sensitive bytes").unwrap();

        let truncated = &ciphertext[..ciphertext.len() - 4];
        assert!(matches!(
            engine.decrypt(&key, truncated),
            Err(AppError::Decryption(_))
        ));

        // Shorter than nonce + tag is rejected before touching the cipher
        assert!(matches!(
            engine.decrypt(&key, &ciphertext[..NONCE_SIZE]),
            Err(AppError::Decryption(_))
        ));
    }

    #[test]
    fn test_key_encode_decode() {
        let (engine, key) = engine_and_key();
        let encoded = key.encode();
        let decoded = FileKey::decode(&encoded).unwrap();
        assert_eq!(decoded, key);

        let ciphertext = engine.encrypt(&key, b"payload").unwrap();
        assert_eq!(engine.decrypt(&decoded, &ciphertext).unwrap(), b"payload");
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let (_, key) = engine_and_key();
        let debug = format!("{:?}", key);
        assert_eq!(debug, "FileKey(<redacted>)");
        assert!(!debug.contains(&key.encode()));
    }
}
