//! Error types module
//!
//! This module provides the core error types used throughout the Dropgate
//! application. All domain errors are unified under the `AppError` enum:
//! quota, token, expiry, storage, and encryption failures each carry a
//! machine-readable kind plus a human message. The HTTP layer (external to
//! this workspace) maps them to status codes via `ErrorMetadata`.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like resource limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "QUOTA_EXCEEDED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Quota exceeded: {required} bytes required, {available} bytes available")]
    QuotaExceeded { required: u64, available: u64 },

    #[error("Invalid access token")]
    InvalidToken,

    #[error("Transfer expired: {0}")]
    Expired(String),

    #[error("Download limit reached: {count}/{limit}")]
    DownloadLimitReached { count: u32, limit: u32 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Token generation exhausted after {attempts} attempts")]
    TokenGenerationExhausted { attempts: u32 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
/// Reduces duplication in the ErrorMetadata impl; client_message stays per-variant for dynamic content.
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::NotFound(_) => (404, "NOT_FOUND", false, false, LogLevel::Debug),
        AppError::QuotaExceeded { .. } => (507, "QUOTA_EXCEEDED", false, false, LogLevel::Warn),
        AppError::InvalidToken => (403, "INVALID_TOKEN", false, false, LogLevel::Debug),
        AppError::Expired(_) => (410, "TRANSFER_EXPIRED", false, false, LogLevel::Debug),
        AppError::DownloadLimitReached { .. } => {
            (410, "DOWNLOAD_LIMIT_REACHED", false, false, LogLevel::Debug)
        }
        AppError::Storage(_) => (500, "STORAGE_ERROR", true, true, LogLevel::Error),
        AppError::Decryption(_) => (500, "DECRYPTION_ERROR", false, true, LogLevel::Error),
        AppError::TokenGenerationExhausted { .. } => {
            (500, "TOKEN_GENERATION_EXHAUSTED", false, true, LogLevel::Error)
        }
        AppError::Validation(_) => (400, "VALIDATION_ERROR", false, false, LogLevel::Debug),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, true, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::NotFound(_) => "NotFound",
            AppError::QuotaExceeded { .. } => "QuotaExceeded",
            AppError::InvalidToken => "InvalidToken",
            AppError::Expired(_) => "Expired",
            AppError::DownloadLimitReached { .. } => "DownloadLimitReached",
            AppError::Storage(_) => "Storage",
            AppError::Decryption(_) => "Decryption",
            AppError::TokenGenerationExhausted { .. } => "TokenGenerationExhausted",
            AppError::Validation(_) => "Validation",
            AppError::Internal(_) => "Internal",
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::QuotaExceeded {
                required,
                available,
            } => {
                format!(
                    "Insufficient storage quota: {} bytes required, {} bytes available",
                    required, available
                )
            }
            AppError::InvalidToken => "Invalid access token".to_string(),
            AppError::Expired(ref msg) => msg.clone(),
            AppError::DownloadLimitReached { count, limit } => {
                format!("Download limit reached: {}/{}", count, limit)
            }
            // Never leak storage paths or cipher details to clients
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Decryption(_) => "Failed to read file contents".to_string(),
            AppError::TokenGenerationExhausted { .. } => "Internal server error".to_string(),
            AppError::Validation(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}
