//! Configuration module
//!
//! Env-var driven configuration for the core services: storage backend
//! selection, share-link defaults, and SMTP settings for the notification
//! collaborator. The HTTP layer carries its own configuration elsewhere.

use std::env;
use std::str::FromStr;

use crate::models::PlanType;
use crate::storage_types::StorageBackend;
use crate::token::ACCESS_TOKEN_LENGTH;
use crate::AppError;

const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// Core configuration, loaded once at process start and passed by reference.
#[derive(Clone, Debug)]
pub struct Config {
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub s3_endpoint: Option<String>,
    // Transfer defaults
    pub base_url: String,
    pub default_expiry_days: i64,
    pub access_token_length: usize,
    /// Plan assigned to accounts that have none yet.
    pub default_plan: PlanType,
    // Email notifications
    pub email_notifications_enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env_opt(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Validation(format!("Invalid value for {}: {}", key, raw))),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let storage_backend = env_parse("STORAGE_BACKEND", StorageBackend::Local)?;
        let default_plan = match env_opt("DEFAULT_PLAN").as_deref() {
            None => PlanType::Basic,
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::Validation(format!("Invalid value for DEFAULT_PLAN: {}", raw)))?,
        };

        Ok(Config {
            storage_backend,
            local_storage_path: env_opt("LOCAL_STORAGE_PATH"),
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION").or_else(|| env_opt("AWS_REGION")),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            base_url: env_opt("BASE_URL").unwrap_or_else(|| "http://localhost:8080".to_string()),
            default_expiry_days: env_parse("DEFAULT_EXPIRY_DAYS", DEFAULT_EXPIRY_DAYS)?,
            access_token_length: env_parse("ACCESS_TOKEN_LENGTH", ACCESS_TOKEN_LENGTH)?,
            default_plan,
            email_notifications_enabled: env_parse("EMAIL_NOTIFICATIONS_ENABLED", false)?,
            smtp_host: env_opt("SMTP_HOST"),
            smtp_port: env_parse("SMTP_PORT", 587).map(Some)?,
            smtp_user: env_opt("SMTP_USER"),
            smtp_password: env_opt("SMTP_PASSWORD"),
            smtp_from: env_opt("SMTP_FROM"),
            smtp_tls: env_parse("SMTP_TLS", true)?,
        })
    }
}

impl Default for Config {
    /// In-process defaults used by tests and examples: memory storage, no SMTP.
    fn default() -> Self {
        Config {
            storage_backend: StorageBackend::Memory,
            local_storage_path: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            base_url: "http://localhost:8080".to_string(),
            default_expiry_days: DEFAULT_EXPIRY_DAYS,
            access_token_length: ACCESS_TOKEN_LENGTH,
            default_plan: PlanType::Basic,
            email_notifications_enabled: false,
            smtp_host: None,
            smtp_port: Some(587),
            smtp_user: None,
            smtp_password: None,
            smtp_from: None,
            smtp_tls: true,
        }
    }
}
