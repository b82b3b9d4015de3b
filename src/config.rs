//! Application configuration loaded from environment variables.
//!
//! Read once at startup in `main` and handed to the services that need it;
//! request handlers only ever see the values stored in `AppState`.

use crate::services::token::DEFAULT_TTL_MINUTES;
use chrono_tz::Tz;
use std::env;
use std::time::Duration;

/// Default WeChat API endpoint.
pub const DEFAULT_WECHAT_API_URL: &str = "https://api.weixin.qq.com";

/// Which storage backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StorageBackend::Firestore),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::Invalid("STORAGE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// WeChat mini-program app ID
    pub wechat_app_id: String,
    /// Base URL of the WeChat API (overridable for tests)
    pub wechat_api_url: String,
    /// Timeout for the code exchange call
    pub wechat_timeout: Duration,
    /// Session token lifetime
    pub token_ttl: chrono::Duration,
    /// Storage backend selection
    pub storage_backend: StorageBackend,
    /// GCP project ID (Firestore database)
    pub gcp_project_id: String,
    /// Time zone used for calendar-day statistics; `None` means server local time
    pub timezone: Option<Tz>,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Bind address
    pub host: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// WeChat mini-program app secret
    pub wechat_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let timezone = match env::var("TIMEZONE") {
            Ok(name) if !name.trim().is_empty() => Some(
                name.trim()
                    .parse::<Tz>()
                    .map_err(|_| ConfigError::Invalid("TIMEZONE", name.clone()))?,
            ),
            _ => None,
        };

        let token_ttl_minutes: i64 = parse_or("TOKEN_TTL_MINUTES", DEFAULT_TTL_MINUTES)?;
        if token_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid(
                "TOKEN_TTL_MINUTES",
                token_ttl_minutes.to_string(),
            ));
        }

        Ok(Self {
            wechat_app_id: env::var("WECHAT_APPID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("WECHAT_APPID"))?,
            wechat_api_url: env::var("WECHAT_API_URL")
                .unwrap_or_else(|_| DEFAULT_WECHAT_API_URL.to_string()),
            wechat_timeout: Duration::from_secs(parse_or("WECHAT_TIMEOUT_SECS", 5)?),
            token_ttl: chrono::Duration::minutes(token_ttl_minutes),
            storage_backend: env::var("STORAGE_BACKEND")
                .unwrap_or_else(|_| "firestore".to_string())
                .parse()?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            timezone,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 8000)?,

            wechat_secret: env::var("WECHAT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("WECHAT_SECRET"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            wechat_app_id: "test_app_id".to_string(),
            wechat_api_url: "http://127.0.0.1:9".to_string(),
            wechat_timeout: Duration::from_secs(2),
            token_ttl: chrono::Duration::minutes(DEFAULT_TTL_MINUTES),
            storage_backend: StorageBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            timezone: Some(chrono_tz::Asia::Shanghai),
            frontend_url: "http://localhost:5173".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            wechat_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
