// ==============================================================================
// config.rs - Environment Configuration
// ==============================================================================
// Description: Typed server configuration loaded from environment variables
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use std::fmt::Display;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::info;

use crate::auth::{firebase::CredentialsError, ServiceAccount};

const DEFAULT_PORT: &str = "3000";
const DEFAULT_DB_NAME: &str = "smart_db";

/// Which bearer-token strategy guards protected routes
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// HS256 tokens signed with JWT_SECRET
    Jwt,
    /// Firebase ID tokens for the service account's project
    Firebase(ServiceAccount),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Connection string; usually embeds database credentials
    pub mongodb_uri: SecretString,
    pub db_name: String,
    pub jwt_secret: SecretString,
    pub auth_strategy: AuthStrategy,
    /// Empty means any origin is allowed
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("firebase credentials: {0}")]
    Credentials(#[from] CredentialsError),
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port = parse_or_default("PORT", get("PORT"), DEFAULT_PORT)?;
        let mongodb_uri = SecretString::from(require("MONGODB_URI")?);
        let db_name = get("MONGODB_DB").unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
        let jwt_secret = SecretString::from(require("JWT_SECRET")?);

        let auth_strategy = match get("AUTH_STRATEGY")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            None | Some("jwt") => AuthStrategy::Jwt,
            Some("firebase") => {
                let account = match (get("FIREBASE_SERVICE_KEY"), get("FIREBASE_SERVICE_KEY_PATH")) {
                    (Some(inline), _) => ServiceAccount::from_inline(&inline)?,
                    (None, Some(path)) => ServiceAccount::from_file(path)?,
                    (None, None) => return Err(ConfigError::Missing("FIREBASE_SERVICE_KEY")),
                };
                AuthStrategy::Firebase(account)
            }
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "AUTH_STRATEGY",
                    value: other.to_string(),
                    reason: "expected 'jwt' or 'firebase'".to_string(),
                })
            }
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            port,
            mongodb_uri,
            db_name,
            jwt_secret,
            auth_strategy,
            cors_allowed_origins,
        })
    }

    /// `memory://` selects the in-process store
    pub fn uses_memory_store(&self) -> bool {
        self.mongodb_uri.expose_secret().starts_with("memory://")
    }
}

fn parse_or_default<T>(key: &'static str, value: Option<String>, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = value.unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    match value.trim().parse::<T>() {
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
