// ==============================================================================
// auth/mod.rs - Bearer Token Verification
// ==============================================================================
// Description: TokenVerifier capability and its two strategies
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
//
// A verifier resolves a bearer token to the principal's email. The strategy is
// chosen once at startup (AUTH_STRATEGY) and shared through AppState.
//
// ==============================================================================

use async_trait::async_trait;
use thiserror::Error;

pub mod firebase;
pub mod jwt;

pub use firebase::{FirebaseVerifier, ServiceAccount};
pub use jwt::JwtAuthority;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token verification failed: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("verified token carries no email claim")]
    MissingEmail,

    #[error("signing key unavailable: {0}")]
    KeyFetch(String),
}

/// Resolve a bearer token to the verified email of its holder
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String, AuthError>;
}
