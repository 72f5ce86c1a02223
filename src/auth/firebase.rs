// ==============================================================================
// auth/firebase.rs - Third-Party Identity Strategy (Firebase ID tokens)
// ==============================================================================
// Description: Verify Firebase ID tokens against Google's securetoken JWKS
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
//
// An ID token is accepted when:
//   - it is RS256 signed by a key in Google's securetoken JWKS (matched by kid)
//   - aud == project_id and iss == https://securetoken.google.com/<project_id>
//   - exp is in the future and sub is non-empty
//   - it carries an email claim
//
// The key set is cached for an hour; Google rotates keys on a longer cycle.
//
// ==============================================================================

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{
    decode, decode_header, errors::ErrorKind, jwk::JwkSet, Algorithm, DecodingKey, Validation,
};
use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::{AuthError, TokenVerifier};

/// Public keys for Firebase ID tokens
pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const JWKS_TTL: Duration = Duration::from_secs(60 * 60);

/// Subset of a Google service-account key file
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
}

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("failed to read credentials file: {0}")]
    Io(#[from] std::io::Error),

    #[error("credentials are neither JSON nor base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid service account JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServiceAccount {
    /// Parse credentials given inline, either as raw JSON or base64-encoded JSON
    pub fn from_inline(value: &str) -> Result<Self, CredentialsError> {
        let value = value.trim();
        if value.starts_with('{') {
            return Ok(serde_json::from_str(value)?);
        }

        let decoded = STANDARD.decode(value)?;
        Ok(serde_json::from_slice(&decoded)?)
    }

    /// Load credentials from a key file on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CredentialsError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// Verifies Firebase ID tokens for one project
pub struct FirebaseVerifier {
    http: reqwest::Client,
    jwks_url: String,
    jwks: Cache<(), Arc<JwkSet>>,
    validation: Validation,
}

impl FirebaseVerifier {
    pub fn new(account: &ServiceAccount) -> Self {
        Self::with_jwks_url(account, GOOGLE_JWKS_URL)
    }

    pub fn with_jwks_url(account: &ServiceAccount, jwks_url: impl Into<String>) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&account.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            account.project_id
        )]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

        Self {
            http: reqwest::Client::new(),
            jwks_url: jwks_url.into(),
            jwks: Cache::builder()
                .max_capacity(1)
                .time_to_live(JWKS_TTL)
                .build(),
            validation,
        }
    }

    async fn keys(&self) -> Result<Arc<JwkSet>, AuthError> {
        self.jwks
            .try_get_with((), fetch_jwks(&self.http, &self.jwks_url))
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))
    }
}

async fn fetch_jwks(http: &reqwest::Client, url: &str) -> Result<Arc<JwkSet>, reqwest::Error> {
    debug!("Fetching identity provider signing keys from {}", url);
    let jwks = http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<JwkSet>()
        .await?;
    Ok(Arc::new(jwks))
}

#[async_trait]
impl TokenVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        // Reject structurally bad tokens before touching the network
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(ErrorKind::InvalidAlgorithm.into()));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken(ErrorKind::InvalidToken.into()))?;

        let keys = self.keys().await?;
        let jwk = keys
            .find(&kid)
            .ok_or_else(|| AuthError::InvalidToken(ErrorKind::InvalidKeyFormat.into()))?;
        let key = DecodingKey::from_jwk(jwk)?;

        let claims = decode::<IdTokenClaims>(token, &key, &self.validation)?.claims;
        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken(ErrorKind::InvalidSubject.into()));
        }

        claims
            .email
            .filter(|email| !email.is_empty())
            .ok_or(AuthError::MissingEmail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use std::io::Write;

    const TEST_KEY_PEM: &str = include_str!("../../testdata/firebase-test-key.pem");
    const TEST_JWKS: &str = include_str!("../../testdata/firebase-test-jwks.json");
    const PROJECT: &str = "smart-deals-test";

    fn account() -> ServiceAccount {
        ServiceAccount {
            project_id: PROJECT.to_string(),
            client_email: None,
        }
    }

    /// Verifier with the test key set preloaded and an unroutable JWKS URL
    async fn seeded_verifier() -> FirebaseVerifier {
        let verifier = FirebaseVerifier::with_jwks_url(&account(), "http://127.0.0.1:9/jwks");
        let jwks: JwkSet = serde_json::from_str(TEST_JWKS).unwrap();
        verifier.jwks.insert((), Arc::new(jwks)).await;
        verifier
    }

    fn sign(claims: serde_json::Value, kid: &str) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_rsa_pem(TEST_KEY_PEM.as_bytes()).unwrap();
        encode(&header, &claims, &key).unwrap()
    }

    fn claims_for(email: Option<&str>) -> serde_json::Value {
        let now = Utc::now().timestamp();
        let mut claims = json!({
            "aud": PROJECT,
            "iss": format!("https://securetoken.google.com/{PROJECT}"),
            "sub": "uid-123",
            "iat": now,
            "exp": now + 600,
        });
        if let Some(email) = email {
            claims["email"] = json!(email);
        }
        claims
    }

    #[test]
    fn test_service_account_from_raw_json() {
        let account =
            ServiceAccount::from_inline(r#"{"project_id": "p1", "client_email": "svc@p1"}"#)
                .unwrap();
        assert_eq!(account.project_id, "p1");
        assert_eq!(account.client_email.as_deref(), Some("svc@p1"));
    }

    #[test]
    fn test_service_account_from_base64() {
        let encoded = STANDARD.encode(r#"{"project_id": "p2"}"#);
        let account = ServiceAccount::from_inline(&encoded).unwrap();
        assert_eq!(account.project_id, "p2");
    }

    #[test]
    fn test_service_account_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"project_id": "p3", "private_key": "ignored"}}"#).unwrap();

        let account = ServiceAccount::from_file(file.path()).unwrap();
        assert_eq!(account.project_id, "p3");
    }

    #[test]
    fn test_service_account_requires_project_id() {
        assert!(matches!(
            ServiceAccount::from_inline(r#"{"client_email": "svc@p1"}"#),
            Err(CredentialsError::Json(_))
        ));
        assert!(matches!(
            ServiceAccount::from_inline("%%% not base64 %%%"),
            Err(CredentialsError::Base64(_))
        ));
    }

    #[tokio::test]
    async fn test_valid_id_token_yields_email() {
        let verifier = seeded_verifier().await;
        let token = sign(claims_for(Some("buyer@x.com")), "test-key");

        assert_eq!(verifier.verify(&token).await.unwrap(), "buyer@x.com");
    }

    #[tokio::test]
    async fn test_token_without_email_rejected() {
        let verifier = seeded_verifier().await;
        let token = sign(claims_for(None), "test-key");

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::MissingEmail)
        ));
    }

    #[tokio::test]
    async fn test_wrong_audience_rejected() {
        let verifier = seeded_verifier().await;
        let mut claims = claims_for(Some("buyer@x.com"));
        claims["aud"] = json!("other-project");
        let token = sign(claims, "test-key");

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_kid_rejected() {
        let verifier = seeded_verifier().await;
        let token = sign(claims_for(Some("buyer@x.com")), "rotated-away");

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_and_hs256_tokens_rejected_offline() {
        let verifier = FirebaseVerifier::with_jwks_url(&account(), "http://127.0.0.1:9/jwks");

        assert!(matches!(
            verifier.verify("garbage").await,
            Err(AuthError::InvalidToken(_))
        ));

        let hs256 = encode(
            &Header::default(),
            &claims_for(Some("a@x.com")),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(matches!(
            verifier.verify(&hs256).await,
            Err(AuthError::InvalidToken(_))
        ));
    }
}
