// ==============================================================================
// auth/jwt.rs - Signed Token Strategy (HS256)
// ==============================================================================
// Description: Issue and verify one-hour HS256 tokens carrying an email claim
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, TokenVerifier};

/// Lifetime of issued tokens, in seconds
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

/// Claims carried by signed tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 tokens with the server secret
pub struct JwtAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthority {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a token for `email`, valid for one hour
    ///
    /// No password or existence check is made; any email gets a token.
    pub fn issue(&self, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            email: email.to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + TOKEN_TTL_SECS,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims)
    }
}

#[async_trait]
impl TokenVerifier for JwtAuthority {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.decode(token)?;
        if claims.email.is_empty() {
            return Err(AuthError::MissingEmail);
        }
        Ok(claims.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_issued_token_verifies_to_email() {
        let authority = JwtAuthority::new("test-secret");
        let token = authority.issue("a@x.com").unwrap();

        assert_eq!(authority.verify(&token).await.unwrap(), "a@x.com");

        let claims = authority.decode(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let token = JwtAuthority::new("secret-one").issue("a@x.com").unwrap();
        let result = JwtAuthority::new("secret-two").verify(&token).await;

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let authority = JwtAuthority::new("test-secret");
        let issued = Utc::now() - Duration::hours(3);
        let claims = Claims {
            email: "a@x.com".to_string(),
            iat: issued.timestamp(),
            exp: issued.timestamp() + TOKEN_TTL_SECS,
        };
        let token = encode(&Header::default(), &claims, &authority.encoding_key).unwrap();

        assert!(authority.verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_garbage_rejected() {
        let authority = JwtAuthority::new("test-secret");
        assert!(authority.verify("not.a.token").await.is_err());
        assert!(authority.verify("").await.is_err());
    }
}
