// ==============================================================================
// middleware/auth.rs - Bearer Token Authentication
// ==============================================================================
// Description: Extract and verify `Authorization: Bearer` credentials
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
//
// Security: Protected handlers take an `AuthUser` argument. The extractor
// resolves the bearer token to an email through the configured TokenVerifier.
// A missing header, a non-Bearer scheme, and a token that fails verification
// all produce the same 401 body.
//
// The only authorization rule in the API is `AuthUser::ensure_email`: a
// caller may filter by their own email and nobody else's.
//
// ==============================================================================

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::warn;

use crate::{error::AppError, state::AppState};

/// Authenticated principal resolved from the bearer token
///
/// # Example
/// ```rust,ignore
/// async fn my_handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
}

impl AuthUser {
    /// Reject with 403 when a requested email differs from the verified one
    pub fn ensure_email(&self, requested: Option<&str>) -> Result<(), AppError> {
        match requested {
            Some(email) if email != self.email => {
                warn!(
                    "Principal {} attempted to read data for {}",
                    self.email, email
                );
                Err(AppError::Forbidden)
            }
            _ => Ok(()),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    warn!("Missing or malformed Authorization header on {}", parts.uri.path());
                    AppError::Unauthorized
                })?;

        match state.verifier().verify(bearer.token()).await {
            Ok(email) => Ok(AuthUser { email }),
            Err(e) => {
                warn!("Rejected bearer token on {}: {}", parts.uri.path(), e);
                Err(AppError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtAuthority;
    use crate::store::MemoryStore;
    use axum::http::{header, Request};
    use std::sync::Arc;

    fn state() -> AppState {
        let tokens = Arc::new(JwtAuthority::new("middleware-secret"));
        AppState::from_parts(Arc::new(MemoryStore::new()), tokens.clone(), tokens)
    }

    async fn extract(state: &AppState, authorization: Option<&str>) -> Result<AuthUser, AppError> {
        let mut builder = Request::builder().uri("/bids");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn test_auth_user_extraction() {
        let state = state();
        let token = state.tokens().issue("testuser@x.com").unwrap();

        let user = extract(&state, Some(&format!("Bearer {token}"))).await.unwrap();
        assert_eq!(user.email, "testuser@x.com");
    }

    #[tokio::test]
    async fn test_auth_user_missing_header() {
        let result = extract(&state(), None).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_auth_user_wrong_scheme() {
        let result = extract(&state(), Some("Basic dXNlcjpwYXNz")).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_auth_user_invalid_token() {
        let result = extract(&state(), Some("Bearer not-a-real-token")).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_ensure_email() {
        let user = AuthUser {
            email: "a@x.com".to_string(),
        };

        assert!(user.ensure_email(None).is_ok());
        assert!(user.ensure_email(Some("a@x.com")).is_ok());
        assert!(matches!(
            user.ensure_email(Some("b@x.com")),
            Err(AppError::Forbidden)
        ));
    }
}
