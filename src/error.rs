// ==============================================================================
// error.rs - HTTP Error Mapping
// ==============================================================================
// Description: Application error type and its HTTP response rendering
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
//
// Every failure reaches the client as a status code plus {"message": "..."}.
// Store failures never leak detail: the client sees the fixed per-route
// message, the log gets the cause.
//
// ==============================================================================

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::models::MessageResponse;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, malformed, or unverifiable bearer credential
    #[error("unauthorized access")]
    Unauthorized,

    /// Verified principal does not match the requested email
    #[error("forbidden access")]
    Forbidden,

    #[error("{message}")]
    Storage {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Failed to issue token")]
    TokenIssue(#[source] AuthError),
}

impl AppError {
    /// Adapter for `map_err` that tags a store failure with the route's message
    pub fn storage(message: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| AppError::Storage { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Storage { .. } | AppError::TokenIssue(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Storage { message, source } => error!("{}: {}", message, source),
            AppError::TokenIssue(source) => error!("Token signing failed: {}", source),
            AppError::Unauthorized | AppError::Forbidden => {}
        }

        let body = Json(MessageResponse::new(self.to_string()));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);

        let storage = AppError::storage("Failed to fetch bids")(StoreError::InvalidId("x".into()));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(storage.to_string(), "Failed to fetch bids");
    }

    #[tokio::test]
    async fn test_storage_error_hides_cause() {
        let response = AppError::storage("Failed to delete product")(StoreError::InvalidId(
            "secret-detail".into(),
        ))
        .into_response();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"message": "Failed to delete product"}));
    }
}
