// ==============================================================================
// handlers/mod.rs - API Request Handlers
// ==============================================================================
// Description: Service info, health probes, and token issuance
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::{ApiInfoResponse, HealthResponse, ReadinessResponse, TokenRequest, TokenResponse},
    state::AppState,
};

pub mod bids;
pub mod products;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

/// Root endpoint - API information
pub async fn root() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "Smart Deals API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "/health - Health check",
            "/ready - Readiness check",
            "/users - List (GET) or register (POST) users",
            "/products - List (GET, ?email=) or create (POST, bearer) products",
            "/recent-products - Six newest products (GET)",
            "/products/{id} - Get (GET), update name/price (PATCH), delete (DELETE, bearer)",
            "/products/bids/{productId} - Bids for a product, highest first (GET)",
            "/bids - List own bids (GET, bearer, ?email=) or place a bid (POST)",
            "/bids/{id} - Update (PATCH) or delete (DELETE) a bid",
            "/getToken - Issue a one-hour bearer token (POST)",
        ],
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Readiness ping failed: {}", e);
            false
        }
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready: database,
            database,
        }),
    )
}

/// Issue a signed one-hour token for the given email
pub async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state
        .tokens()
        .issue(&request.email)
        .map_err(AppError::TokenIssue)?;

    info!("Issued token for {}", request.email);
    Ok(Json(TokenResponse { token }))
}
