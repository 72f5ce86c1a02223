// ==============================================================================
// models.rs - API Data Models
// ==============================================================================
// Description: Request/response models for the marketplace API
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;

/// Optional `?email=` filter
#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

impl EmailQuery {
    /// Empty `?email=` is treated as absent
    pub fn email(self) -> Option<String> {
        self.email.filter(|e| !e.is_empty())
    }
}

/// Token request for `POST /getToken`
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Product PATCH body; only these fields are ever written
#[derive(Debug, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<Value>,
    pub price: Option<Value>,
}

impl ProductUpdate {
    pub fn into_set(self) -> Document {
        let mut set = Document::new();
        if let Some(name) = self.name {
            set.insert("name".to_string(), name);
        }
        if let Some(price) = self.price {
            set.insert("price".to_string(), price);
        }
        set
    }
}

/// Bid PATCH body
///
/// The bid name may arrive as `bid_name` or as `buyer_name`; `bid_name` wins.
#[derive(Debug, Default, Deserialize)]
pub struct BidUpdate {
    pub bid_name: Option<Value>,
    pub buyer_name: Option<Value>,
    pub bid_price: Option<Value>,
}

impl BidUpdate {
    pub fn into_set(self) -> Document {
        let mut set = Document::new();
        if let Some(name) = self.bid_name.or(self.buyer_name) {
            set.insert("bid_name".to_string(), name);
        }
        if let Some(price) = self.bid_price {
            set.insert("bid_price".to_string(), price);
        }
        set
    }
}

/// Returned instead of an insert ack when the email is already registered
#[derive(Debug, Serialize)]
pub struct ExistingUserResponse {
    pub message: &'static str,
    pub user: Document,
}

impl ExistingUserResponse {
    pub fn new(user: Document) -> Self {
        Self {
            message: "User already exists",
            user,
        }
    }
}

/// Free-text message body used for errors
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// API information response
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub database: bool,
}
