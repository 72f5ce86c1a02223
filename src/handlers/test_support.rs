// ==============================================================================
// handlers/test_support.rs - Router Test Harness
// ==============================================================================
// Description: Drive the full router against an in-memory store
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use crate::auth::JwtAuthority;
use crate::state::AppState;
use crate::store::{Collection, Document, DocumentStore, MemoryStore};

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(JwtAuthority::new("router-test-secret"));
        let state = AppState::from_parts(store.clone(), tokens.clone(), tokens);
        let router = crate::build_router(state.clone(), CorsLayer::permissive());

        Self {
            router,
            store,
            state,
        }
    }

    pub fn token_for(&self, email: &str) -> String {
        self.state.tokens().issue(email).unwrap()
    }

    /// Insert directly into the store, returning the new `_id`
    pub async fn seed(&self, collection: Collection, document: Value) -> String {
        let Value::Object(document) = document else {
            panic!("seed document must be an object");
        };
        self.store
            .insert_one(collection, document)
            .await
            .unwrap()
            .inserted_id
            .as_str()
            .unwrap()
            .to_string()
    }

    pub async fn fetch(&self, collection: Collection, id: &str) -> Option<Document> {
        self.store
            .find_one(collection, crate::store::Filter::by_id(id).unwrap())
            .await
            .unwrap()
    }

    /// Send a request and decode the JSON response body (`Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, value)
    }
}
