// ==============================================================================
// state.rs - Application State Management
// ==============================================================================
// Description: Shared application state for the marketplace API
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::info;

use crate::auth::{FirebaseVerifier, JwtAuthority, TokenVerifier};
use crate::config::{AuthStrategy, Config};
use crate::store::{DocumentStore, MemoryStore, MongoStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Document store shared by every request
    store: Arc<dyn DocumentStore>,

    /// Bearer token verification strategy
    verifier: Arc<dyn TokenVerifier>,

    /// Signs tokens for `POST /getToken`
    tokens: Arc<JwtAuthority>,
}

impl AppState {
    /// Build state from configuration, connecting to the document store
    pub async fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = if config.uses_memory_store() {
            info!("Using in-memory document store");
            Arc::new(MemoryStore::new())
        } else {
            let store = MongoStore::connect(config.mongodb_uri.expose_secret(), &config.db_name)
                .await
                .context("Failed to connect to MongoDB")?;
            Arc::new(store)
        };

        let tokens = Arc::new(JwtAuthority::new(config.jwt_secret.expose_secret()));

        let verifier: Arc<dyn TokenVerifier> = match &config.auth_strategy {
            AuthStrategy::Jwt => {
                info!("Bearer tokens verified with HS256 server secret");
                tokens.clone() as Arc<dyn TokenVerifier>
            }
            AuthStrategy::Firebase(account) => {
                info!(
                    "Bearer tokens verified as Firebase ID tokens for project {} ({})",
                    account.project_id,
                    account.client_email.as_deref().unwrap_or("no client email")
                );
                Arc::new(FirebaseVerifier::new(account))
            }
        };

        Ok(Self::from_parts(store, verifier, tokens))
    }

    pub fn from_parts(
        store: Arc<dyn DocumentStore>,
        verifier: Arc<dyn TokenVerifier>,
        tokens: Arc<JwtAuthority>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                verifier,
                tokens,
            }),
        }
    }

    /// Get document store
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Get bearer token verifier
    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.inner.verifier.as_ref()
    }

    /// Get token issuer
    pub fn tokens(&self) -> &JwtAuthority {
        &self.inner.tokens
    }
}
