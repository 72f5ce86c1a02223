// ==============================================================================
// store/mod.rs - Document Store Abstraction
// ==============================================================================
// Description: Collection names, query types, and the DocumentStore trait
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
//
// Handlers never talk to a driver directly. They receive an
// `Arc<dyn DocumentStore>` through `AppState`, built once at startup.
//
// Documents are plain JSON objects. `_id` is always exposed as a 24-character
// hex string regardless of backend.
//
// ==============================================================================

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Schema-less document as stored and returned by the API
pub type Document = Map<String, Value>;

/// Primary key field name
pub const ID_FIELD: &str = "_id";

/// Named collections exposed by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Products,
    Bids,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Products => "products",
            Collection::Bids => "bids",
        }
    }

    /// Field carrying a uniqueness constraint, if any
    ///
    /// Only string values take part; documents where the field is missing,
    /// null, or another type never collide.
    pub fn unique_key(&self) -> Option<&'static str> {
        match self {
            Collection::Users => Some("email"),
            Collection::Products | Collection::Bids => None,
        }
    }
}

/// Query filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(String, Value),
    Id(ObjectId),
    IdIn(Vec<ObjectId>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    /// Equality filter when `value` is present, match-all otherwise
    pub fn eq_opt(field: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(value) => Filter::Eq(field.into(), Value::String(value)),
            None => Filter::All,
        }
    }

    /// Filter on a hex `_id` path parameter
    pub fn by_id(id: &str) -> Result<Self, StoreError> {
        Ok(Filter::Id(parse_object_id(id)?))
    }
}

/// Sort and limit options for `find`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Field to sort on, highest first
    pub sort_desc: Option<String>,
    pub limit: Option<i64>,
}

impl FindOptions {
    pub fn sort_desc(field: impl Into<String>) -> Self {
        Self {
            sort_desc: Some(field.into()),
            limit: None,
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Insert acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneAck {
    pub acknowledged: bool,
    pub inserted_id: Value,
}

/// Update acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Value>,
    pub upserted_count: u64,
}

impl UpdateAck {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
            upserted_count: 0,
        }
    }
}

/// Delete acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid object id: {0}")]
    InvalidId(String),

    #[error("duplicate value for unique field '{field}' in {collection}")]
    Duplicate {
        collection: &'static str,
        field: &'static str,
    },

    #[error("document conversion failed: {0}")]
    Serialization(String),

    #[error("database error: {0}")]
    Backend(#[from] mongodb::error::Error),
}

pub fn parse_object_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

/// Persistence operations used by the route handlers
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<Option<Document>, StoreError>;

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOneAck, StoreError>;

    /// Apply `$set` semantics. An empty `set` matches but modifies nothing.
    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateAck, StoreError>;

    async fn delete_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteAck, StoreError>;

    /// Connectivity check for the readiness probe
    async fn ping(&self) -> Result<(), StoreError>;
}
