// ==============================================================================
// store/memory.rs - In-Process Document Store
// ==============================================================================
// Description: RwLock-guarded collections with Mongo-like query semantics
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
//
// Selected with a `memory://` connection string and used by the test suite.
// Data lives only as long as the process.
//
// ==============================================================================

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    Collection, DeleteAck, Document, DocumentStore, Filter, FindOptions, InsertOneAck,
    StoreError, UpdateAck, ID_FIELD,
};

/// In-memory document store
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `collection`
    #[cfg(test)]
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(&collection)
            .into_iter()
            .flatten()
            .filter(|doc| matches(doc, &filter))
            .cloned()
            .collect();

        if let Some(field) = &options.sort_desc {
            // sort_by is stable, so ties keep insertion order like Mongo's natural order
            docs.sort_by(|a, b| {
                compare_values(a.get(field.as_str()), b.get(field.as_str())).reverse()
            });
        }

        // Mongo treats 0 as "no limit" and a negative limit as its absolute value
        if let Some(limit) = options.limit.filter(|l| *l != 0) {
            docs.truncate(limit.unsigned_abs() as usize);
        }

        Ok(docs)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| matches(doc, &filter)))
            .cloned())
    }

    async fn insert_one(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> Result<InsertOneAck, StoreError> {
        let inserted_id = document
            .entry(ID_FIELD)
            .or_insert_with(|| Value::String(ObjectId::new().to_hex()))
            .clone();

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        if docs
            .iter()
            .any(|doc| doc.get(ID_FIELD).is_some_and(|id| values_equal(id, &inserted_id)))
        {
            return Err(StoreError::Duplicate {
                collection: collection.name(),
                field: ID_FIELD,
            });
        }

        if let Some(field) = collection.unique_key() {
            if let Some(value) = document.get(field).and_then(Value::as_str) {
                if docs
                    .iter()
                    .any(|doc| doc.get(field).and_then(Value::as_str) == Some(value))
                {
                    return Err(StoreError::Duplicate {
                        collection: collection.name(),
                        field,
                    });
                }
            }
        }

        docs.push(document);

        Ok(InsertOneAck {
            acknowledged: true,
            inserted_id,
        })
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateAck, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| matches(doc, &filter)))
        else {
            return Ok(UpdateAck::new(0, 0));
        };

        let mut modified = false;
        for (field, value) in set {
            if field == ID_FIELD {
                continue;
            }
            if doc.get(&field) != Some(&value) {
                doc.insert(field, value);
                modified = true;
            }
        }

        Ok(UpdateAck::new(1, u64::from(modified)))
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteAck, StoreError> {
        let mut collections = self.collections.write().await;
        let deleted_count = match collections.get_mut(&collection) {
            Some(docs) => match docs.iter().position(|doc| matches(doc, &filter)) {
                Some(index) => {
                    docs.remove(index);
                    1
                }
                None => 0,
            },
            None => 0,
        };

        Ok(DeleteAck {
            acknowledged: true,
            deleted_count,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn matches(doc: &Document, filter: &Filter) -> bool {
    match filter {
        Filter::All => true,
        Filter::Eq(field, expected) => doc
            .get(field.as_str())
            .is_some_and(|actual| values_equal(actual, expected)),
        Filter::Id(oid) => id_matches(doc, oid),
        Filter::IdIn(oids) => oids.iter().any(|oid| id_matches(doc, oid)),
    }
}

fn id_matches(doc: &Document, oid: &ObjectId) -> bool {
    doc.get(ID_FIELD).and_then(Value::as_str) == Some(oid.to_hex().as_str())
}

/// Equality with numeric coercion (`1` matches `1.0`)
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// BSON comparison order: null < numbers < strings < objects < arrays < booleans
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
