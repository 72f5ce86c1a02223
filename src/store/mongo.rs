// ==============================================================================
// store/mongo.rs - MongoDB Document Store
// ==============================================================================
// Description: DocumentStore backed by the official mongodb driver
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
//
// One `Client` per process. The driver owns the connection pool; this type
// only translates the store's filter/options vocabulary into BSON.
//
// ==============================================================================

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document as BsonDocument},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Database, IndexModel,
};
use serde_json::Value;
use tracing::{info, warn};

use super::{
    Collection, DeleteAck, Document, DocumentStore, Filter, FindOptions, InsertOneAck,
    StoreError, UpdateAck, ID_FIELD,
};

/// Server error code for unique index violations
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB-backed document store
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect, ping the deployment, and ensure unique indexes exist
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(db_name);

        db.run_command(doc! { "ping": 1 }).await?;
        info!("Pinged MongoDB deployment, database '{}'", db_name);

        let store = Self { db };
        store.ensure_unique_indexes().await;

        Ok(store)
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<BsonDocument> {
        self.db.collection(collection.name())
    }

    /// Legacy data may already hold duplicates; the index is then skipped with a warning
    async fn ensure_unique_indexes(&self) {
        for collection in [Collection::Users, Collection::Products, Collection::Bids] {
            let Some(field) = collection.unique_key() else {
                continue;
            };

            match self
                .collection(collection)
                .create_index(unique_string_index(field))
                .await
            {
                Ok(_) => info!("Unique index on {}.{} ready", collection.name(), field),
                Err(e) => warn!(
                    "Could not create unique index on {}.{}: {}",
                    collection.name(),
                    field,
                    e
                ),
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let handle = self.collection(collection);
        let mut find = handle.find(to_bson_filter(&filter)?);

        if let Some(field) = options.sort_desc {
            let mut sort = BsonDocument::new();
            sort.insert(field, -1);
            find = find.sort(sort);
        }
        if let Some(limit) = options.limit {
            find = find.limit(limit);
        }

        let docs: Vec<BsonDocument> = find.await?.try_collect().await?;
        Ok(docs.into_iter().map(document_to_json).collect())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<Option<Document>, StoreError> {
        let found = self
            .collection(collection)
            .find_one(to_bson_filter(&filter)?)
            .await?;
        Ok(found.map(document_to_json))
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOneAck, StoreError> {
        let document = to_bson_document(&document)?;

        match self.collection(collection).insert_one(document).await {
            Ok(result) => Ok(InsertOneAck {
                acknowledged: true,
                inserted_id: bson_to_json(result.inserted_id),
            }),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate {
                collection: collection.name(),
                field: collection.unique_key().unwrap_or(ID_FIELD),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
    ) -> Result<UpdateAck, StoreError> {
        let filter = to_bson_filter(&filter)?;

        // The server rejects an empty $set, so report the match count instead
        if set.is_empty() {
            let matched = self
                .collection(collection)
                .count_documents(filter)
                .limit(1)
                .await?;
            return Ok(UpdateAck::new(matched, 0));
        }

        let update = doc! { "$set": to_bson_document(&set)? };
        let result = self
            .collection(collection)
            .update_one(filter, update)
            .await?;

        Ok(UpdateAck::new(result.matched_count, result.modified_count))
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteAck, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(to_bson_filter(&filter)?)
            .await?;

        Ok(DeleteAck {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

/// Unique index that only covers string values of `field`
///
/// Without the partial filter a missing field indexes as null, so a second
/// document lacking it would collide with the first.
fn unique_string_index(field: &str) -> IndexModel {
    let mut keys = BsonDocument::new();
    keys.insert(field, 1);

    let mut partial = BsonDocument::new();
    partial.insert(field, doc! { "$type": "string" });

    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(partial)
                .build(),
        )
        .build()
}

fn is_duplicate_key(error: &MongoError) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE
    )
}

fn to_bson_filter(filter: &Filter) -> Result<BsonDocument, StoreError> {
    let mut query = BsonDocument::new();
    match filter {
        Filter::All => {}
        Filter::Eq(field, value) => {
            query.insert(field.as_str(), to_bson_value(value)?);
        }
        Filter::Id(oid) => {
            query.insert(ID_FIELD, *oid);
        }
        Filter::IdIn(oids) => {
            let ids: Vec<Bson> = oids.iter().copied().map(Bson::ObjectId).collect();
            query.insert(ID_FIELD, doc! { "$in": ids });
        }
    }
    Ok(query)
}

fn to_bson_value(value: &Value) -> Result<Bson, StoreError> {
    bson::to_bson(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn to_bson_document(document: &Document) -> Result<BsonDocument, StoreError> {
    bson::to_document(document).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// ObjectIds render as hex and dates as RFC 3339; everything else as relaxed extended JSON
fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or_else(|_| Value::from(dt.timestamp_millis())),
        Bson::Document(doc) => Value::Object(document_to_json(doc)),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

fn document_to_json(document: BsonDocument) -> Document {
    document
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect()
}
