// ==============================================================================
// enrich.rs - Bid Enrichment
// ==============================================================================
// Description: Attach referenced product documents to bids
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
//
// One batched `_id $in` query covers every distinct product reference. Bids
// keep their original order. A reference that is malformed or points at a
// deleted product yields `product_details: null`; only a failure of the batch
// query itself fails the request.
//
// ==============================================================================

use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use tracing::debug;

use crate::store::{Collection, Document, DocumentStore, Filter, FindOptions, StoreError, ID_FIELD};

/// Bid field holding the referenced product's `_id` hex
pub const PRODUCT_REF_FIELD: &str = "product";

/// Field the referenced product is nested under
pub const PRODUCT_DETAILS_FIELD: &str = "product_details";

fn product_ref(bid: &Document) -> Option<ObjectId> {
    bid.get(PRODUCT_REF_FIELD)
        .and_then(Value::as_str)
        .and_then(|id| ObjectId::parse_str(id).ok())
}

pub async fn attach_product_details(
    store: &dyn DocumentStore,
    mut bids: Vec<Document>,
) -> Result<Vec<Document>, StoreError> {
    let mut ids: Vec<ObjectId> = bids.iter().filter_map(product_ref).collect();
    ids.sort();
    ids.dedup();

    let products: HashMap<String, Document> = if ids.is_empty() {
        HashMap::new()
    } else {
        debug!("Loading {} products for {} bids", ids.len(), bids.len());
        store
            .find(Collection::Products, Filter::IdIn(ids), FindOptions::default())
            .await?
            .into_iter()
            .filter_map(|product| {
                let id = product.get(ID_FIELD)?.as_str()?.to_string();
                Some((id, product))
            })
            .collect()
    };

    for bid in &mut bids {
        let details = product_ref(bid)
            .and_then(|oid| products.get(&oid.to_hex()))
            .cloned()
            .map_or(Value::Null, Value::Object);
        bid.insert(PRODUCT_DETAILS_FIELD.to_string(), details);
    }

    Ok(bids)
}
