// ==============================================================================
// handlers/bids.rs - Bid Handlers
// ==============================================================================
// Description: Bid listing with product enrichment, placement, update, removal
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::{
    enrich::{attach_product_details, PRODUCT_REF_FIELD},
    error::AppError,
    middleware::AuthUser,
    models::{BidUpdate, EmailQuery},
    state::AppState,
    store::{Collection, DeleteAck, Document, Filter, FindOptions, InsertOneAck, UpdateAck},
};

/// Bids visible to the caller, each with its `product_details`
///
/// `?email=` must match the verified principal; without it all bids are listed.
pub async fn list_bids(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<EmailQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    const MESSAGE: &str = "Failed to fetch bids";

    let email = query.email();
    user.ensure_email(email.as_deref())?;

    let bids = state
        .store()
        .find(
            Collection::Bids,
            Filter::eq_opt("buyer_email", email),
            FindOptions::default(),
        )
        .await
        .map_err(AppError::storage(MESSAGE))?;

    let bids = attach_product_details(state.store(), bids)
        .await
        .map_err(AppError::storage(MESSAGE))?;

    Ok(Json(bids))
}

/// Bids on one product, highest `bid_price` first
pub async fn product_bids(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<Document>>, AppError> {
    let bids = state
        .store()
        .find(
            Collection::Bids,
            Filter::eq(PRODUCT_REF_FIELD, product_id),
            FindOptions::sort_desc("bid_price"),
        )
        .await
        .map_err(AppError::storage("Failed to fetch product bids"))?;

    Ok(Json(bids))
}

pub async fn create_bid(
    State(state): State<AppState>,
    Json(bid): Json<Document>,
) -> Result<Json<InsertOneAck>, AppError> {
    let ack = state
        .store()
        .insert_one(Collection::Bids, bid)
        .await
        .map_err(AppError::storage("Failed to create bid"))?;

    info!("Bid {} placed", ack.inserted_id);
    Ok(Json(ack))
}

/// Update `bid_name` and `bid_price` only
pub async fn update_bid(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<BidUpdate>,
) -> Result<Json<UpdateAck>, AppError> {
    const MESSAGE: &str = "Failed to update bid";

    let filter = Filter::by_id(&id).map_err(AppError::storage(MESSAGE))?;
    let ack = state
        .store()
        .update_one(Collection::Bids, filter, update.into_set())
        .await
        .map_err(AppError::storage(MESSAGE))?;

    info!("Bid {} updated (matched {})", id, ack.matched_count);
    Ok(Json(ack))
}

pub async fn delete_bid(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, AppError> {
    const MESSAGE: &str = "Failed to delete bid";

    let filter = Filter::by_id(&id).map_err(AppError::storage(MESSAGE))?;
    let ack = state
        .store()
        .delete_one(Collection::Bids, filter)
        .await
        .map_err(AppError::storage(MESSAGE))?;

    info!("Bid {} deleted (deleted {})", id, ack.deleted_count);
    Ok(Json(ack))
}
