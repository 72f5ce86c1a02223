// ==============================================================================
// handlers/products.rs - Product Handlers
// ==============================================================================
// Description: Product listing, lookup, creation, partial update, deletion
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
//
// No ownership checks: any caller may PATCH a product, and any caller holding
// a valid credential may delete one.
//
// ==============================================================================

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::{
    error::AppError,
    middleware::AuthUser,
    models::{EmailQuery, ProductUpdate},
    state::AppState,
    store::{Collection, DeleteAck, Document, Filter, FindOptions, InsertOneAck, UpdateAck},
};

/// Number of products returned by `/recent-products`
pub const RECENT_PRODUCTS_LIMIT: i64 = 6;

/// List products, optionally only those owned by `?email=`
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    let products = state
        .store()
        .find(
            Collection::Products,
            Filter::eq_opt("email", query.email()),
            FindOptions::default(),
        )
        .await
        .map_err(AppError::storage("Failed to fetch products"))?;

    Ok(Json(products))
}

/// Newest products by `created_at`
pub async fn recent_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Document>>, AppError> {
    let products = state
        .store()
        .find(
            Collection::Products,
            Filter::All,
            FindOptions::sort_desc("created_at").limit(RECENT_PRODUCTS_LIMIT),
        )
        .await
        .map_err(AppError::storage("Failed to fetch recent products"))?;

    Ok(Json(products))
}

/// Single product; `null` when absent
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Document>>, AppError> {
    const MESSAGE: &str = "Failed to fetch product";

    let filter = Filter::by_id(&id).map_err(AppError::storage(MESSAGE))?;
    let product = state
        .store()
        .find_one(Collection::Products, filter)
        .await
        .map_err(AppError::storage(MESSAGE))?;

    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(product): Json<Document>,
) -> Result<Json<InsertOneAck>, AppError> {
    let ack = state
        .store()
        .insert_one(Collection::Products, product)
        .await
        .map_err(AppError::storage("Failed to create product"))?;

    info!("Product {} created by {}", ack.inserted_id, user.email);
    Ok(Json(ack))
}

/// Update `name` and `price` only
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<UpdateAck>, AppError> {
    const MESSAGE: &str = "Failed to update product";

    let filter = Filter::by_id(&id).map_err(AppError::storage(MESSAGE))?;
    let ack = state
        .store()
        .update_one(Collection::Products, filter, update.into_set())
        .await
        .map_err(AppError::storage(MESSAGE))?;

    info!("Product {} updated (matched {})", id, ack.matched_count);
    Ok(Json(ack))
}

pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, AppError> {
    const MESSAGE: &str = "Failed to delete product";

    let filter = Filter::by_id(&id).map_err(AppError::storage(MESSAGE))?;
    let ack = state
        .store()
        .delete_one(Collection::Products, filter)
        .await
        .map_err(AppError::storage(MESSAGE))?;

    info!("Product {} deleted by {} (deleted {})", id, user.email, ack.deleted_count);
    Ok(Json(ack))
}
