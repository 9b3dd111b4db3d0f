//! Product route handlers.
//!
//! Reads are public; writes require an admin token.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::{info, instrument};

use stockroom_core::{CategoryId, ProductId};

use crate::db::{CatalogStore, Store};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, ProductDetail, ProductFilter, ProductUpdate};
use crate::state::AppState;

const PRODUCT_NOT_FOUND: &str = "Product not found";
const INVALID_CATEGORY: &str = "Invalid category";

async fn ensure_category(store: &dyn Store, id: CategoryId) -> Result<()> {
    if store.category(id).await?.is_none() {
        return Err(AppError::BadRequest(INVALID_CATEGORY.to_owned()));
    }
    Ok(())
}

async fn load_detail(store: &dyn Store, id: ProductId) -> Result<ProductDetail> {
    store
        .product_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_owned()))
}

/// List products, optionally filtered by category name.
///
/// GET /products/?category=&skip=&limit=
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<ProductDetail>>> {
    let products = state.store().list_products(&filter).await?;
    Ok(Json(products))
}

/// Show one product.
///
/// GET /products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    Ok(Json(load_detail(state.store(), id).await?))
}

/// Create a product.
///
/// POST /products/
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(payload): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductDetail>)> {
    payload.validate().map_err(AppError::BadRequest)?;
    ensure_category(state.store(), payload.category_id).await?;

    let product = state.store().create_product(&payload).await?;
    info!(product_id = %product.id, name = %product.name, "Product created");

    let detail = load_detail(state.store(), product.id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Apply a partial update to a product.
///
/// PUT /products/{id}
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<ProductDetail>> {
    update.validate().map_err(AppError::BadRequest)?;

    let store = state.store();
    let current = store
        .product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_owned()))?;
    if let Some(category_id) = update.category_id
        && category_id != current.category_id
    {
        ensure_category(store, category_id).await?;
    }

    store
        .update_product(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_owned()))?;
    info!(product_id = %id, "Product updated");

    Ok(Json(load_detail(store, id).await?))
}

/// Delete a product.
///
/// DELETE /products/{id}
///
/// Products referenced by orders are kept; deleting one is a 409.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    if !state.store().delete_product(id).await? {
        return Err(AppError::NotFound(PRODUCT_NOT_FOUND.to_owned()));
    }
    info!(product_id = %id, "Product deleted");
    Ok(Json(json!({ "detail": "Product deleted" })))
}
