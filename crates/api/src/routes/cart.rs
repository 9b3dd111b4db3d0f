//! Cart route handlers.
//!
//! Every handler works on the caller's own cart. The cart row is created
//! lazily on the first add.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use stockroom_core::{CartItemId, ProductId, Quantity};

use crate::db::CartStore;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::CartItem;
use crate::services::cart::{self, QuantityChange};
use crate::state::AppState;

/// Request body for adding a product to the cart.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Query parameters for changing an item's quantity.
#[derive(Debug, Deserialize)]
pub struct QuantityQuery {
    pub quantity: i32,
}

/// List the caller's cart items.
///
/// GET /cart/
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<CartItem>>> {
    let items = state
        .store()
        .cart_for_user(user.id)
        .await?
        .map(|cart| cart.items)
        .unwrap_or_default();
    Ok(Json(items))
}

/// Add a product to the cart, merging with an existing line.
///
/// POST /cart/items
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(payload): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartItem>)> {
    let quantity =
        Quantity::new(payload.quantity).map_err(|err| AppError::BadRequest(err.to_string()))?;

    let product_id = payload.product_id.to_string();
    add_breadcrumb("cart", "Add to cart", Some(&[("product_id", product_id.as_str())]));

    let item = cart::add_item(state.store(), &user, payload.product_id, quantity).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Change an item's quantity. A quantity below one removes the item.
///
/// PUT /cart/items/{id}?quantity=
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
    Query(query): Query<QuantityQuery>,
) -> Result<Response> {
    match cart::set_quantity(state.store(), &user, item_id, query.quantity).await? {
        QuantityChange::Updated(item) => Ok(Json(item).into_response()),
        QuantityChange::Removed => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Remove an item from the cart.
///
/// DELETE /cart/items/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<Value>> {
    cart::remove_item(state.store(), &user, item_id).await?;
    Ok(Json(json!({ "detail": "Item removed" })))
}
