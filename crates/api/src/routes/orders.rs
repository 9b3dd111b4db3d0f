//! Order route handlers.
//!
//! `POST /orders/` is the checkout: it turns the caller's cart into an order
//! and charges it. See [`crate::services::checkout`].

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use stockroom_core::OrderId;

use crate::db::OrderStore;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{OrderScope, OrderWithItems};
use crate::state::AppState;

/// Check out the caller's cart.
///
/// POST /orders/
///
/// A declined or timed-out payment is a 400; the FAILED order is kept.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<(StatusCode, Json<OrderWithItems>)> {
    let user_id = user.id.to_string();
    add_breadcrumb("checkout", "Checkout started", Some(&[("user_id", user_id.as_str())]));

    let order = state.checkout().create_order(&user).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List orders: every order for admins, own orders otherwise.
///
/// GET /orders/
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderWithItems>>> {
    let orders = state.store().list_orders(OrderScope::for_user(&user)).await?;
    Ok(Json(orders))
}

/// Show one order to its owner or an admin.
///
/// GET /orders/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithItems>> {
    let order = state
        .store()
        .order(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    if !user.can_view_order_of(order.order.user_id) {
        return Err(AppError::Forbidden("Not authorized".to_owned()));
    }
    Ok(Json(order))
}
