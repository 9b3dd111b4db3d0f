//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (store ping)
//!
//! # Users
//! GET  /users/me               - Current user
//! GET  /users/                 - All users (admin)
//!
//! # Catalog
//! GET  /categories/            - List categories
//! POST /categories/            - Create category (admin)
//! GET  /products/              - List products (?category=&skip=&limit=)
//! POST /products/              - Create product (admin)
//! GET  /products/{id}          - Product detail
//! PUT  /products/{id}          - Partial update (admin)
//! DELETE /products/{id}        - Delete product (admin)
//!
//! # Cart (requires auth)
//! GET  /cart/                  - Own cart items
//! POST /cart/items             - Add item
//! PUT  /cart/items/{id}        - Set quantity (?quantity=, <1 removes)
//! DELETE /cart/items/{id}      - Remove item
//!
//! # Orders (requires auth)
//! POST /orders/                - Checkout
//! GET  /orders/                - Own orders, or all for admins
//! GET  /orders/{id}            - Order detail
//! ```

pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::db::Store;
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories/", get(categories::list).post(categories::create))
        .route("/products/", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/", get(cart::show))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the order routes router.
///
/// Kept separate so the server can put the stricter checkout rate limit on it.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/", get(orders::list).post(orders::create))
        .route("/orders/{id}", get(orders::show))
}

/// Create all routes except orders.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/users/", get(users::list))
        .route("/users/me", get(users::me))
        .merge(catalog_routes())
        .merge(cart_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match Store::ping(state.store()).await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
