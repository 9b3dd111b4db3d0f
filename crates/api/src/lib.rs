//! Stockroom API library.
//!
//! JSON HTTP API for a small store: catalog, per-user carts and a
//! transactional checkout. The binary in `main.rs` wires configuration,
//! logging and Sentry around [`app`]; tests drive [`app`] directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, http::Request, middleware::from_fn};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Whether [`app`] applies the per-IP rate limiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimits {
    /// Checkout and general API limits keyed on proxy client-IP headers.
    PerClientIp,
    /// No limits. Requests without client-IP headers are served.
    Disabled,
}

/// Build the application router with its middleware stack.
///
/// Sentry layers are left to the caller so they sit outermost.
pub fn app(state: AppState, limits: RateLimits) -> Router {
    let (routes, orders) = match limits {
        RateLimits::PerClientIp => (
            routes::routes().layer(middleware::api_rate_limiter()),
            routes::order_routes().layer(middleware::checkout_rate_limiter()),
        ),
        RateLimits::Disabled => (routes::routes(), routes::order_routes()),
    };

    Router::new()
        .merge(routes)
        .merge(orders)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
