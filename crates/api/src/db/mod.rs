//! Persistence for the catalog, carts, orders and users.
//!
//! # Layout
//!
//! - [`ports`] - async traits the rest of the crate programs against
//! - [`postgres`] - `PostgreSQL` adapter ([`PgStore`]), built from the
//!   per-table repositories in [`users`], [`catalog`], [`carts`], [`orders`]
//!   and the transactional [`checkout`] unit
//! - [`memory`] - in-process adapter ([`MemoryStore`]) for tests and local runs
//!
//! # Tables
//!
//! - `app_user` - users (email, admin flag)
//! - `category`, `product` - the catalog
//! - `cart`, `cart_item` - one cart per user, one line per product
//! - `customer_order`, `order_item`, `payment_log` - checkout results
//!
//! The reference schema lives in `crates/api/schema.sql`.

pub mod carts;
pub mod catalog;
pub mod checkout;
pub mod memory;
pub mod orders;
pub mod ports;
pub mod postgres;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::MemoryStore;
pub use ports::{
    CartStore, CatalogStore, CheckoutStore, CheckoutUnit, OrderStore, Store, UserStore,
};
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, product still referenced).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A unit of work was used after it was committed.
    #[error("transaction already closed")]
    TransactionClosed,
}

impl RepositoryError {
    /// Map unique and foreign-key violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
