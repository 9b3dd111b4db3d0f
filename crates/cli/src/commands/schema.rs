//! Schema management.
//!
//! # Usage
//!
//! ```bash
//! stockroom schema apply
//! ```
//!
//! # Environment Variables
//!
//! - `STOCKROOM_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use super::{CommandError, connect};

/// The full schema. Every statement is idempotent.
const SCHEMA: &str = include_str!("../../../api/schema.sql");

/// Apply the schema to the configured database.
///
/// # Errors
///
/// Returns `CommandError` if the connection or any statement fails.
pub async fn apply() -> Result<(), CommandError> {
    let store = connect().await?;

    tracing::info!("Applying schema...");
    sqlx::raw_sql(SCHEMA).execute(store.pool()).await?;

    tracing::info!("Schema applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creates_every_table() {
        for table in [
            "app_user",
            "category",
            "product",
            "cart",
            "cart_item",
            "customer_order",
            "order_item",
            "payment_log",
        ] {
            assert!(
                SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
                "missing table {table}"
            );
        }
    }
}
