//! Transactional checkout unit for `PostgreSQL`.
//!
//! The cart row is locked `FOR UPDATE` so one user cannot check out the same
//! cart twice concurrently. Product rows are locked in ascending id order in
//! a single statement so that two checkouts touching overlapping products
//! always acquire locks in the same order and cannot deadlock.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use stockroom_core::{CartId, OrderId, OrderStatus, ProductId, Quantity, UserId};

use super::RepositoryError;
use super::ports::CheckoutUnit;
use crate::models::{Cart, CartItem, CartWithItems, NewOrderItem, Order, OrderItem, PaymentLog, Product};

/// A checkout running inside one database transaction.
///
/// Dropping the unit before [`commit`](CheckoutUnit::commit) rolls the
/// transaction back.
pub struct PgCheckoutUnit {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgCheckoutUnit {
    /// Begin a transaction on the pool.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if no connection is available.
    pub async fn begin(pool: &PgPool) -> Result<Self, RepositoryError> {
        let tx = pool.begin().await?;
        Ok(Self { tx: Some(tx) })
    }

    fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>, RepositoryError> {
        self.tx.as_mut().ok_or(RepositoryError::TransactionClosed)
    }
}

#[async_trait]
impl CheckoutUnit for PgCheckoutUnit {
    async fn lock_cart(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<CartWithItems>, RepositoryError> {
        let tx = self.tx()?;

        let Some(cart) = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id FROM cart WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, CartItem>(
            "SELECT id, cart_id, product_id, quantity FROM cart_item
             WHERE cart_id = $1 ORDER BY id FOR UPDATE",
        )
        .bind(cart.id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(Some(CartWithItems { cart, items }))
    }

    async fn lock_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let tx = self.tx()?;
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, stock, category_id FROM product
             WHERE id = ANY($1)
             ORDER BY id
             FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?;
        Ok(products)
    }

    async fn insert_order(
        &mut self,
        user_id: UserId,
        total: Decimal,
    ) -> Result<Order, RepositoryError> {
        let tx = self.tx()?;
        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO customer_order (user_id, status, total) VALUES ($1, $2, $3)
             RETURNING id, user_id, status, total, created_at",
        )
        .bind(user_id)
        .bind(OrderStatus::Pending)
        .bind(total)
        .fetch_one(&mut **tx)
        .await?;
        Ok(order)
    }

    async fn insert_order_items(
        &mut self,
        order_id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let tx = self.tx()?;
        let mut inserted = Vec::with_capacity(items.len());
        for item in items {
            let row = sqlx::query_as::<_, OrderItem>(
                "INSERT INTO order_item (order_id, product_id, quantity, price)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id, order_id, product_id, quantity, price",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .fetch_one(&mut **tx)
            .await?;
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn record_payment(
        &mut self,
        order_id: OrderId,
        success: bool,
    ) -> Result<PaymentLog, RepositoryError> {
        let tx = self.tx()?;
        let log = sqlx::query_as::<_, PaymentLog>(
            "INSERT INTO payment_log (order_id, success) VALUES ($1, $2)
             RETURNING id, order_id, success, created_at",
        )
        .bind(order_id)
        .bind(success)
        .fetch_one(&mut **tx)
        .await?;
        Ok(log)
    }

    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), RepositoryError> {
        let tx = self.tx()?;
        let result = sqlx::query(
            "UPDATE product SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
        )
        .bind(product_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "insufficient stock for product {product_id}"
            )));
        }
        Ok(())
    }

    async fn clear_cart(&mut self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let tx = self.tx()?;
        let result = sqlx::query("DELETE FROM cart_item WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn set_order_status(
        &mut self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let tx = self.tx()?;
        sqlx::query_as::<_, Order>(
            "UPDATE customer_order SET status = $2 WHERE id = $1
             RETURNING id, user_id, status, total, created_at",
        )
        .bind(order_id)
        .bind(status)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        let tx = self.tx.take().ok_or(RepositoryError::TransactionClosed)?;
        tx.commit().await?;
        Ok(())
    }
}
