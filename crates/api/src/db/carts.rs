//! Cart repository.

use sqlx::PgPool;

use stockroom_core::{CartId, CartItemId, ProductId, Quantity, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem, CartWithItems};

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a user's cart and its items, if the cart exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn for_user(&self, user_id: UserId) -> Result<Option<CartWithItems>, RepositoryError> {
        let Some(cart) =
            sqlx::query_as::<_, Cart>("SELECT id, user_id FROM cart WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, CartItem>(
            "SELECT id, cart_id, product_id, quantity FROM cart_item WHERE cart_id = $1 ORDER BY id",
        )
        .bind(cart.id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(CartWithItems { cart, items }))
    }

    /// Get the user's cart, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        // The no-op update makes RETURNING yield the existing row.
        let cart = sqlx::query_as::<_, Cart>(
            "INSERT INTO cart (user_id) VALUES ($1)
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
             RETURNING id, user_id",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(cart)
    }

    /// Add a product, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product does not exist.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        sqlx::query_as::<_, CartItem>(
            "INSERT INTO cart_item (cart_id, product_id, quantity) VALUES ($1, $2, $3)
             ON CONFLICT (cart_id, product_id)
             DO UPDATE SET quantity = cart_item.quantity + EXCLUDED.quantity
             RETURNING id, cart_id, product_id, quantity",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "product not found"))
    }

    /// Get a cart item, only if it belongs to the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item_for_user(
        &self,
        item_id: CartItemId,
        user_id: UserId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(
            "SELECT ci.id, ci.cart_id, ci.product_id, ci.quantity
             FROM cart_item ci
             JOIN cart c ON c.id = ci.cart_id
             WHERE ci.id = $1 AND c.user_id = $2",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(item)
    }

    /// Overwrite an item's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn set_quantity(
        &self,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        sqlx::query_as::<_, CartItem>(
            "UPDATE cart_item SET quantity = $2 WHERE id = $1
             RETURNING id, cart_id, product_id, quantity",
        )
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete an item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_item WHERE id = $1")
            .bind(item_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
