//! Cart types.

use serde::Serialize;

use stockroom_core::{CartId, CartItemId, ProductId, Quantity, UserId};

/// A user's cart. At most one per user, created on first add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
}

/// One product line in a cart. Unique per `(cart_id, product_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    #[serde(skip)]
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// A cart with its items loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartWithItems {
    pub cart: Cart,
    pub items: Vec<CartItem>,
}

impl CartWithItems {
    /// Whether there is nothing to check out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct product IDs in ascending order.
    ///
    /// Checkout locks product rows in this order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.items.iter().map(|item| item.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
