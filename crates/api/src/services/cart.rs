//! Cart operations with stock validation.
//!
//! Stock here is advisory: it stops obviously impossible carts, but the
//! authoritative check happens at checkout against locked rows.

use thiserror::Error;
use tracing::debug;

use stockroom_core::{CartItemId, ProductId, Quantity};

use crate::db::{CartStore, CatalogStore, RepositoryError, Store};
use crate::models::{CartItem, User};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("product not found")]
    ProductNotFound,

    #[error("cart item not found")]
    ItemNotFound,

    #[error("insufficient stock")]
    InsufficientStock,

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result of changing an item's quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityChange {
    Updated(CartItem),
    /// A quantity below one removes the line.
    Removed,
}

/// Add `quantity` of a product to the user's cart, creating the cart if
/// needed and merging into an existing line.
///
/// # Errors
///
/// Returns `CartError::ProductNotFound` if the product does not exist, or
/// `CartError::InsufficientStock` if the merged line would exceed stock.
pub async fn add_item(
    store: &dyn Store,
    user: &User,
    product_id: ProductId,
    quantity: Quantity,
) -> Result<CartItem, CartError> {
    let product = store
        .product(product_id)
        .await?
        .ok_or(CartError::ProductNotFound)?;

    let cart = store.get_or_create_cart(user.id).await?;
    let existing = store
        .cart_for_user(user.id)
        .await?
        .and_then(|c| c.items.into_iter().find(|i| i.product_id == product_id))
        .map(|i| i.quantity);

    let merged = match existing {
        Some(current) => current
            .checked_add(quantity)
            .ok_or(CartError::InsufficientStock)?,
        None => quantity,
    };
    if !merged.fits_in(product.stock) {
        return Err(CartError::InsufficientStock);
    }

    let item = store.add_cart_item(cart.id, product_id, quantity).await?;
    debug!(cart_id = %cart.id, product_id = %product_id, quantity = %item.quantity, "Cart item added");
    Ok(item)
}

/// Set an item's quantity. Values below one remove the item.
///
/// # Errors
///
/// Returns `CartError::ItemNotFound` unless the item is in the user's cart,
/// or `CartError::InsufficientStock` if the quantity exceeds stock.
pub async fn set_quantity(
    store: &dyn Store,
    user: &User,
    item_id: CartItemId,
    quantity: i32,
) -> Result<QuantityChange, CartError> {
    let item = store
        .cart_item_for_user(item_id, user.id)
        .await?
        .ok_or(CartError::ItemNotFound)?;

    let Ok(quantity) = Quantity::new(quantity) else {
        store.delete_cart_item(item.id).await?;
        return Ok(QuantityChange::Removed);
    };

    let product = store
        .product(item.product_id)
        .await?
        .ok_or(CartError::ProductNotFound)?;
    if !quantity.fits_in(product.stock) {
        return Err(CartError::InsufficientStock);
    }

    let updated = store.set_cart_item_quantity(item.id, quantity).await?;
    Ok(QuantityChange::Updated(updated))
}

/// Remove an item from the user's cart.
///
/// # Errors
///
/// Returns `CartError::ItemNotFound` unless the item is in the user's cart.
pub async fn remove_item(
    store: &dyn Store,
    user: &User,
    item_id: CartItemId,
) -> Result<(), CartError> {
    let item = store
        .cart_item_for_user(item_id, user.id)
        .await?
        .ok_or(CartError::ItemNotFound)?;
    store.delete_cart_item(item.id).await?;
    Ok(())
}
