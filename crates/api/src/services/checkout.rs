//! Checkout: turns a user's cart into an order in one unit of work.
//!
//! Stock is checked once, against product rows locked for the rest of the
//! transaction. The payment attempt happens inside the same transaction, so
//! stock is only ever taken for an approved charge and a failed charge leaves
//! the cart in place for a retry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument, warn};

use stockroom_core::{OrderId, PaymentOutcome, Price, ProductId};

use super::payment::{PaymentProcessor, PaymentRequest};
use crate::db::{CheckoutStore, RepositoryError, Store};
use crate::models::{NewOrderItem, OrderWithItems, Product, User};

/// Default upper bound on a single payment attempt.
pub const DEFAULT_PAYMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that end a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user has no cart, or it has no items. Nothing was created.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line asks for more than is in stock. Nothing was created.
    #[error("insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i32,
        available: i32,
    },

    /// A cart line points at a product that no longer exists. Nothing was created.
    #[error("product {0} is no longer available")]
    ProductUnavailable(ProductId),

    /// The order total does not fit in a storable amount. Nothing was created.
    #[error("order total exceeds {max}", max = Price::MAX)]
    TotalTooLarge,

    /// The charge did not go through. The order was recorded as `FAILED`.
    #[error("payment {outcome} for order {order_id}")]
    PaymentFailed {
        order_id: OrderId,
        outcome: PaymentOutcome,
    },

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Places orders.
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn Store>,
    payments: Arc<dyn PaymentProcessor>,
    payment_timeout: Duration,
}

impl CheckoutService {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        payments: Arc<dyn PaymentProcessor>,
        payment_timeout: Duration,
    ) -> Self {
        Self {
            store,
            payments,
            payment_timeout,
        }
    }

    /// Check out the user's cart.
    ///
    /// On success the order is `PAID`, stock has been taken and the cart is
    /// empty. On [`CheckoutError::PaymentFailed`] a `FAILED` order with its
    /// items and payment log has been committed, and stock and cart are
    /// untouched. Any other error leaves the store exactly as it was.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`].
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create_order(&self, user: &User) -> Result<OrderWithItems, CheckoutError> {
        let mut unit = self.store.begin_checkout().await?;

        let cart = unit
            .lock_cart(user.id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(CheckoutError::EmptyCart)?;

        let products = unit.lock_products(&cart.product_ids()).await?;
        let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();

        let mut lines = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let product = by_id
                .get(&item.product_id)
                .ok_or(CheckoutError::ProductUnavailable(item.product_id))?;
            if !item.quantity.fits_in(product.stock) {
                return Err(CheckoutError::InsufficientStock {
                    product: product.name.clone(),
                    requested: item.quantity.get(),
                    available: product.stock,
                });
            }
            lines.push(NewOrderItem {
                product_id: product.id,
                quantity: item.quantity,
                price: product.price,
            });
        }

        let total = NewOrderItem::order_total(&lines)
            .filter(|total| *total <= Price::MAX)
            .ok_or(CheckoutError::TotalTooLarge)?;
        let order = unit.insert_order(user.id, total).await?;
        let items = unit.insert_order_items(order.id, &lines).await?;

        let outcome = self
            .charge(&PaymentRequest {
                order_id: order.id,
                user_id: user.id,
                amount: total,
            })
            .await;
        unit.record_payment(order.id, outcome.is_success()).await?;

        if outcome.is_success() {
            for line in &lines {
                unit.decrement_stock(line.product_id, line.quantity).await?;
            }
            unit.clear_cart(cart.cart.id).await?;
        }

        let order = unit.set_order_status(order.id, outcome.order_status()).await?;
        unit.commit().await?;

        if !outcome.is_success() {
            warn!(
                order_id = %order.id,
                user_id = %user.id,
                total = %order.total,
                %outcome,
                "Payment failed"
            );
            return Err(CheckoutError::PaymentFailed {
                order_id: order.id,
                outcome,
            });
        }

        info!(
            order_id = %order.id,
            user_id = %user.id,
            total = %order.total,
            items = items.len(),
            "Order placed"
        );
        Ok(OrderWithItems { order, items })
    }

    /// Charge, treating no answer within the timeout as a failure.
    async fn charge(&self, request: &PaymentRequest) -> PaymentOutcome {
        tokio::time::timeout(self.payment_timeout, self.payments.charge(request))
            .await
            .unwrap_or(PaymentOutcome::TimedOut)
    }
}
