//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stockroom_core::{OrderId, OrderItemId, OrderStatus, PaymentLogId, Price, ProductId, Quantity, UserId};

/// An order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    /// Sum of `price * quantity` over the order's items.
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A purchased line, with the unit price captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    #[serde(skip)]
    pub id: OrderItemId,
    #[serde(skip)]
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Price,
}

/// A line to be written as part of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Price,
}

impl NewOrderItem {
    /// Price times quantity, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.line_total(self.quantity)
    }

    /// Sum of the line totals, or `None` on overflow.
    #[must_use]
    pub fn order_total(lines: &[Self]) -> Option<Decimal> {
        lines
            .iter()
            .try_fold(Decimal::ZERO, |total, line| total.checked_add(line.line_total()?))
    }
}

/// An order with its items, as returned by the order endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Record of one payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PaymentLog {
    pub id: PaymentLogId,
    pub order_id: OrderId,
    pub success: bool,
    pub created_at: DateTime<Utc>,
}

/// Which orders a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Every order (admin view).
    All,
    /// Orders placed by one user.
    User(UserId),
}

impl OrderScope {
    /// The scope a user is allowed to list.
    #[must_use]
    pub const fn for_user(user: &super::User) -> Self {
        if user.is_admin {
            Self::All
        } else {
            Self::User(user.id)
        }
    }
}
