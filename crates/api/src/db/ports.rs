//! Store ports.
//!
//! Handlers and services depend on these traits only, so the same code runs
//! against [`PgStore`](super::PgStore) in production and
//! [`MemoryStore`](super::MemoryStore) in tests.

use async_trait::async_trait;
use rust_decimal::Decimal;

use stockroom_core::{
    CartId, CartItemId, CategoryId, Email, OrderId, OrderStatus, ProductId, Quantity, UserId,
};

use super::RepositoryError;
use crate::models::{
    Cart, CartItem, CartWithItems, Category, NewOrderItem, NewProduct, Order, OrderItem,
    OrderScope, OrderWithItems, PaymentLog, Product, ProductDetail, ProductFilter, ProductUpdate,
    User,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;
    /// Fails with `Conflict` if the email is taken.
    async fn create_user(&self, email: &Email, is_admin: bool) -> Result<User, RepositoryError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;
    /// Fails with `Conflict` if the name is taken.
    async fn create_category(&self, name: &str) -> Result<Category, RepositoryError>;

    /// Products ordered by id, filtered and paged.
    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductDetail>, RepositoryError>;
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn product_detail(&self, id: ProductId)
    -> Result<Option<ProductDetail>, RepositoryError>;
    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError>;
    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError>;
    /// Removes the product from every cart. Fails with `Conflict` if an
    /// order item references it.
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn cart_for_user(&self, user_id: UserId)
    -> Result<Option<CartWithItems>, RepositoryError>;
    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError>;
    /// Inserts a line, or adds to the quantity of the existing line for the
    /// same product.
    async fn add_cart_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError>;
    /// The item, only if it sits in `user_id`'s cart.
    async fn cart_item_for_user(
        &self,
        item_id: CartItemId,
        user_id: UserId,
    ) -> Result<Option<CartItem>, RepositoryError>;
    async fn set_cart_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError>;
    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Orders in the scope, newest first.
    async fn list_orders(&self, scope: OrderScope) -> Result<Vec<OrderWithItems>, RepositoryError>;
    async fn order(&self, id: OrderId) -> Result<Option<OrderWithItems>, RepositoryError>;
    async fn payment_logs(&self, order_id: OrderId) -> Result<Vec<PaymentLog>, RepositoryError>;
}

/// Opens checkout units of work.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutUnit>, RepositoryError>;
}

/// One checkout transaction.
///
/// Nothing written through a unit is visible to other callers until
/// [`commit`](CheckoutUnit::commit). Dropping the unit without committing
/// discards every write.
#[async_trait]
pub trait CheckoutUnit: Send {
    /// Load the user's cart with its items, locking the cart against a
    /// concurrent checkout by the same user.
    async fn lock_cart(&mut self, user_id: UserId)
    -> Result<Option<CartWithItems>, RepositoryError>;

    /// Exclusively lock the given products, in ascending id order, and return
    /// their current rows. Missing ids are absent from the result.
    async fn lock_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// Create a `PENDING` order.
    async fn insert_order(&mut self, user_id: UserId, total: Decimal)
    -> Result<Order, RepositoryError>;

    async fn insert_order_items(
        &mut self,
        order_id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<Vec<OrderItem>, RepositoryError>;

    async fn record_payment(
        &mut self,
        order_id: OrderId,
        success: bool,
    ) -> Result<PaymentLog, RepositoryError>;

    /// Take units from a locked product. Fails with `Conflict` rather than
    /// letting stock go negative.
    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), RepositoryError>;

    /// Delete every item in the cart, returning how many were removed.
    async fn clear_cart(&mut self, cart_id: CartId) -> Result<u64, RepositoryError>;

    async fn set_order_status(
        &mut self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError>;

    async fn commit(&mut self) -> Result<(), RepositoryError>;
}

/// Everything the API needs from persistence.
#[async_trait]
pub trait Store: UserStore + CatalogStore + CartStore + OrderStore + CheckoutStore {
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
