//! [`Store`] implementation backed by a `PostgreSQL` pool.

use async_trait::async_trait;
use sqlx::PgPool;

use stockroom_core::{
    CartId, CartItemId, CategoryId, Email, OrderId, ProductId, Quantity, UserId,
};

use super::RepositoryError;
use super::carts::CartRepository;
use super::catalog::CatalogRepository;
use super::checkout::PgCheckoutUnit;
use super::orders::OrderRepository;
use super::ports::{
    CartStore, CatalogStore, CheckoutStore, CheckoutUnit, OrderStore, Store, UserStore,
};
use super::users::UserRepository;
use crate::models::{
    Cart, CartItem, CartWithItems, Category, NewProduct, OrderScope, OrderWithItems, PaymentLog,
    Product, ProductDetail, ProductFilter, ProductUpdate, User,
};

/// Store over a shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_email(email).await
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_id(id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        UserRepository::new(&self.pool).list().await
    }

    async fn create_user(&self, email: &Email, is_admin: bool) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).create(email, is_admin).await
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        CatalogRepository::new(&self.pool).list_categories().await
    }

    async fn category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        CatalogRepository::new(&self.pool).get_category(id).await
    }

    async fn create_category(&self, name: &str) -> Result<Category, RepositoryError> {
        CatalogRepository::new(&self.pool).create_category(name).await
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductDetail>, RepositoryError> {
        CatalogRepository::new(&self.pool).list_products(filter).await
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        CatalogRepository::new(&self.pool).get_product(id).await
    }

    async fn product_detail(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        CatalogRepository::new(&self.pool).get_product_detail(id).await
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        CatalogRepository::new(&self.pool).create_product(product).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        CatalogRepository::new(&self.pool)
            .update_product(id, update)
            .await
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        CatalogRepository::new(&self.pool).delete_product(id).await
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn cart_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<CartWithItems>, RepositoryError> {
        CartRepository::new(&self.pool).for_user(user_id).await
    }

    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        CartRepository::new(&self.pool).get_or_create(user_id).await
    }

    async fn add_cart_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        CartRepository::new(&self.pool)
            .add_item(cart_id, product_id, quantity)
            .await
    }

    async fn cart_item_for_user(
        &self,
        item_id: CartItemId,
        user_id: UserId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        CartRepository::new(&self.pool)
            .item_for_user(item_id, user_id)
            .await
    }

    async fn set_cart_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        CartRepository::new(&self.pool)
            .set_quantity(item_id, quantity)
            .await
    }

    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError> {
        CartRepository::new(&self.pool).delete_item(item_id).await
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn list_orders(&self, scope: OrderScope) -> Result<Vec<OrderWithItems>, RepositoryError> {
        OrderRepository::new(&self.pool).list(scope).await
    }

    async fn order(&self, id: OrderId) -> Result<Option<OrderWithItems>, RepositoryError> {
        OrderRepository::new(&self.pool).get(id).await
    }

    async fn payment_logs(&self, order_id: OrderId) -> Result<Vec<PaymentLog>, RepositoryError> {
        OrderRepository::new(&self.pool).payment_logs(order_id).await
    }
}

#[async_trait]
impl CheckoutStore for PgStore {
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutUnit>, RepositoryError> {
        Ok(Box::new(PgCheckoutUnit::begin(&self.pool).await?))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
