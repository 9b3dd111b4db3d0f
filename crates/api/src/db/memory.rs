//! In-process [`Store`] for tests and database-less local runs.
//!
//! All tables live behind one async mutex. A checkout unit holds the lock for
//! its whole lifetime and works on a staged copy of the tables, which replaces
//! the live copy on commit. Dropping the unit discards the copy, which gives
//! the same all-or-nothing behavior as a database transaction.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use stockroom_core::{
    CartId, CartItemId, CategoryId, Email, OrderId, OrderItemId, OrderStatus, PaymentLogId,
    ProductId, Quantity, UserId,
};

use super::RepositoryError;
use super::ports::{
    CartStore, CatalogStore, CheckoutStore, CheckoutUnit, OrderStore, Store, UserStore,
};
use crate::models::{
    Cart, CartItem, CartWithItems, Category, NewOrderItem, NewProduct, Order, OrderItem,
    OrderScope, OrderWithItems, PaymentLog, Product, ProductDetail, ProductFilter, ProductUpdate,
    User,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: i32,
    users: BTreeMap<UserId, User>,
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    carts: BTreeMap<CartId, Cart>,
    cart_items: BTreeMap<CartItemId, CartItem>,
    orders: BTreeMap<OrderId, Order>,
    order_items: BTreeMap<OrderItemId, OrderItem>,
    payment_logs: BTreeMap<PaymentLogId, PaymentLog>,
}

impl Tables {
    /// One sequence shared by every table.
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn cart_of(&self, user_id: UserId) -> Option<&Cart> {
        self.carts.values().find(|cart| cart.user_id == user_id)
    }

    fn cart_with_items(&self, cart: &Cart) -> CartWithItems {
        CartWithItems {
            cart: cart.clone(),
            items: self
                .cart_items
                .values()
                .filter(|item| item.cart_id == cart.id)
                .cloned()
                .collect(),
        }
    }

    fn detail(&self, product: &Product) -> Result<ProductDetail, RepositoryError> {
        let category = self
            .categories
            .get(&product.category_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "product {} references missing category {}",
                    product.id, product.category_id
                ))
            })?;
        Ok(ProductDetail {
            product: product.clone(),
            category,
        })
    }

    fn order_with_items(&self, order: &Order) -> OrderWithItems {
        OrderWithItems {
            order: order.clone(),
            items: self
                .order_items
                .values()
                .filter(|item| item.order_id == order.id)
                .cloned()
                .collect(),
        }
    }
}

/// Store keeping every table in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| &u.email == email).cloned())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.tables.lock().await.users.values().cloned().collect())
    }

    async fn create_user(&self, email: &Email, is_admin: bool) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| &u.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let user = User {
            id: UserId::new(tables.next_id()),
            email: email.clone(),
            is_admin,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.tables.lock().await.categories.get(&id).cloned())
    }

    async fn create_category(&self, name: &str) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.categories.values().any(|c| c.name == name) {
            return Err(RepositoryError::Conflict(
                "category already exists".to_owned(),
            ));
        }
        let category = Category {
            id: CategoryId::new(tables.next_id()),
            name: name.to_owned(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductDetail>, RepositoryError> {
        let tables = self.tables.lock().await;
        let category_id = match filter.category.as_deref() {
            Some(name) => match tables.categories.values().find(|c| c.name == name) {
                Some(category) => Some(category.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.page_size()).unwrap_or(0);

        tables
            .products
            .values()
            .filter(|p| category_id.is_none_or(|id| p.category_id == id))
            .skip(offset)
            .take(limit)
            .map(|p| tables.detail(p))
            .collect()
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn product_detail(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let tables = self.tables.lock().await;
        tables.products.get(&id).map(|p| tables.detail(p)).transpose()
    }

    async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.categories.contains_key(&new.category_id) {
            return Err(RepositoryError::Conflict("invalid category".to_owned()));
        }
        let product = Product {
            id: ProductId::new(tables.next_id()),
            name: new.name.clone(),
            description: new.description.clone(),
            price: new.price,
            stock: new.stock,
            category_id: new.category_id,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if let Some(category_id) = update.category_id
            && !tables.categories.contains_key(&category_id)
        {
            return Err(RepositoryError::Conflict("invalid category".to_owned()));
        }
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        update.apply_to(product);
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.products.contains_key(&id) {
            return Ok(false);
        }
        if tables.order_items.values().any(|item| item.product_id == id) {
            return Err(RepositoryError::Conflict(
                "product is referenced by orders".to_owned(),
            ));
        }
        tables.cart_items.retain(|_, item| item.product_id != id);
        tables.products.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<CartWithItems>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.cart_of(user_id).map(|cart| tables.cart_with_items(cart)))
    }

    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if let Some(cart) = tables.cart_of(user_id) {
            return Ok(cart.clone());
        }
        let cart = Cart {
            id: CartId::new(tables.next_id()),
            user_id,
        };
        tables.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn add_cart_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.products.contains_key(&product_id) {
            return Err(RepositoryError::Conflict("product not found".to_owned()));
        }

        if let Some(item) = tables
            .cart_items
            .values_mut()
            .find(|item| item.cart_id == cart_id && item.product_id == product_id)
        {
            item.quantity = item.quantity.checked_add(quantity).ok_or_else(|| {
                RepositoryError::Conflict("cart quantity out of range".to_owned())
            })?;
            return Ok(item.clone());
        }

        let item = CartItem {
            id: CartItemId::new(tables.next_id()),
            cart_id,
            product_id,
            quantity,
        };
        tables.cart_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn cart_item_for_user(
        &self,
        item_id: CartItemId,
        user_id: UserId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let tables = self.tables.lock().await;
        let Some(cart_id) = tables.cart_of(user_id).map(|cart| cart.id) else {
            return Ok(None);
        };
        Ok(tables
            .cart_items
            .get(&item_id)
            .filter(|item| item.cart_id == cart_id)
            .cloned())
    }

    async fn set_cart_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let item = tables
            .cart_items
            .get_mut(&item_id)
            .ok_or(RepositoryError::NotFound)?;
        item.quantity = quantity;
        Ok(item.clone())
    }

    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError> {
        Ok(self
            .tables
            .lock()
            .await
            .cart_items
            .remove(&item_id)
            .is_some())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn list_orders(&self, scope: OrderScope) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut orders: Vec<&Order> = tables
            .orders
            .values()
            .filter(|order| match scope {
                OrderScope::All => true,
                OrderScope::User(user_id) => order.user_id == user_id,
            })
            .collect();
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(orders
            .into_iter()
            .map(|order| tables.order_with_items(order))
            .collect())
    }

    async fn order(&self, id: OrderId) -> Result<Option<OrderWithItems>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .get(&id)
            .map(|order| tables.order_with_items(order)))
    }

    async fn payment_logs(&self, order_id: OrderId) -> Result<Vec<PaymentLog>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .payment_logs
            .values()
            .filter(|log| log.order_id == order_id)
            .cloned()
            .collect())
    }
}

/// Checkout unit over a staged copy of the tables.
struct MemoryCheckoutUnit {
    guard: Option<OwnedMutexGuard<Tables>>,
    staged: Tables,
}

impl MemoryCheckoutUnit {
    fn ensure_open(&self) -> Result<(), RepositoryError> {
        if self.guard.is_some() {
            Ok(())
        } else {
            Err(RepositoryError::TransactionClosed)
        }
    }
}

#[async_trait]
impl CheckoutUnit for MemoryCheckoutUnit {
    async fn lock_cart(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<CartWithItems>, RepositoryError> {
        self.ensure_open()?;
        Ok(self
            .staged
            .cart_of(user_id)
            .map(|cart| self.staged.cart_with_items(cart)))
    }

    async fn lock_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        self.ensure_open()?;
        let mut products: Vec<Product> = ids
            .iter()
            .filter_map(|id| self.staged.products.get(id).cloned())
            .collect();
        products.sort_by_key(|p| p.id);
        products.dedup_by_key(|p| p.id);
        Ok(products)
    }

    async fn insert_order(
        &mut self,
        user_id: UserId,
        total: Decimal,
    ) -> Result<Order, RepositoryError> {
        self.ensure_open()?;
        let order = Order {
            id: OrderId::new(self.staged.next_id()),
            user_id,
            status: OrderStatus::Pending,
            total,
            created_at: Utc::now(),
        };
        self.staged.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn insert_order_items(
        &mut self,
        order_id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        self.ensure_open()?;
        if !self.staged.orders.contains_key(&order_id) {
            return Err(RepositoryError::NotFound);
        }
        let mut inserted = Vec::with_capacity(items.len());
        for item in items {
            let row = OrderItem {
                id: OrderItemId::new(self.staged.next_id()),
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
            };
            self.staged.order_items.insert(row.id, row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn record_payment(
        &mut self,
        order_id: OrderId,
        success: bool,
    ) -> Result<PaymentLog, RepositoryError> {
        self.ensure_open()?;
        let log = PaymentLog {
            id: PaymentLogId::new(self.staged.next_id()),
            order_id,
            success,
            created_at: Utc::now(),
        };
        self.staged.payment_logs.insert(log.id, log.clone());
        Ok(log)
    }

    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), RepositoryError> {
        self.ensure_open()?;
        let product = self
            .staged
            .products
            .get_mut(&product_id)
            .ok_or(RepositoryError::NotFound)?;
        if !quantity.fits_in(product.stock) {
            return Err(RepositoryError::Conflict(format!(
                "insufficient stock for product {product_id}"
            )));
        }
        product.stock -= quantity.get();
        Ok(())
    }

    async fn clear_cart(&mut self, cart_id: CartId) -> Result<u64, RepositoryError> {
        self.ensure_open()?;
        let before = self.staged.cart_items.len();
        self.staged.cart_items.retain(|_, item| item.cart_id != cart_id);
        let removed = before - self.staged.cart_items.len();
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    async fn set_order_status(
        &mut self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        self.ensure_open()?;
        let order = self
            .staged
            .orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::NotFound)?;
        order.status = status;
        Ok(order.clone())
    }

    async fn commit(&mut self) -> Result<(), RepositoryError> {
        let mut guard = self.guard.take().ok_or(RepositoryError::TransactionClosed)?;
        *guard = std::mem::take(&mut self.staged);
        Ok(())
    }
}

#[async_trait]
impl CheckoutStore for MemoryStore {
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutUnit>, RepositoryError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryCheckoutUnit {
            guard: Some(guard),
            staged,
        }))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
