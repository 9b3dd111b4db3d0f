//! Domain models for the API.
//!
//! These are the validated shapes that cross the store boundary. Each derives
//! `sqlx::FromRow` for the Postgres adapter and `Serialize` for responses.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use cart::{Cart, CartItem, CartWithItems};
pub use catalog::{Category, NewProduct, Product, ProductDetail, ProductFilter, ProductUpdate};
pub use order::{NewOrderItem, Order, OrderItem, OrderScope, OrderWithItems, PaymentLog};
pub use user::User;
