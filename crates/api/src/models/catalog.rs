//! Catalog types: categories and products.

use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, Price, ProductId};

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound on a single page of products.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A product as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Current unit price. Orders snapshot this at checkout.
    pub price: Price,
    /// Units available. Never negative.
    pub stock: i32,
    pub category_id: CategoryId,
}

/// A product together with its category, as returned by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Category,
}

/// Payload for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    pub stock: i32,
    pub category_id: CategoryId,
}

impl NewProduct {
    /// Check field constraints not expressed by the types.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason if the name is blank or stock is negative.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Product name cannot be empty".to_owned());
        }
        if self.stock < 0 {
            return Err("Stock cannot be negative".to_owned());
        }
        Ok(())
    }
}

/// Partial update for a product. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<i32>,
    pub category_id: Option<CategoryId>,
}

impl ProductUpdate {
    /// Check field constraints not expressed by the types.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason if a provided name is blank or a
    /// provided stock is negative.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err("Product name cannot be empty".to_owned());
        }
        if self.stock.is_some_and(|stock| stock < 0) {
            return Err("Stock cannot be negative".to_owned());
        }
        Ok(())
    }

    /// Apply the update to an in-memory product.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
    }
}

/// Query parameters for listing products.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductFilter {
    /// Only products in the category with this exact name.
    pub category: Option<String>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

const fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category: None,
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProductFilter {
    /// Offset clamped to be non-negative.
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.skip.max(0)
    }

    /// Page size clamped to `0..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn page_size(&self) -> i64 {
        self.limit.clamp(0, MAX_PAGE_SIZE)
    }
}
