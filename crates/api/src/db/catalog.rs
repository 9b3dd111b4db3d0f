//! Category and product repository.

use sqlx::PgPool;

use stockroom_core::{CategoryId, Price, ProductId};

use super::RepositoryError;
use crate::models::{Category, NewProduct, Product, ProductDetail, ProductFilter, ProductUpdate};

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, category_id";

/// A product row joined with its category.
#[derive(sqlx::FromRow)]
struct ProductDetailRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: Price,
    stock: i32,
    category_id: CategoryId,
    category_name: String,
}

impl From<ProductDetailRow> for ProductDetail {
    fn from(row: ProductDetailRow) -> Self {
        Self {
            product: Product {
                id: row.id,
                name: row.name,
                description: row.description,
                price: row.price,
                stock: row.stock,
                category_id: row.category_id,
            },
            category: Category {
                id: row.category_id,
                name: row.category_name,
            },
        }
    }
}

const DETAIL_SELECT: &str = r"
    SELECT p.id, p.name, p.description, p.price, p.stock, p.category_id,
           c.name AS category_name
    FROM product p
    JOIN category c ON c.id = p.category_id
";

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM category ORDER BY name")
                .fetch_all(self.pool)
                .await?;
        Ok(categories)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>("SELECT id, name FROM category WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(category)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create_category(&self, name: &str) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>("INSERT INTO category (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "category already exists"))
    }

    /// List products with their categories, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductDetailRow>(&format!(
            "{DETAIL_SELECT}
             WHERE ($1::text IS NULL OR c.name = $1)
             ORDER BY p.id
             OFFSET $2 LIMIT $3"
        ))
        .bind(filter.category.as_deref())
        .bind(filter.offset())
        .bind(filter.page_size())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductDetail::from).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Get a product with its category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product_detail(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductDetailRow>(&format!("{DETAIL_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(ProductDetail::from))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category does not exist.
    pub async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO product (name, description, price, stock, category_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.description.as_deref())
        .bind(new.price)
        .bind(new.stock)
        .bind(new.category_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "invalid category"))
    }

    /// Apply a partial update. Returns `None` if the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new category does not exist.
    pub async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE product SET
                 name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 price = COALESCE($4, price),
                 stock = COALESCE($5, stock),
                 category_id = COALESCE($6, category_id)
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.price)
        .bind(update.stock)
        .bind(update.category_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "invalid category"))
    }

    /// Delete a product. Cart lines for it cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an order item references it.
    pub async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "product is referenced by orders"))?;
        Ok(result.rows_affected() > 0)
    }
}
