//! Catalog seeding from YAML.
//!
//! # Usage
//!
//! ```bash
//! stockroom catalog seed catalog.yaml
//! ```
//!
//! # File Format
//!
//! ```yaml
//! categories:
//!   - name: Lighting
//!     products:
//!       - name: Desk lamp
//!         description: Brass, adjustable arm
//!         price: "49.00"
//!         stock: 12
//! ```
//!
//! Categories that already exist are reused; products are always created.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use stockroom_api::db::{CatalogStore, Store};
use stockroom_api::models::NewProduct;
use stockroom_core::Price;

use super::{CommandError, connect};

/// Top level of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub categories: Vec<SeedCategory>,
}

/// A category and the products to create in it.
#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// One product to create.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    pub stock: i32,
}

/// What a seed run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub categories_reused: usize,
    pub products_created: usize,
}

/// Parse and check a seed file before anything touches the database.
///
/// # Errors
///
/// Returns `CommandError::Yaml` for malformed YAML, or
/// `CommandError::InvalidSeed` listing every problem found.
pub fn parse(content: &str) -> Result<SeedFile, CommandError> {
    let file: SeedFile = serde_yaml::from_str(content)?;

    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    for category in &file.categories {
        let name = category.name.trim();
        if name.is_empty() {
            problems.push("category with empty name".to_owned());
        } else if !seen.insert(name) {
            problems.push(format!("category {name} listed twice"));
        }
        for product in &category.products {
            if product.name.trim().is_empty() {
                problems.push(format!("product with empty name in {name}"));
            }
            if product.stock < 0 {
                problems.push(format!("{}: stock cannot be negative", product.name));
            }
        }
    }

    if problems.is_empty() {
        Ok(file)
    } else {
        Err(CommandError::InvalidSeed(problems.join("; ")))
    }
}

/// Create the categories and products of `file` in `store`.
///
/// # Errors
///
/// Returns `CommandError` on the first store failure. Work done before the
/// failure is kept.
pub async fn seed_store(store: &dyn Store, file: &SeedFile) -> Result<SeedSummary, CommandError> {
    let mut summary = SeedSummary::default();
    let existing = store.list_categories().await?;

    for seed in &file.categories {
        let name = seed.name.trim();
        let category = if let Some(found) = existing.iter().find(|c| c.name == name) {
            summary.categories_reused += 1;
            found.clone()
        } else {
            summary.categories_created += 1;
            store.create_category(name).await?
        };

        for product in &seed.products {
            let created = store
                .create_product(&NewProduct {
                    name: product.name.trim().to_owned(),
                    description: product.description.clone(),
                    price: product.price,
                    stock: product.stock,
                    category_id: category.id,
                })
                .await?;
            tracing::debug!(product_id = %created.id, category = %category.name, "Product seeded");
            summary.products_created += 1;
        }
    }

    Ok(summary)
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns `CommandError` if the file cannot be read or parsed, or the
/// database fails.
pub async fn seed(path: &Path) -> Result<SeedSummary, CommandError> {
    tracing::info!(path = %path.display(), "Loading catalog seed");
    let content = tokio::fs::read_to_string(path).await?;
    let file = parse(&content)?;

    let store = connect().await?;
    let summary = seed_store(&store, &file).await?;

    tracing::info!(
        categories_created = summary.categories_created,
        categories_reused = summary.categories_reused,
        products_created = summary.products_created,
        "Catalog seeded"
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use stockroom_api::db::MemoryStore;
    use stockroom_api::models::ProductFilter;

    use super::*;

    const SEED: &str = r#"
categories:
  - name: Lighting
    products:
      - name: Desk lamp
        description: Brass
        price: "49.00"
        stock: 12
      - name: Bulb
        price: "3.50"
        stock: 200
  - name: Paper
"#;

    #[test]
    fn test_parse_valid_file() {
        let file = parse(SEED).unwrap();
        assert_eq!(file.categories.len(), 2);
        let lamp = file.categories.first().unwrap().products.first().unwrap();
        assert_eq!(lamp.price.amount(), dec!(49.00));
        assert!(file.categories.get(1).unwrap().products.is_empty());
    }

    #[test]
    fn test_parse_reports_every_problem() {
        let bad = r#"
categories:
  - name: Lighting
    products:
      - name: Lamp
        price: "1.00"
        stock: -1
  - name: Lighting
"#;
        let CommandError::InvalidSeed(msg) = parse(bad).unwrap_err() else {
            panic!("expected InvalidSeed");
        };
        assert!(msg.contains("stock cannot be negative"));
        assert!(msg.contains("listed twice"));
    }

    #[test]
    fn test_parse_rejects_negative_price() {
        let bad = r#"
categories:
  - name: Lighting
    products:
      - name: Lamp
        price: "-1.00"
        stock: 1
"#;
        assert!(matches!(parse(bad), Err(CommandError::Yaml(_))));
    }

    #[tokio::test]
    async fn test_seed_reuses_existing_categories() {
        let store = MemoryStore::new();
        store.create_category("Lighting").await.unwrap();

        let summary = seed_store(&store, &parse(SEED).unwrap()).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                categories_created: 1,
                categories_reused: 1,
                products_created: 2,
            }
        );

        let lighting = store
            .list_products(&ProductFilter {
                category: Some("Lighting".to_owned()),
                ..ProductFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(lighting.len(), 2);
    }
}
