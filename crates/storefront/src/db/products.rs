//! Read-only catalog access.
//!
//! The catalog's write paths (creation, featuring, image upload) belong to a
//! separate service; the storefront only resolves cart lines against it.

use rust_decimal::Decimal;
use sqlx::PgPool;

use mango_stand_core::{CurrencyCode, Price, ProductId};

use super::RepositoryError;
use crate::models::product::Product;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    image: String,
    category: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: Price::new(row.price, CurrencyCode::USD),
            image: row.image,
            category: row.category,
        }
    }
}

/// Narrow read interface over the product catalog.
pub struct ProductCatalog<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductCatalog<'a> {
    /// Create a new catalog reader.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the products matching the given IDs.
    ///
    /// IDs with no matching product are simply absent from the result;
    /// callers decide whether that matters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, price, image, category \
             FROM product WHERE id = ANY($1)",
        )
        .bind(&raw_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}
