//! Catalog repository.

use async_trait::async_trait;
use sqlx::PgPool;

use eglys_core::{ProductCategory, ProductId};

use super::{CatalogReader, RepositoryError};
use crate::models::Product;

/// `PostgreSQL` catalog reader.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Create a new catalog reader.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogReader for PgCatalog {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, category, name, description, image, price
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn list_products(
        &self,
        category: Option<ProductCategory>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, category, name, description, image, price
            FROM storefront.product
            WHERE $1::TEXT IS NULL OR category = $1
            ORDER BY id ASC
            ",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}
