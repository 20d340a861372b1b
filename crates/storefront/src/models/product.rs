//! Catalog product.

use serde::Serialize;

use eglys_core::{Money, ProductCategory, ProductId};

/// A catalog product.
///
/// Read-only from the storefront's point of view; the catalog is seeded by
/// migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Catalog category.
    pub category: ProductCategory,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Relative image path (e.g. `img/frutas.jpg`).
    pub image: Option<String>,
    /// Current unit price.
    pub price: Money,
}
