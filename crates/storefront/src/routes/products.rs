//! Product route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use eglys_core::{ProductCategory, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::ValidatedPath;
use crate::models::Product;
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// `cake` or `event` (Spanish aliases accepted).
    pub category: Option<String>,
}

/// List the catalog, optionally restricted to one category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| c.to_lowercase().parse::<ProductCategory>())
        .transpose()
        .map_err(AppError::InvalidRequest)?;

    let products = state.backend().catalog().list_products(category).await?;
    Ok(Json(products))
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<ProductId>,
) -> Result<Json<Product>> {
    state
        .backend()
        .catalog()
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
