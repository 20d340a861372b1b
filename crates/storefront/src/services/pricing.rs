//! Authoritative pricing of cart lines.
//!
//! Prices always come from the catalog at the time of the call; whatever the
//! cart displayed earlier is ignored.

use thiserror::Error;
use tracing::instrument;

use eglys_core::ProductId;

use crate::db::{CatalogReader, RepositoryError};
use crate::models::{LineItem, PricedLine, PricedOrder};

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error)]
pub enum PricingError {
    /// A line references a product that is no longer in the catalog.
    #[error("product {0} is not in the catalog")]
    ProductNotFound(ProductId),

    /// A subtotal or the total does not fit the decimal range.
    #[error("amount overflow")]
    Overflow,

    /// The catalog could not be read.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Prices lines against a catalog.
pub struct PricingResolver<'a> {
    catalog: &'a dyn CatalogReader,
}

impl<'a> PricingResolver<'a> {
    #[must_use]
    pub const fn new(catalog: &'a dyn CatalogReader) -> Self {
        Self { catalog }
    }

    /// Price every line at the current catalog price.
    ///
    /// Lines keep their input order.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::ProductNotFound` for the first line whose product
    /// is missing, `PricingError::Overflow` if any amount overflows.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn price(&self, lines: &[LineItem]) -> Result<PricedOrder, PricingError> {
        let mut priced = Vec::with_capacity(lines.len());

        for item in lines {
            let product = self
                .catalog
                .get_product(item.product_id)
                .await?
                .ok_or(PricingError::ProductNotFound(item.product_id))?;

            let line = PricedLine::new(item.product_id, item.quantity, product.price)
                .ok_or(PricingError::Overflow)?;
            priced.push(line);
        }

        PricedOrder::from_lines(priced).ok_or(PricingError::Overflow)
    }
}
