//! Checkout error types.

use thiserror::Error;

use eglys_core::ProductId;

use crate::db::RepositoryError;
use crate::services::pricing::PricingError;

/// Why a checkout did not record an order.
///
/// Every variant means no order was written and the cart is as it was.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line references a product that left the catalog.
    #[error("product {0} is no longer available")]
    ProductNotFound(ProductId),

    /// A subtotal or the total does not fit the decimal range.
    #[error("order amount is out of range")]
    AmountOverflow,

    /// The order could not be recorded.
    #[error("order could not be recorded: {0}")]
    LedgerWriteFailed(#[source] RepositoryError),

    /// The cart, catalog or lock could not be read.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] RepositoryError),
}

impl CheckoutError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyCart => "empty_cart",
            Self::ProductNotFound(_) => "product_not_found",
            Self::AmountOverflow => "amount_overflow",
            Self::LedgerWriteFailed(_) => "ledger_write_failed",
            Self::StorageUnavailable(_) => "storage_unavailable",
        }
    }

    /// Whether the same request may succeed if simply retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LedgerWriteFailed(_) | Self::StorageUnavailable(_)
        )
    }
}

impl From<PricingError> for CheckoutError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::ProductNotFound(id) => Self::ProductNotFound(id),
            PricingError::Overflow => Self::AmountOverflow,
            PricingError::Repository(e) => Self::StorageUnavailable(e),
        }
    }
}
