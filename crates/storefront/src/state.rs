//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{CheckoutConfig, StorefrontConfig};
use crate::db::Backend;
use crate::services::checkout::CheckoutService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the storage backend, the checkout service and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    checkout_config: CheckoutConfig,
    backend: Backend,
    checkout: CheckoutService,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: &StorefrontConfig, backend: Backend) -> Self {
        Self::with_checkout_config(config.checkout, backend)
    }

    /// Create a state from checkout settings alone.
    #[must_use]
    pub fn with_checkout_config(checkout_config: CheckoutConfig, backend: Backend) -> Self {
        let checkout = CheckoutService::new(backend.clone(), &checkout_config);

        Self {
            inner: Arc::new(AppStateInner {
                checkout_config,
                backend,
                checkout,
            }),
        }
    }

    /// Get the checkout settings.
    #[must_use]
    pub fn checkout_config(&self) -> &CheckoutConfig {
        &self.inner.checkout_config
    }

    /// Get the storage backend.
    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    /// Get the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}
