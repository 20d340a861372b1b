//! Cart-to-order conversion.
//!
//! `confirm_order` runs four steps inside a per-user scope:
//!
//! 1. read the cart lines (the snapshot)
//! 2. price the snapshot against the catalog
//! 3. record the order and its lines atomically
//! 4. consume the snapshot from the cart
//!
//! A failure in steps 1-3 aborts with nothing written. Once step 3 commits,
//! the order stands: a failing step 4 is retried, then reported, but the
//! checkout still succeeds.

mod error;
pub mod retry;

pub use error::CheckoutError;
pub use retry::RetryPolicy;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{Span, instrument};

use eglys_core::{Money, OrderId, UserId};

use crate::config::CheckoutConfig;
use crate::db::{Backend, RepositoryError};
use crate::models::{CartLineView, LineItem};
use crate::services::pricing::PricingResolver;
use retry::retry_with_backoff;

/// Progress of one checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    LinesRead,
    Priced,
    Recorded,
    CartCleared,
    Aborted,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LinesRead => "lines_read",
            Self::Priced => "priced",
            Self::Recorded => "recorded",
            Self::CartCleared => "cart_cleared",
            Self::Aborted => "aborted",
        }
    }
}

fn enter(stage: Stage) {
    Span::current().record("stage", stage.as_str());
    tracing::debug!(stage = stage.as_str(), "Checkout stage");
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub total: Money,
    /// `false` when the order was recorded but the cart could not be cleaned up.
    pub cart_cleared: bool,
}

/// Converts carts into orders.
#[derive(Clone)]
pub struct CheckoutService {
    backend: Backend,
    retry: RetryPolicy,
    permits: Arc<Semaphore>,
}

impl CheckoutService {
    #[must_use]
    pub fn new(backend: Backend, config: &CheckoutConfig) -> Self {
        Self {
            backend,
            retry: RetryPolicy::new(config.clear_attempts, config.clear_backoff),
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        }
    }

    /// Convert the user's cart into a confirmed order.
    ///
    /// Two calls for the same user never interleave; the second one sees
    /// the cart as the first one left it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if no order was recorded. In that case neither
    /// the ledger nor the cart changed.
    #[instrument(
        skip(self, user),
        fields(user_id = %user, stage = Stage::Idle.as_str(), order_id = tracing::field::Empty)
    )]
    pub async fn confirm_order(&self, user: UserId) -> Result<CheckoutReceipt, CheckoutError> {
        let _permit = self.permits.acquire().await.map_err(|_| {
            CheckoutError::StorageUnavailable(RepositoryError::Unavailable(
                "checkout is shutting down".to_owned(),
            ))
        })?;

        let scope = match self.backend.locks().acquire(user).await {
            Ok(scope) => scope,
            Err(err) => {
                enter(Stage::Aborted);
                return Err(CheckoutError::StorageUnavailable(err));
            }
        };

        let result = self.run(user).await;

        if let Err(err) = scope.release().await {
            tracing::warn!(error = %err, "Failed to release checkout scope");
        }

        if let Err(err) = &result {
            enter(Stage::Aborted);
            tracing::info!(code = err.code(), error = %err, "Checkout aborted");
        }

        result
    }

    async fn run(&self, user: UserId) -> Result<CheckoutReceipt, CheckoutError> {
        let lines = self
            .backend
            .carts()
            .get_lines(user)
            .await
            .map_err(CheckoutError::StorageUnavailable)?;
        enter(Stage::LinesRead);

        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let snapshot: Vec<LineItem> = lines.iter().map(CartLineView::item).collect();

        let priced = PricingResolver::new(self.backend.catalog().as_ref())
            .price(&snapshot)
            .await?;
        enter(Stage::Priced);

        let order_id = self
            .backend
            .orders()
            .create_order(user, &priced)
            .await
            .map_err(CheckoutError::LedgerWriteFailed)?;
        enter(Stage::Recorded);
        Span::current().record("order_id", order_id.as_i32());
        tracing::info!(%order_id, total = %priced.total(), "Order recorded");

        let cart_cleared = self.consume_snapshot(user, order_id, &snapshot).await;
        if cart_cleared {
            enter(Stage::CartCleared);
        }

        Ok(CheckoutReceipt {
            order_id,
            total: priced.total(),
            cart_cleared,
        })
    }

    /// Remove the ordered lines from the cart. Returns `false` if every
    /// attempt failed.
    async fn consume_snapshot(&self, user: UserId, order_id: OrderId, snapshot: &[LineItem]) -> bool {
        let carts = self.backend.carts();

        match retry_with_backoff(self.retry, |_| carts.consume(user, order_id, snapshot)).await {
            Ok(()) => true,
            Err(err) => {
                let event_id = sentry::capture_error(&err);
                tracing::error!(
                    %order_id,
                    error = %err,
                    sentry_event_id = %event_id,
                    "Order recorded but cart cleanup failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use eglys_core::{ProductId, Quantity};

    use super::*;
    use crate::db::{CartStore, CatalogReader, MemoryStore, OrderLedger};
    use crate::models::{CartLine, Order, OrderDetail, PricedOrder};

    const USER: UserId = UserId::new(1);

    fn config() -> CheckoutConfig {
        CheckoutConfig {
            clear_attempts: 3,
            clear_backoff: Duration::from_millis(1),
            max_concurrent: 4,
        }
    }

    fn qty(n: i32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn service(store: &Arc<MemoryStore>) -> CheckoutService {
        CheckoutService::new(Backend::in_memory(Arc::clone(store)), &config())
    }

    async fn cart_of(store: &MemoryStore, user: UserId) -> Vec<(i32, i32)> {
        store
            .get_lines(user)
            .await
            .unwrap()
            .iter()
            .map(|l| (l.product_id.as_i32(), l.quantity.get()))
            .collect()
    }

    struct FailingLedger;

    #[async_trait]
    impl OrderLedger for FailingLedger {
        async fn create_order(
            &self,
            _user: UserId,
            _priced: &PricedOrder,
        ) -> Result<OrderId, RepositoryError> {
            Err(RepositoryError::Unavailable("pool timed out".to_owned()))
        }

        async fn list_orders(&self, _user: UserId) -> Result<Vec<Order>, RepositoryError> {
            Ok(Vec::new())
        }

        async fn get_order(
            &self,
            _user: UserId,
            _order: OrderId,
        ) -> Result<Option<OrderDetail>, RepositoryError> {
            Ok(None)
        }
    }

    /// Delegates to the memory store, but every `consume` fails.
    struct StuckCarts {
        store: Arc<MemoryStore>,
        consume_calls: AtomicU32,
    }

    #[async_trait]
    impl CartStore for StuckCarts {
        async fn add_line(
            &self,
            user: UserId,
            product: ProductId,
            quantity: Quantity,
        ) -> Result<CartLine, RepositoryError> {
            self.store.add_line(user, product, quantity).await
        }

        async fn get_lines(&self, user: UserId) -> Result<Vec<CartLineView>, RepositoryError> {
            self.store.get_lines(user).await
        }

        async fn remove_line(
            &self,
            user: UserId,
            product: ProductId,
        ) -> Result<bool, RepositoryError> {
            self.store.remove_line(user, product).await
        }

        async fn clear(&self, user: UserId) -> Result<u64, RepositoryError> {
            self.store.clear(user).await
        }

        async fn consume(
            &self,
            _user: UserId,
            _order: OrderId,
            _snapshot: &[LineItem],
        ) -> Result<(), RepositoryError> {
            self.consume_calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Unavailable("connection reset".to_owned()))
        }
    }

    #[tokio::test]
    async fn test_confirm_order_records_priced_order_and_clears_cart() {
        let store = Arc::new(MemoryStore::with_default_catalog());
        store.add_line(USER, ProductId::new(1), qty(2)).await.unwrap();

        let receipt = service(&store).confirm_order(USER).await.unwrap();

        assert_eq!(receipt.total, Money::from_units(60_000));
        assert!(receipt.cart_cleared);
        assert!(cart_of(&store, USER).await.is_empty());

        let detail = store.get_order(USER, receipt.order_id).await.unwrap().unwrap();
        assert_eq!(detail.order.total, Money::from_units(60_000));
        assert_eq!(detail.lines.len(), 1);
        let line = &detail.lines[0];
        assert_eq!(line.product_id, ProductId::new(1));
        assert_eq!(line.quantity.get(), 2);
        assert_eq!(line.unit_price, Money::from_units(30_000));
        assert_eq!(line.subtotal, Money::from_units(60_000));
    }

    #[tokio::test]
    async fn test_total_is_sum_of_subtotals() {
        let store = Arc::new(MemoryStore::with_default_catalog());
        store.add_line(USER, ProductId::new(2), qty(3)).await.unwrap();
        store.add_line(USER, ProductId::new(6), qty(1)).await.unwrap();

        let receipt = service(&store).confirm_order(USER).await.unwrap();
        let detail = store.get_order(USER, receipt.order_id).await.unwrap().unwrap();

        let sum = Money::checked_sum(detail.lines.iter().map(|l| l.subtotal)).unwrap();
        assert_eq!(detail.order.total, sum);
        assert_eq!(receipt.total, Money::from_units(290_000));
    }

    #[tokio::test]
    async fn test_empty_cart_writes_nothing() {
        let store = Arc::new(MemoryStore::with_default_catalog());

        let result = service(&store).confirm_order(USER).await;

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(store.order_count().await, 0);
        assert!(cart_of(&store, USER).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_product_leaves_cart_intact() {
        let store = Arc::new(MemoryStore::with_default_catalog());
        store.add_line(USER, ProductId::new(1), qty(1)).await.unwrap();
        store.add_line(USER, ProductId::new(99), qty(2)).await.unwrap();

        let result = service(&store).confirm_order(USER).await;

        assert!(matches!(
            result,
            Err(CheckoutError::ProductNotFound(id)) if id == ProductId::new(99)
        ));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(cart_of(&store, USER).await, vec![(1, 1), (99, 2)]);
    }

    #[tokio::test]
    async fn test_ledger_failure_writes_nothing_and_keeps_cart() {
        let store = Arc::new(MemoryStore::with_default_catalog());
        store.add_line(USER, ProductId::new(1), qty(2)).await.unwrap();
        store.add_line(USER, ProductId::new(4), qty(1)).await.unwrap();
        let before = cart_of(&store, USER).await;

        let backend = Backend::in_memory(Arc::clone(&store)).with_orders(Arc::new(FailingLedger));
        let result = CheckoutService::new(backend, &config()).confirm_order(USER).await;

        let err = result.unwrap_err();
        assert!(matches!(err, CheckoutError::LedgerWriteFailed(_)));
        assert!(err.is_retryable());
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.order_line_count().await, 0);
        assert_eq!(cart_of(&store, USER).await, before);
    }

    #[tokio::test]
    async fn test_cleanup_failure_still_succeeds() {
        let store = Arc::new(MemoryStore::with_default_catalog());
        store.add_line(USER, ProductId::new(3), qty(1)).await.unwrap();
        let carts = Arc::new(StuckCarts {
            store: Arc::clone(&store),
            consume_calls: AtomicU32::new(0),
        });

        let backend = Backend::in_memory(Arc::clone(&store)).with_carts(carts.clone());
        let receipt = CheckoutService::new(backend, &config())
            .confirm_order(USER)
            .await
            .unwrap();

        assert!(!receipt.cart_cleared);
        assert_eq!(receipt.total, Money::from_units(30_000));
        assert_eq!(carts.consume_calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.order_count().await, 1);
        assert_eq!(cart_of(&store, USER).await, vec![(3, 1)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_double_submit_records_one_order() {
        let store = Arc::new(MemoryStore::with_default_catalog());
        store.add_line(USER, ProductId::new(1), qty(1)).await.unwrap();
        let checkout = service(&store);

        let first = tokio::spawn({
            let checkout = checkout.clone();
            async move { checkout.confirm_order(USER).await }
        });
        let second = tokio::spawn({
            let checkout = checkout.clone();
            async move { checkout.confirm_order(USER).await }
        });
        let results = [first.await.unwrap(), second.await.unwrap()];

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let empty = results
            .iter()
            .filter(|r| matches!(r, Err(CheckoutError::EmptyCart)))
            .count();
        assert_eq!(succeeded, 1);
        assert_eq!(empty, 1);
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_later_price_change_does_not_touch_recorded_order() {
        let store = Arc::new(MemoryStore::with_default_catalog());
        store.add_line(USER, ProductId::new(1), qty(2)).await.unwrap();
        let receipt = service(&store).confirm_order(USER).await.unwrap();

        let mut product = store.get_product(ProductId::new(1)).await.unwrap().unwrap();
        product.price = Money::from_units(45_000);
        store.put_product(product).await;

        let detail = store.get_order(USER, receipt.order_id).await.unwrap().unwrap();
        assert_eq!(detail.lines[0].unit_price, Money::from_units(30_000));
        assert_eq!(detail.order.total, Money::from_units(60_000));
    }

    #[tokio::test]
    async fn test_other_users_are_unaffected() {
        let store = Arc::new(MemoryStore::with_default_catalog());
        let other = UserId::new(2);
        store.add_line(USER, ProductId::new(1), qty(1)).await.unwrap();
        store.add_line(other, ProductId::new(5), qty(1)).await.unwrap();

        service(&store).confirm_order(USER).await.unwrap();

        assert_eq!(cart_of(&store, other).await, vec![(5, 1)]);
        assert!(store.list_orders(other).await.unwrap().is_empty());
    }
}
