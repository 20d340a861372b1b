//! Storage for the storefront.
//!
//! # Database: `eglys`
//!
//! ## Tables (schema `storefront`)
//!
//! - `user` - Registered customers and their argon2 credential
//! - `product` - Read-only catalog, seeded by migration
//! - `cart_line` - Per-user cart, one row per (user, product)
//! - `customer_order` - Append-only orders
//! - `order_line` - Append-only order lines with price snapshots
//!
//! Every store is a trait (see [`store`]) with a `PostgreSQL` implementation
//! and an in-memory one ([`memory::MemoryStore`]). [`Backend`] bundles one of
//! each for the application state.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p eglys-cli -- migrate
//! ```

pub mod carts;
pub mod catalog;
pub mod locks;
pub mod memory;
pub mod orders;
pub mod store;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use locks::{LocalUserLocks, PgUserLocks, UserLocks, UserScope};
pub use memory::MemoryStore;
pub use store::{CartStore, CatalogReader, OrderLedger, UserStore};

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Storage could not be reached (pool timeout, I/O failure).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// `PostgreSQL` SQLSTATE for `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
                Self::Unavailable(err.to_string())
            }
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) => Self::Unavailable(err.to_string()),
            sqlx::Error::Database(ref db_err)
                if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation()
                    || db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) =>
            {
                Self::Conflict(db_err.message().to_owned())
            }
            other => Self::Database(other),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// One implementation of every store, plus the per-user lock provider.
#[derive(Clone)]
pub struct Backend {
    catalog: Arc<dyn CatalogReader>,
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderLedger>,
    users: Arc<dyn UserStore>,
    locks: Arc<dyn UserLocks>,
    pool: Option<PgPool>,
}

impl Backend {
    /// Backend over a `PostgreSQL` pool, with advisory-lock user scopes.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            catalog: Arc::new(catalog::PgCatalog::new(pool.clone())),
            carts: Arc::new(carts::PgCartStore::new(pool.clone())),
            orders: Arc::new(orders::PgOrderLedger::new(pool.clone())),
            users: Arc::new(users::PgUserStore::new(pool.clone())),
            locks: Arc::new(PgUserLocks::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Backend over a single in-memory store, with in-process user scopes.
    #[must_use]
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            catalog: store.clone(),
            carts: store.clone(),
            orders: store.clone(),
            users: store,
            locks: Arc::new(LocalUserLocks::new()),
            pool: None,
        }
    }

    /// Replace the cart store.
    #[must_use]
    pub fn with_carts(mut self, carts: Arc<dyn CartStore>) -> Self {
        self.carts = carts;
        self
    }

    /// Replace the order ledger.
    #[must_use]
    pub fn with_orders(mut self, orders: Arc<dyn OrderLedger>) -> Self {
        self.orders = orders;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn CatalogReader> {
        &self.catalog
    }

    #[must_use]
    pub fn carts(&self) -> &Arc<dyn CartStore> {
        &self.carts
    }

    #[must_use]
    pub fn orders(&self) -> &Arc<dyn OrderLedger> {
        &self.orders
    }

    #[must_use]
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    #[must_use]
    pub fn locks(&self) -> &Arc<dyn UserLocks> {
        &self.locks
    }

    /// Check that storage is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
