//! Store traits implemented by the `PostgreSQL` repositories and the
//! in-memory store.

use async_trait::async_trait;

use eglys_core::{Email, OrderId, ProductCategory, ProductId, Quantity, UserId};

use super::RepositoryError;
use crate::models::{
    CartLine, CartLineView, LineItem, NewUser, Order, OrderDetail, PricedOrder, Product, User,
};

/// Read-only access to the product catalog.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Get a product by ID.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// List products ordered by ID, optionally restricted to one category.
    async fn list_products(
        &self,
        category: Option<ProductCategory>,
    ) -> Result<Vec<Product>, RepositoryError>;
}

/// Per-user cart lines.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Add `quantity` of a product, merging into an existing line.
    ///
    /// Returns the line as stored after the merge.
    async fn add_line(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<CartLine, RepositoryError>;

    /// Get the user's lines joined with current catalog data.
    ///
    /// Lines whose product left the catalog are included with empty display
    /// fields.
    async fn get_lines(&self, user: UserId) -> Result<Vec<CartLineView>, RepositoryError>;

    /// Delete one line. Returns `false` if there was nothing to delete.
    async fn remove_line(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError>;

    /// Delete every line of the user. Returns the number of lines deleted.
    async fn clear(&self, user: UserId) -> Result<u64, RepositoryError>;

    /// Remove exactly the quantities of a previously read snapshot, on
    /// behalf of `order`.
    ///
    /// Only lines whose identity still matches the snapshot are touched: a
    /// line that grew since keeps the difference, and a line removed and
    /// added again is left alone. A line already consumed by `order` is
    /// skipped, so repeating the call is harmless. Applied atomically.
    async fn consume(
        &self,
        user: UserId,
        order: OrderId,
        snapshot: &[LineItem],
    ) -> Result<(), RepositoryError>;
}

/// Append-only store of orders.
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Record an order and all its lines atomically.
    async fn create_order(
        &self,
        user: UserId,
        priced: &PricedOrder,
    ) -> Result<OrderId, RepositoryError>;

    /// All orders of a user, newest first.
    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// One order with its lines, if it belongs to the user.
    async fn get_order(
        &self,
        user: UserId,
        order: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError>;
}

/// Registered customers.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Get a user by ID.
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Get a user and their password hash by email.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}
