//! In-memory implementation of every store.
//!
//! Used by tests and by local runs without `EGLYS_DATABASE_URL`. All state
//! sits behind one async mutex, so every operation is atomic with respect to
//! every other, which gives the same all-or-nothing behavior as the
//! `PostgreSQL` transactions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use eglys_core::{
    Email, Money, OrderId, OrderStatus, ProductCategory, ProductId, Quantity, UserId,
};

use super::{CartStore, CatalogReader, OrderLedger, RepositoryError, UserStore};
use crate::models::{
    CartLine, CartLineId, CartLineView, LineItem, NewUser, Order, OrderDetail, OrderLine, PricedOrder,
    Product, User,
};

#[derive(Default)]
struct Inner {
    products: BTreeMap<ProductId, Product>,
    /// Lines per user, in insertion order.
    carts: BTreeMap<UserId, Vec<StoredLine>>,
    orders: Vec<Order>,
    order_lines: Vec<OrderLine>,
    users: Vec<(User, String)>,
    next_order_id: i32,
    next_user_id: i32,
    next_line_id: i64,
}

struct StoredLine {
    line: CartLine,
    /// Last order that consumed part of this line.
    consumed_by: Option<OrderId>,
}

/// In-memory catalog, carts, ledger and users.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store with an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the shop's standard catalog.
    #[must_use]
    pub fn with_default_catalog() -> Self {
        Self::with_products(default_catalog())
    }

    /// Create a store seeded with the given products.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let inner = Inner {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
            ..Inner::default()
        };
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Insert or replace a catalog product.
    pub async fn put_product(&self, product: Product) {
        self.inner.lock().await.products.insert(product.id, product);
    }

    /// Remove a product from the catalog.
    pub async fn remove_product(&self, id: ProductId) -> Option<Product> {
        self.inner.lock().await.products.remove(&id)
    }

    /// Number of recorded orders across all users.
    pub async fn order_count(&self) -> usize {
        self.inner.lock().await.orders.len()
    }

    /// Number of recorded order lines across all users.
    pub async fn order_line_count(&self) -> usize {
        self.inner.lock().await.order_lines.len()
    }
}

impl Inner {
    fn line_view(&self, line: &CartLine) -> CartLineView {
        let product = self.products.get(&line.product_id);
        CartLineView {
            line_id: line.line_id,
            product_id: line.product_id,
            quantity: line.quantity,
            name: product.map(|p| p.name.clone()),
            image: product.and_then(|p| p.image.clone()),
            unit_price: product.map(|p| p.price),
        }
    }
}

#[async_trait]
impl CatalogReader for MemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.inner.lock().await.products.get(&id).cloned())
    }

    async fn list_products(
        &self,
        category: Option<ProductCategory>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .products
            .values()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn add_line(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<CartLine, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let line_id = CartLineId::new(inner.next_line_id + 1);
        let lines = inner.carts.entry(user).or_default();

        if let Some(stored) = lines.iter_mut().find(|l| l.line.product_id == product) {
            stored.line.quantity = stored
                .line
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| RepositoryError::Conflict("quantity out of range".to_owned()))?;
            return Ok(stored.line);
        }

        let line = CartLine {
            line_id,
            user_id: user,
            product_id: product,
            quantity,
        };
        lines.push(StoredLine {
            line,
            consumed_by: None,
        });
        inner.next_line_id += 1;
        Ok(line)
    }

    async fn get_lines(&self, user: UserId) -> Result<Vec<CartLineView>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .carts
            .get(&user)
            .map(|lines| lines.iter().map(|l| inner.line_view(&l.line)).collect())
            .unwrap_or_default())
    }

    async fn remove_line(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let Some(lines) = inner.carts.get_mut(&user) else {
            return Ok(false);
        };
        let before = lines.len();
        lines.retain(|l| l.line.product_id != product);
        Ok(lines.len() < before)
    }

    async fn clear(&self, user: UserId) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let removed = inner.carts.remove(&user).map_or(0, |lines| lines.len());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    async fn consume(
        &self,
        user: UserId,
        order: OrderId,
        snapshot: &[LineItem],
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        let Some(lines) = inner.carts.get_mut(&user) else {
            return Ok(());
        };

        for item in snapshot {
            let Some(stored) = lines.iter_mut().find(|l| {
                l.line.line_id == item.line_id && l.consumed_by != Some(order)
            }) else {
                continue;
            };
            match stored.line.quantity.checked_sub(item.quantity) {
                Some(rest) => {
                    stored.line.quantity = rest;
                    stored.consumed_by = Some(order);
                }
                None => {
                    let line_id = item.line_id;
                    lines.retain(|l| l.line.line_id != line_id);
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl OrderLedger for MemoryStore {
    async fn create_order(
        &self,
        user: UserId,
        priced: &PricedOrder,
    ) -> Result<OrderId, RepositoryError> {
        let mut inner = self.inner.lock().await;
        inner.next_order_id += 1;
        let id = OrderId::new(inner.next_order_id);

        inner.orders.push(Order {
            id,
            user_id: user,
            total: priced.total(),
            status: OrderStatus::Confirmed,
            created_at: Utc::now(),
        });
        inner
            .order_lines
            .extend(priced.lines().iter().map(|line| OrderLine {
                order_id: id,
                product_id: line.product_id(),
                quantity: line.quantity(),
                unit_price: line.unit_price(),
                subtotal: line.subtotal(),
            }));

        Ok(id)
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let inner = self.inner.lock().await;
        let mut orders: Vec<Order> = inner
            .orders
            .iter()
            .filter(|o| o.user_id == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(orders)
    }

    async fn get_order(
        &self,
        user: UserId,
        order: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let inner = self.inner.lock().await;
        let Some(found) = inner
            .orders
            .iter()
            .find(|o| o.id == order && o.user_id == user)
        else {
            return Ok(None);
        };

        let mut lines: Vec<OrderLine> = inner
            .order_lines
            .iter()
            .filter(|l| l.order_id == order)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.product_id.as_i32());

        Ok(Some(OrderDetail {
            order: found.clone(),
            lines,
        }))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut inner = self.inner.lock().await;
        if inner.users.iter().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        inner.next_user_id += 1;
        let created = User {
            id: UserId::new(inner.next_user_id),
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            email: user.email,
            address: user.address,
            created_at: Utc::now(),
        };
        inner.users.push((created.clone(), user.password_hash));
        Ok(created)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(u, _)| u.clone()))
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|(u, _)| &u.email == email).cloned())
    }
}

/// The shop's standard catalog, identical to the seed migration.
#[must_use]
pub fn default_catalog() -> Vec<Product> {
    let product = |id: i32, category, name: &str, description: &str, image: &str, price: i64| {
        Product {
            id: ProductId::new(id),
            category,
            name: name.to_owned(),
            description: description.to_owned(),
            image: Some(image.to_owned()),
            price: Money::new(Decimal::from(price)),
        }
    };

    vec![
        product(
            1,
            ProductCategory::Cake,
            "Torta frutal",
            "Bizcocho relleno de crema ligera con frutas frescas de temporada.",
            "img/frutas.jpg",
            30_000,
        ),
        product(
            2,
            ProductCategory::Cake,
            "Torta sol amarillo",
            "Bizcocho esponjoso con toque cítrico y glaseado amarillo.",
            "img/amarillo.png",
            30_000,
        ),
        product(
            3,
            ProductCategory::Cake,
            "Torta chocolate",
            "Bizcocho húmedo de chocolate con ganache.",
            "img/chocolate.jpg",
            30_000,
        ),
        product(
            4,
            ProductCategory::Event,
            "Fiesta Rosa",
            "Quinceañeras, baby showers o cumpleaños en tonos rosa.",
            "img/rosa.jpg",
            230_000,
        ),
        product(
            5,
            ProductCategory::Event,
            "Fiesta Matrimonio",
            "Celebración de matrimonio con ambientación elegante.",
            "img/matrimonio.jpeg",
            300_000,
        ),
        product(
            6,
            ProductCategory::Event,
            "Fiesta Dorada",
            "Aniversarios, graduaciones o eventos corporativos en dorado.",
            "img/dorado.jpg",
            200_000,
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn qty(n: i32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    const USER: UserId = UserId::new(1);
    const CAKE: ProductId = ProductId::new(1);
    const PARTY: ProductId = ProductId::new(4);
    const ORDER: OrderId = OrderId::new(7);

    async fn snapshot_of(store: &MemoryStore) -> Vec<LineItem> {
        store
            .get_lines(USER)
            .await
            .unwrap()
            .iter()
            .map(CartLineView::item)
            .collect()
    }

    async fn remaining(store: &MemoryStore) -> Vec<(i32, i32)> {
        store
            .get_lines(USER)
            .await
            .unwrap()
            .iter()
            .map(|l| (l.product_id.as_i32(), l.quantity.get()))
            .collect()
    }

    #[tokio::test]
    async fn test_add_line_merges_quantities() {
        let store = MemoryStore::with_default_catalog();
        store.add_line(USER, CAKE, qty(2)).await.unwrap();
        let line = store.add_line(USER, CAKE, qty(3)).await.unwrap();

        assert_eq!(line.quantity.get(), 5);
        let lines = store.get_lines(USER).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity.get(), 5);
    }

    #[tokio::test]
    async fn test_add_line_overflow_is_conflict() {
        let store = MemoryStore::with_default_catalog();
        store.add_line(USER, CAKE, qty(i32::MAX)).await.unwrap();
        let result = store.add_line(USER, CAKE, qty(1)).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(store.get_lines(USER).await.unwrap()[0].quantity.get(), i32::MAX);
    }

    #[tokio::test]
    async fn test_get_lines_joins_catalog_and_keeps_missing_products() {
        let store = MemoryStore::with_default_catalog();
        store.add_line(USER, CAKE, qty(1)).await.unwrap();
        store.add_line(USER, ProductId::new(99), qty(1)).await.unwrap();

        let lines = store.get_lines(USER).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name.as_deref(), Some("Torta frutal"));
        assert_eq!(lines[0].unit_price, Some(Money::from_units(30_000)));
        assert!(!lines[1].is_available());
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let store = MemoryStore::with_default_catalog();
        let other = UserId::new(2);
        store.add_line(USER, CAKE, qty(1)).await.unwrap();
        store.add_line(other, PARTY, qty(1)).await.unwrap();

        store.clear(USER).await.unwrap();
        assert!(store.get_lines(USER).await.unwrap().is_empty());
        assert_eq!(store.get_lines(other).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_and_clear_are_noops_when_absent() {
        let store = MemoryStore::with_default_catalog();
        assert!(!store.remove_line(USER, CAKE).await.unwrap());
        assert_eq!(store.clear(USER).await.unwrap(), 0);

        store.add_line(USER, CAKE, qty(1)).await.unwrap();
        assert!(store.remove_line(USER, CAKE).await.unwrap());
        assert!(store.get_lines(USER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_consume_keeps_concurrent_additions() {
        let store = MemoryStore::with_default_catalog();
        store.add_line(USER, CAKE, qty(2)).await.unwrap();
        store.add_line(USER, PARTY, qty(1)).await.unwrap();
        let snapshot = snapshot_of(&store).await;

        // Arrives between the snapshot and the consume
        store.add_line(USER, CAKE, qty(3)).await.unwrap();
        store.add_line(USER, ProductId::new(2), qty(1)).await.unwrap();

        store.consume(USER, ORDER, &snapshot).await.unwrap();
        assert_eq!(remaining(&store).await, vec![(1, 3), (2, 1)]);
    }

    #[tokio::test]
    async fn test_consume_leaves_lines_recreated_after_snapshot() {
        let store = MemoryStore::with_default_catalog();
        store.add_line(USER, CAKE, qty(3)).await.unwrap();
        let snapshot = snapshot_of(&store).await;

        store.remove_line(USER, CAKE).await.unwrap();
        store.add_line(USER, CAKE, qty(1)).await.unwrap();

        store.consume(USER, ORDER, &snapshot).await.unwrap();
        assert_eq!(remaining(&store).await, vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_consume_twice_for_same_order_is_noop() {
        let store = MemoryStore::with_default_catalog();
        store.add_line(USER, CAKE, qty(2)).await.unwrap();
        store.add_line(USER, PARTY, qty(1)).await.unwrap();
        let snapshot = snapshot_of(&store).await;
        store.add_line(USER, CAKE, qty(5)).await.unwrap();

        store.consume(USER, ORDER, &snapshot).await.unwrap();
        store.consume(USER, ORDER, &snapshot).await.unwrap();
        assert_eq!(remaining(&store).await, vec![(1, 5)]);

        // A later order may consume from the same line again
        let snapshot = snapshot_of(&store).await;
        store.consume(USER, OrderId::new(8), &snapshot).await.unwrap();
        assert!(remaining(&store).await.is_empty());
    }

    #[tokio::test]
    async fn test_orders_newest_first_and_scoped_to_user() {
        let store = MemoryStore::with_default_catalog();
        let priced = PricedOrder::from_lines(vec![
            crate::models::PricedLine::new(CAKE, qty(1), Money::from_units(30_000)).unwrap(),
        ])
        .unwrap();

        let first = store.create_order(USER, &priced).await.unwrap();
        let second = store.create_order(USER, &priced).await.unwrap();
        store.create_order(UserId::new(2), &priced).await.unwrap();

        let orders = store.list_orders(USER).await.unwrap();
        let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second, first]);

        assert!(store.get_order(UserId::new(2), first).await.unwrap().is_none());
        let detail = store.get_order(USER, first).await.unwrap().unwrap();
        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.order.total, Money::from_units(30_000));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        let new_user = NewUser {
            first_name: "Ana".to_owned(),
            last_name: "Pérez".to_owned(),
            phone: None,
            email: Email::normalized("ana@example.com").unwrap(),
            address: None,
            password_hash: "hash".to_owned(),
        };
        let created = store.create(new_user.clone()).await.unwrap();
        assert!(matches!(
            store.create(new_user).await,
            Err(RepositoryError::Conflict(_))
        ));

        let (user, hash) = store
            .get_password_hash(&created.email)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, created.id);
        assert_eq!(hash, "hash");
    }

    #[test]
    fn test_default_catalog_prices() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 6);
        let cakes = catalog
            .iter()
            .filter(|p| p.category == ProductCategory::Cake)
            .count();
        assert_eq!(cakes, 3);
        assert_eq!(catalog[4].price, Money::from_units(300_000));
    }
}
