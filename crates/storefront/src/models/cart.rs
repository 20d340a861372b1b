//! Cart domain types.

use serde::Serialize;

use eglys_core::{Money, ProductId, Quantity, UserId};

/// Identity of a cart line.
///
/// Assigned when a line is created and kept when quantities merge into it.
/// Removing a product and adding it again yields a new identity, so a
/// checkout snapshot never matches a line created after it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct CartLineId(i64);

impl CartLineId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

/// One cart line as seen by a checkout snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineItem {
    pub line_id: CartLineId,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// A persisted cart line, keyed by (user, product).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(skip)]
    pub line_id: CartLineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    #[serde(rename = "qty")]
    pub quantity: Quantity,
}

/// A cart line joined with the current catalog data.
///
/// The display fields are `None` when the product has left the catalog. The
/// price shown here is informational only; checkout re-prices every line.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CartLineView {
    pub line_id: CartLineId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub name: Option<String>,
    pub image: Option<String>,
    pub unit_price: Option<Money>,
}

impl CartLineView {
    /// The (product, quantity) pair of this line.
    #[must_use]
    pub const fn item(&self) -> LineItem {
        LineItem {
            line_id: self.line_id,
            product_id: self.product_id,
            quantity: self.quantity,
        }
    }

    /// Whether the product is still in the catalog.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.unit_price.is_some()
    }

    /// Display subtotal at the current catalog price.
    #[must_use]
    pub fn subtotal(&self) -> Option<Money> {
        self.unit_price?.checked_mul_quantity(self.quantity)
    }
}

/// A cart line as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: Option<String>,
    pub image: Option<String>,
    pub qty: Quantity,
    pub unit_price: Option<Money>,
    pub subtotal: Option<Money>,
    pub available: bool,
}

impl From<&CartLineView> for CartItemView {
    fn from(line: &CartLineView) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name.clone(),
            image: line.image.clone(),
            qty: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal(),
            available: line.is_available(),
        }
    }
}

/// Whole-cart display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    /// Sum of the available lines at current prices; `None` if it does not
    /// fit a decimal.
    pub total: Option<Money>,
    pub item_count: i64,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: Some(Money::ZERO),
            item_count: 0,
        }
    }
}

impl From<&[CartLineView]> for CartView {
    fn from(lines: &[CartLineView]) -> Self {
        let items: Vec<CartItemView> = lines.iter().map(CartItemView::from).collect();
        let subtotals: Option<Vec<Money>> = lines
            .iter()
            .filter(|line| line.is_available())
            .map(CartLineView::subtotal)
            .collect();
        let total = subtotals.and_then(Money::checked_sum);
        let item_count = lines.iter().map(|l| i64::from(l.quantity.get())).sum();

        Self {
            items,
            total,
            item_count,
        }
    }
}
