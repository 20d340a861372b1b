//! Order domain types.
//!
//! Orders are append-only. The priced types below are the only way to hand
//! data to the ledger, and they can only be built with subtotals and totals
//! computed from their parts, so the stored amounts always add up.

use chrono::{DateTime, Utc};
use serde::Serialize;

use eglys_core::{Money, OrderId, OrderStatus, ProductId, Quantity, UserId};

/// A recorded order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A recorded order line with its price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub order_id: OrderId,
    pub product_id: ProductId,
    #[serde(rename = "qty")]
    pub quantity: Quantity,
    /// Unit price at the time the order was created.
    #[serde(rename = "unitPriceSnapshot")]
    pub unit_price: Money,
    pub subtotal: Money,
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// A cart line priced against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    product_id: ProductId,
    quantity: Quantity,
    unit_price: Money,
    subtotal: Money,
}

impl PricedLine {
    /// Price a line; the subtotal is `unit_price * quantity`.
    ///
    /// Returns `None` on decimal overflow.
    #[must_use]
    pub fn new(product_id: ProductId, quantity: Quantity, unit_price: Money) -> Option<Self> {
        let subtotal = unit_price.checked_mul_quantity(quantity)?;
        Some(Self {
            product_id,
            quantity,
            unit_price,
            subtotal,
        })
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    #[must_use]
    pub const fn unit_price(&self) -> Money {
        self.unit_price
    }

    #[must_use]
    pub const fn subtotal(&self) -> Money {
        self.subtotal
    }
}

/// A fully priced cart, ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    lines: Vec<PricedLine>,
    total: Money,
}

impl PricedOrder {
    /// Build a priced order whose total is the sum of the line subtotals.
    ///
    /// Returns `None` on decimal overflow.
    #[must_use]
    pub fn from_lines(lines: Vec<PricedLine>) -> Option<Self> {
        let total = Money::checked_sum(lines.iter().map(PricedLine::subtotal))?;
        Some(Self { lines, total })
    }

    #[must_use]
    pub fn lines(&self) -> &[PricedLine] {
        &self.lines
    }

    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }
}
