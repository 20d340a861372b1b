//! Type-safe currency amounts using decimal arithmetic.
//!
//! All prices, subtotals and totals flow through [`Money`]. The catalog is
//! priced in a single currency, so no currency code is carried. Arithmetic is
//! checked: callers decide what an overflow means instead of panicking.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Quantity;

/// A non-floating-point currency amount.
///
/// Serialized as a decimal string (e.g. `"30000"`) so no precision is lost on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply a unit price by a quantity.
    ///
    /// Returns `None` on decimal overflow.
    #[must_use]
    pub fn checked_mul_quantity(self, quantity: Quantity) -> Option<Self> {
        self.0
            .checked_mul(Decimal::from(quantity.get()))
            .map(Self)
    }

    /// Add two amounts.
    ///
    /// Returns `None` on decimal overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Sum an iterator of amounts, returning `None` on overflow.
    pub fn checked_sum<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Format for display (e.g., "$30000" or "$12.5").
    #[must_use]
    pub fn display(&self) -> String {
        format!("${}", self.0.normalize())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn qty(n: i32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_mul_quantity_is_exact() {
        let unit = Money::new(Decimal::new(1999, 2));
        let subtotal = unit.checked_mul_quantity(qty(3)).unwrap();
        assert_eq!(subtotal.amount(), Decimal::new(5997, 2));
    }

    #[test]
    fn test_sum_has_no_drift() {
        // 0.1 added ten times is exactly 1 in decimal arithmetic
        let dime = Money::new(Decimal::new(1, 1));
        let total = Money::checked_sum(std::iter::repeat_n(dime, 10)).unwrap();
        assert_eq!(total, Money::from_units(1));
    }

    #[test]
    fn test_checked_add_overflow() {
        let max = Money::new(Decimal::MAX);
        assert!(max.checked_add(Money::from_units(1)).is_none());
        assert!(max.checked_mul_quantity(qty(2)).is_none());
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        let amounts: Vec<Money> = Vec::new();
        assert_eq!(Money::checked_sum(amounts), Some(Money::ZERO));
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Money::from_units(60000)).unwrap();
        assert_eq!(json, "\"60000\"");
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_units(30000).display(), "$30000");
        assert_eq!(Money::new(Decimal::new(1250, 2)).display(), "$12.5");
    }
}
