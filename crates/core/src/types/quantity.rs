//! Line quantities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The requested quantity does not fit the storage range.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: i32,
    },
}

/// A strictly positive line quantity.
///
/// Stored as `i32` to match the `INTEGER` columns of the cart and order
/// tables. Deserialization rejects zero and negative values; request payloads
/// go through [`Quantity::from_requested`] instead, which applies the
/// "default to one" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// A quantity of one.
    pub const ONE: Self = Self(1);

    /// Create a quantity, returning `None` unless `value >= 1`.
    #[must_use]
    pub const fn new(value: i32) -> Option<Self> {
        if value >= 1 { Some(Self(value)) } else { None }
    }

    /// Interpret a client-requested quantity.
    ///
    /// Missing, zero and negative values become one. Values beyond the
    /// storage range are rejected.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooLarge` if the value exceeds `i32::MAX`.
    pub fn from_requested(requested: Option<i64>) -> Result<Self, QuantityError> {
        match requested {
            None => Ok(Self::ONE),
            Some(value) if value < 1 => Ok(Self::ONE),
            Some(value) => i32::try_from(value)
                .map(Self)
                .map_err(|_| QuantityError::TooLarge { max: i32::MAX }),
        }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Merge two quantities, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtract `other`, returning `None` if nothing would remain.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).and_then(Self::new)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("quantity must be positive, got {value}"))
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_from(raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_non_positive() {
        assert!(Quantity::new(0).is_none());
        assert!(Quantity::new(-3).is_none());
        assert_eq!(Quantity::new(2).unwrap().get(), 2);
    }

    #[test]
    fn test_requested_defaults_to_one() {
        assert_eq!(Quantity::from_requested(None), Ok(Quantity::ONE));
        assert_eq!(Quantity::from_requested(Some(0)), Ok(Quantity::ONE));
        assert_eq!(Quantity::from_requested(Some(-5)), Ok(Quantity::ONE));
        assert_eq!(Quantity::from_requested(Some(4)).unwrap().get(), 4);
    }

    #[test]
    fn test_requested_too_large() {
        let result = Quantity::from_requested(Some(i64::from(i32::MAX) + 1));
        assert!(matches!(result, Err(QuantityError::TooLarge { .. })));
    }

    #[test]
    fn test_merge_and_subtract() {
        let two = Quantity::new(2).unwrap();
        let three = Quantity::new(3).unwrap();
        assert_eq!(two.checked_add(three).unwrap().get(), 5);
        assert_eq!(three.checked_sub(two), Some(Quantity::ONE));
        assert_eq!(two.checked_sub(two), None);
        assert_eq!(two.checked_sub(three), None);
        assert!(Quantity::new(i32::MAX).unwrap().checked_add(two).is_none());
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("2").unwrap().get(), 2);
    }
}
