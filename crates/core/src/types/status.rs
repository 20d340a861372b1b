//! Enumerations for catalog categories and order statuses.
//!
//! Both are stored as `TEXT` columns guarded by `CHECK` constraints, so the
//! `sqlx` implementations go through their string form.

use serde::{Deserialize, Serialize};

/// Catalog category of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    /// Cakes sold by the unit.
    #[serde(alias = "torta")]
    Cake,
    /// Event packages (parties, weddings).
    #[serde(alias = "evento")]
    Event,
}

impl ProductCategory {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cake => "cake",
            Self::Event => "event",
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cake" | "torta" => Ok(Self::Cake),
            "event" | "evento" => Ok(Self::Event),
            _ => Err(format!("invalid product category: {s}")),
        }
    }
}

/// Status of a recorded order.
///
/// Checkout only ever produces `Confirmed`; orders are immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Confirmed,
}

impl OrderStatus {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Implements `sqlx` TEXT encoding for an enum with `as_str`/`FromStr`.
#[cfg(feature = "postgres")]
macro_rules! text_enum_sqlx {
    ($name:ident) => {
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let s = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(s.parse::<Self>()?)
            }
        }

        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

#[cfg(feature = "postgres")]
text_enum_sqlx!(ProductCategory);
#[cfg(feature = "postgres")]
text_enum_sqlx!(OrderStatus);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_accepts_aliases() {
        assert_eq!("cake".parse::<ProductCategory>().unwrap(), ProductCategory::Cake);
        assert_eq!("torta".parse::<ProductCategory>().unwrap(), ProductCategory::Cake);
        assert_eq!("evento".parse::<ProductCategory>().unwrap(), ProductCategory::Event);
        assert!("bread".parse::<ProductCategory>().is_err());
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&ProductCategory::Event).unwrap();
        assert_eq!(json, "\"event\"");
        let parsed: ProductCategory = serde_json::from_str("\"torta\"").unwrap();
        assert_eq!(parsed, ProductCategory::Cake);
    }

    #[test]
    fn test_order_status_roundtrip() {
        assert_eq!(OrderStatus::default(), OrderStatus::Confirmed);
        assert_eq!(OrderStatus::Confirmed.to_string(), "confirmed");
        assert_eq!("confirmed".parse::<OrderStatus>().unwrap(), OrderStatus::Confirmed);
    }
}
