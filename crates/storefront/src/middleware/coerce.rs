//! Lenient numeric fields for request bodies.
//!
//! Browser clients send ids and quantities either as JSON numbers or, in
//! JSON bodies built from form values, as numeric strings. Both are
//! accepted; anything else is a deserialization error. Urlencoded form
//! posts are not accepted at all.

use serde::{Deserialize, Deserializer, de};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

impl NumberOrString {
    fn into_i64<E: de::Error>(self) -> Result<Option<i64>, E> {
        match self {
            Self::Number(n) => Ok(Some(n)),
            Self::Text(s) if s.trim().is_empty() => Ok(None),
            Self::Text(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| E::custom(format!("expected an integer, got {s:?}"))),
        }
    }
}

/// Deserialize an `i32`-backed id from a number or a numeric string.
///
/// # Errors
///
/// Fails if the value is missing, not an integer, or outside `i32`.
pub fn id<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<i32>,
{
    let value = NumberOrString::deserialize(deserializer)?
        .into_i64::<D::Error>()?
        .ok_or_else(|| de::Error::custom("expected an integer, got an empty string"))?;
    i32::try_from(value)
        .map(T::from)
        .map_err(|_| de::Error::custom(format!("id {value} is out of range")))
}

/// Deserialize an optional integer from a number, a numeric string, `null`
/// or an empty string.
///
/// # Errors
///
/// Fails if the value is present but not an integer.
pub fn optional_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(value) => value.into_i64(),
        None => Ok(None),
    }
}
