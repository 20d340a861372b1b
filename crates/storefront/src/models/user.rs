//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use eglys_core::{Email, UserId};

/// A registered customer.
///
/// The credential is never part of this type; it is only read through
/// `UserStore::get_password_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Given names.
    pub first_name: String,
    /// Family names.
    pub last_name: String,
    /// Contact phone.
    pub phone: Option<String>,
    /// Login email (normalized to lower case).
    pub email: Email,
    /// Delivery address.
    pub address: Option<String>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Email,
    pub address: Option<String>,
    /// Argon2 PHC string.
    pub password_hash: String,
}
