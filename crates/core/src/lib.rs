//! Eglys Core - Shared domain types.
//!
//! This crate provides the types shared by every Eglys component:
//! - `storefront` - Order-taking HTTP backend (catalog, cart, checkout)
//! - `cli` - Command-line tools for migrations and order inspection
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP. With the `postgres` feature enabled, the newtypes also
//! implement the `sqlx` encode/decode traits so repositories can bind
//! them directly.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, quantities, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
