//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `pricing` - Authoritative pricing of cart lines
//! - `checkout` - Cart-to-order conversion

pub mod auth;
pub mod checkout;
pub mod pricing;
