//! Eglys storefront library.
//!
//! Catalog, per-user carts, checkout and order history for the pastry shop,
//! served over a JSON HTTP API. The binary in `main.rs` wires configuration,
//! logging and the storage backend around [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
