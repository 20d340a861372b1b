//! HTTP middleware and extractors for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (recorded in the span, Sentry scope and response)
//!
//! # Extractors
//!
//! - [`ValidatedJson`] / [`ValidatedPath`] - reject malformed input with
//!   `422 invalid_request`
//! - [`coerce`] - serde helpers accepting numbers or numeric strings

pub mod coerce;
pub mod extract;
pub mod request_id;

pub use extract::{ValidatedJson, ValidatedPath};
pub use request_id::{RequestId, request_id_middleware};
