//! Domain models for the storefront.
//!
//! These are validated domain objects shared by the repositories, the
//! checkout services and the HTTP layer. Row types double as domain types
//! (`sqlx::FromRow`) because every column maps onto a core newtype.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{CartItemView, CartLine, CartLineId, CartLineView, CartView, LineItem};
pub use order::{Order, OrderDetail, OrderLine, PricedLine, PricedOrder};
pub use product::Product;
pub use user::{NewUser, User};
