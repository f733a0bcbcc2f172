//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the sqlx row structs in
//! [`crate::db`]. They serialize directly as JSON view data.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod user;

pub use cart::{CartChange, CartItem, CartLine, CartSummary, CartSummaryLine, DuplicateCartLine};
pub use catalog::{Category, Product};
pub use order::{Order, OrderDetail, OrderLine};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
