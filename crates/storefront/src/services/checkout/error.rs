//! Checkout error types.

use thiserror::Error;

use bazaar_core::ProductId;

use super::CheckoutValidationError;
use crate::db::RepositoryError;
use crate::services::cart::CartError;

/// Errors from placing or viewing orders.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The submission failed a syntactic check; nothing was written.
    #[error(transparent)]
    Validation(#[from] CheckoutValidationError),

    /// A submitted product does not exist; the order was rolled back.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The order does not exist or belongs to someone else.
    #[error("order not found")]
    OrderNotFound,

    /// The ship date overflowed the calendar.
    #[error("cannot compute ship date")]
    ShipDate,

    /// Reading the cart failed.
    #[error("cart error: {0}")]
    Cart(#[from] CartError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}
