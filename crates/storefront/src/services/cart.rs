//! Cart manager.
//!
//! Owns the per-user cart lines. Every operation takes the acting user's ID
//! explicitly; there is no ambient "current user".

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{ProductId, UserId};

use crate::db::{CartRepository, RepositoryError};
use crate::models::{CartChange, CartItem, CartLine, CartSummary};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The cart still lists a product twice after repair.
    #[error("cart for user {0} could not be repaired")]
    Unrepairable(UserId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// The two quantity buttons on the cart and product pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum CartOperation {
    /// Add one unit.
    #[default]
    #[serde(rename = "+")]
    Increment,
    /// Remove one unit.
    #[serde(rename = "-")]
    Decrement,
}

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
        }
    }

    /// Add one unit of `product_id` to the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn add_or_increment(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartLine, CartError> {
        self.carts
            .add_or_increment(user_id, product_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ProductNotFound(product_id),
                other => CartError::Repository(other),
            })
    }

    /// Remove one unit; removing the last unit deletes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database fails.
    #[instrument(skip(self))]
    pub async fn decrement_or_remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartChange, CartError> {
        Ok(self.carts.decrement_or_remove(user_id, product_id).await?)
    }

    /// Apply a quantity button press.
    ///
    /// # Errors
    ///
    /// See [`Self::add_or_increment`] and [`Self::decrement_or_remove`].
    pub async fn apply(
        &self,
        user_id: UserId,
        product_id: ProductId,
        operation: CartOperation,
    ) -> Result<CartChange, CartError> {
        match operation {
            CartOperation::Increment => Ok(CartChange::Updated(
                self.add_or_increment(user_id, product_id).await?,
            )),
            CartOperation::Decrement => self.decrement_or_remove(user_id, product_id).await,
        }
    }

    /// Drop the line for a product.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database fails.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartChange, CartError> {
        Ok(self.carts.remove(user_id, product_id).await?)
    }

    /// The user's cart lines with their products.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CartItem>, CartError> {
        Ok(self.carts.list_for_user(user_id).await?)
    }

    /// The user's cart with totals.
    ///
    /// A product listed on two lines is logged, merged in the store, and the
    /// cart is read again.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Unrepairable` if duplicates survive the repair.
    #[instrument(skip(self))]
    pub async fn summary(&self, user_id: UserId) -> Result<CartSummary, CartError> {
        let items = self.carts.list_for_user(user_id).await?;
        match CartSummary::from_items(items) {
            Ok(summary) => Ok(summary),
            Err(duplicate) => {
                tracing::error!(
                    user_id = %user_id,
                    product_id = %duplicate.product_id,
                    "duplicate cart lines found, merging"
                );
                let merged = self.carts.repair_duplicates(user_id).await?;
                tracing::info!(user_id = %user_id, merged, "cart lines merged");

                let items = self.carts.list_for_user(user_id).await?;
                CartSummary::from_items(items).map_err(|_| CartError::Unrepairable(user_id))
            }
        }
    }

    /// Merge duplicate lines in every cart. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database fails.
    #[instrument(skip(self))]
    pub async fn reconcile_all(&self) -> Result<u64, CartError> {
        let removed = self.carts.reconcile_all().await?;
        if removed > 0 {
            tracing::warn!(removed, "merged duplicate cart lines");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Form {
        #[serde(default)]
        operation: CartOperation,
    }

    #[test]
    fn test_operation_from_json_symbols() {
        let plus: Form = serde_json::from_str(r#"{"operation":"+"}"#).unwrap();
        let minus: Form = serde_json::from_str(r#"{"operation":"-"}"#).unwrap();
        assert_eq!(plus.operation, CartOperation::Increment);
        assert_eq!(minus.operation, CartOperation::Decrement);
    }

    #[test]
    fn test_missing_operation_means_increment() {
        let form: Form = serde_json::from_str("{}").unwrap();
        assert_eq!(form.operation, CartOperation::Increment);
    }

    #[test]
    fn test_unknown_operation_rejected() {
        assert!(serde_json::from_str::<Form>(r#"{"operation":"*"}"#).is_err());
    }
}
