//! Cart domain types.

use std::collections::HashSet;

use serde::Serialize;

use bazaar_core::{CartLineId, ProductId, Quantity, UserId};

use super::Product;

/// One stored cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// Outcome of a cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", content = "line", rename_all = "snake_case")]
pub enum CartChange {
    /// The line now has this quantity.
    Updated(CartLine),
    /// The line was deleted.
    Removed,
    /// There was no line to change.
    Unchanged,
}

/// A cart line joined with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: Quantity,
}

/// The same product appeared on more than one cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("product {product_id} appears on more than one cart line")]
pub struct DuplicateCartLine {
    pub product_id: ProductId,
}

/// A summarised cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummaryLine {
    pub product: Product,
    pub quantity: Quantity,
    /// `quantity × price`.
    pub line_total: i64,
}

/// Cart contents with totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub lines: Vec<CartSummaryLine>,
    pub total_quantity: i64,
    pub total_price: i64,
}

impl CartSummary {
    /// Summarise cart items.
    ///
    /// Lines are never merged here: a product listed twice means the store
    /// lost its (user, product) uniqueness and must be repaired instead.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCartLine` for the first product seen twice.
    pub fn from_items(items: Vec<CartItem>) -> Result<Self, DuplicateCartLine> {
        let mut seen = HashSet::with_capacity(items.len());
        let mut summary = Self::default();

        for item in items {
            if !seen.insert(item.product.id) {
                return Err(DuplicateCartLine {
                    product_id: item.product.id,
                });
            }
            let line_total = item.product.price.times(item.quantity);
            summary.total_quantity += i64::from(item.quantity.get());
            summary.total_price += line_total;
            summary.lines.push(CartSummaryLine {
                product: item.product,
                quantity: item.quantity,
                line_total,
            });
        }

        Ok(summary)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Product IDs in the cart.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|line| line.product.id).collect()
    }
}
