//! Catalog domain types.

use serde::Serialize;

use bazaar_core::{CategoryId, Price, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    /// Unique, case-sensitive.
    pub name: String,
}

/// A product for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price in minor currency units.
    pub price: Price,
    /// Stored media filename.
    pub image: String,
    /// Products may be uncategorised.
    pub category_id: Option<CategoryId>,
}
