//! Checkout workflow.
//!
//! Turns a validated submission into an order in one transaction:
//!
//! 1. contact backfill on the user row
//! 2. order row (`ships_on` = `created_on` + 7 days)
//! 3. product lookup, share-locked; any missing product aborts everything
//! 4. one order line per item with the product's current name and price
//! 5. the purchased products leave the user's cart
//!
//! Validation runs first and writes nothing.

mod error;
mod validation;

pub use error::CheckoutError;
pub use validation::{CheckoutItem, CheckoutRequest, CheckoutValidationError, ValidatedCheckout};

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use bazaar_core::{OrderId, ProductId, UserId};

use crate::db::orders::NewOrder;
use crate::db::{
    CartRepository, OrderRepository, ProductRepository, RepositoryError, UserRepository,
};
use crate::models::order::{INITIAL_ORDER_STATUS, NewOrderLine, ship_date};
use crate::models::{CartSummary, CurrentUser, OrderDetail, User};
use crate::services::cart::CartService;

/// A committed order with its lines and total.
pub type PlacedOrder = OrderDetail;

/// What the checkout page shows before submission.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutView {
    pub cart: CartSummary,
    /// Contact fields for prefill.
    pub user: User,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order dated today (UTC).
    ///
    /// # Errors
    ///
    /// See [`Self::checkout_on`].
    pub async fn checkout(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
    ) -> Result<PlacedOrder, CheckoutError> {
        self.checkout_on(user_id, request, Utc::now().date_naive())
            .await
    }

    /// Place an order created on `today`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` for a malformed submission (nothing
    /// written), `CheckoutError::ProductNotFound` when a product is missing
    /// (transaction rolled back), and `CheckoutError::Repository` on database
    /// failure.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn checkout_on(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
        today: NaiveDate,
    ) -> Result<PlacedOrder, CheckoutError> {
        let checkout = request.validate()?;
        let ships_on = ship_date(today).ok_or(CheckoutError::ShipDate)?;

        let mut tx = self.pool.begin().await?;

        UserRepository::backfill_contact(&mut tx, user_id, &checkout.contact).await?;

        let order = OrderRepository::insert(
            &mut tx,
            &NewOrder {
                user_id,
                created_on: today,
                ships_on,
                status: INITIAL_ORDER_STATUS,
                address: &checkout.address,
            },
        )
        .await?;

        let product_ids: Vec<ProductId> = checkout.items.iter().map(|(id, _)| *id).collect();
        let mut products: HashMap<ProductId, _> = ProductRepository::lock_many(&mut tx, &product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut lines = Vec::with_capacity(checkout.items.len());
        for (product_id, quantity) in &checkout.items {
            // Dropping `tx` on return rolls back the order row.
            let product = products
                .remove(product_id)
                .ok_or(CheckoutError::ProductNotFound(*product_id))?;
            lines.push(NewOrderLine {
                product_id: product.id,
                product_name: product.name,
                unit_price: product.price,
                quantity: *quantity,
            });
        }

        let lines = OrderRepository::insert_lines(&mut tx, order.id, &lines).await?;
        let cleared = CartRepository::delete_for_products(&mut tx, user_id, &product_ids).await?;

        tx.commit().await?;

        let placed = OrderDetail::new(order, lines);
        tracing::info!(
            order_id = %placed.order.id,
            user_id = %user_id,
            total = placed.total,
            card = %checkout.card.last_four(),
            cleared_cart_lines = cleared,
            "order placed"
        );
        Ok(placed)
    }

    /// Cart summary and current contact fields for the checkout page.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` on database failure.
    pub async fn view(&self, user_id: UserId) -> Result<CheckoutView, CheckoutError> {
        let cart = CartService::new(self.pool).summary(user_id).await?;
        let user = UserRepository::new(self.pool)
            .get_by_id(user_id)
            .await?
            .ok_or(CheckoutError::Repository(RepositoryError::NotFound))?;

        Ok(CheckoutView { cart, user })
    }

    /// An order visible to `viewer`: their own, or any order for admins.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` when the order is missing or
    /// belongs to another user.
    pub async fn order_for(
        &self,
        viewer: &CurrentUser,
        order_id: OrderId,
    ) -> Result<OrderDetail, CheckoutError> {
        let detail = OrderRepository::new(self.pool)
            .get_detail(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if detail.order.user_id != viewer.id && !viewer.is_admin() {
            return Err(CheckoutError::OrderNotFound);
        }

        Ok(detail)
    }
}
