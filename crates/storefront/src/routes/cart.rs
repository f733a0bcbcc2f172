//! Cart handlers.

use axum::{
    Form, Json,
    extract::{Path, State},
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bazaar_core::ProductId;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::CartSummary;
use crate::services::cart::{CartOperation, CartService};
use crate::state::AppState;

/// Shown when the cart has no lines.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty";

/// Quantity button form. A missing `operation` adds one unit.
#[derive(Debug, Deserialize)]
pub struct CartForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub operation: CartOperation,
}

/// `/cart` response.
#[derive(Debug, Serialize)]
pub struct CartView {
    #[serde(flatten)]
    pub cart: CartSummary,
    pub message: Option<&'static str>,
}

/// The logged-in user's cart with totals.
///
/// # Errors
///
/// Returns 500 if the cart cannot be read or repaired.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool()).summary(user.id).await?;
    let message = cart.is_empty().then_some(EMPTY_CART_MESSAGE);
    Ok(Json(CartView { cart, message }))
}

/// Add or take away one unit.
///
/// # Errors
///
/// Returns 404 for an unknown product and 500 on storage failure.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CartForm>,
) -> Result<Redirect> {
    let change = CartService::new(state.pool())
        .apply(user.id, form.product_id, form.operation)
        .await?;

    let product_id = form.product_id.to_string();
    add_breadcrumb(
        "cart",
        "Cart updated",
        Some(&[("product_id", product_id.as_str())]),
    );
    tracing::debug!(?change, "cart updated");
    Ok(Redirect::to("/cart"))
}

/// Drop a product from the cart.
///
/// # Errors
///
/// Returns 500 if the cart line cannot be deleted.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Redirect> {
    CartService::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    Ok(Redirect::to("/cart"))
}
