//! Checkout and order handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use bazaar_core::OrderId;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::OrderDetail;
use crate::services::checkout::{CheckoutRequest, CheckoutService, CheckoutView, PlacedOrder};
use crate::state::AppState;

/// Cart lines, totals and contact prefill for the checkout form.
///
/// # Errors
///
/// Returns 500 if the cart or profile cannot be read.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn checkout_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CheckoutView>> {
    Ok(Json(CheckoutService::new(state.pool()).view(user.id).await?))
}

/// Place an order from a JSON checkout submission.
///
/// # Errors
///
/// Returns 422 for invalid checkout data and 500 if the order cannot be
/// stored.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    add_breadcrumb("checkout", "Order submitted", None);

    let placed = CheckoutService::new(state.pool())
        .checkout(user.id, &request)
        .await?;

    Ok((StatusCode::CREATED, Json(placed)))
}

/// One order with its lines. Other users' orders look missing.
///
/// # Errors
///
/// Returns 404 if the order does not exist or belongs to someone else.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    Ok(Json(
        CheckoutService::new(state.pool())
            .order_for(&user, id)
            .await?,
    ))
}
