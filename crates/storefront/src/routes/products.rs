//! Product detail page.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::ProductId;

use crate::error::Result;
use crate::middleware::set_flash;
use crate::services::catalog::{CatalogError, CatalogService};
use crate::state::AppState;

/// Product detail with recommendations.
///
/// The name segment is decorative. An unknown ID sends the visitor back to
/// the landing page with a message.
///
/// # Errors
///
/// Returns 500 if the product or its recommendations cannot be read.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path((_, id)): Path<(String, ProductId)>,
) -> Result<Response> {
    match CatalogService::new(state.pool(), state.media())
        .product_page(id)
        .await
    {
        Ok(page) => Ok(Json(page).into_response()),
        Err(CatalogError::ProductNotFound) => {
            set_flash(&session, "Product not found").await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => Err(e.into()),
    }
}
