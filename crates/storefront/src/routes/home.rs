//! Storefront landing page and category browsing.

use axum::{
    Json,
    extract::{RawQuery, State},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::{OptionalAuth, take_flash};
use crate::models::{CurrentUser, Product};
use crate::services::catalog::{CatalogPage, CatalogService, parse_category_filter};
use crate::state::AppState;

/// Shown on the landing page when the catalog is empty.
pub const NO_PRODUCTS_MESSAGE: &str = "No products yet";

/// Landing page data.
#[derive(Debug, Serialize)]
pub struct HomeView {
    pub products: Vec<Product>,
    pub message: Option<&'static str>,
    pub flash: Option<String>,
    pub user: Option<CurrentUser>,
}

/// Every product.
///
/// # Errors
///
/// Returns 500 if the catalog cannot be read.
#[instrument(skip(state, session, user))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<HomeView>> {
    let products = CatalogService::new(state.pool(), state.media())
        .all_products()
        .await?;
    let message = products.is_empty().then_some(NO_PRODUCTS_MESSAGE);

    Ok(Json(HomeView {
        products,
        message,
        flash: take_flash(&session).await,
        user,
    }))
}

/// Products filtered by the repeated `category` query parameter.
///
/// # Errors
///
/// Returns 422 for a malformed category ID.
#[instrument(skip(state))]
pub async fn catalog(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<CatalogPage>> {
    let selected = parse_category_filter(query.as_deref().unwrap_or_default())?;
    let page = CatalogService::new(state.pool(), state.media())
        .catalog(selected)
        .await?;
    Ok(Json(page))
}
