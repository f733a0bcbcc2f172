//! Back-office handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin):
//! anonymous visitors are sent to log in, plain users get 403.

pub mod categories;
pub mod products;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};
use serde::Serialize;
use tower_sessions::Session;

use crate::error::Result;
use crate::middleware::{RequireAdmin, take_flash};
use crate::models::{Category, Product};
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Largest accepted product upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Back-office routes, nested under `/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/product", get(products::index))
        .route("/product/add", post(products::create))
        .route(
            "/product/edit/{id}",
            get(products::edit_page).post(products::update),
        )
        .route("/product/delete/{id}", post(products::delete))
        .route("/category", get(categories::index))
        .route("/category/add", post(categories::create))
        .route("/category/edit/{id}", post(categories::rename))
        .route("/category/delete/{id}", post(categories::delete))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Dashboard data.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub flash: Option<String>,
}

/// Categories and products at a glance.
///
/// # Errors
///
/// Returns 403 for non-admins and 500 if the catalog cannot be read.
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<DashboardView>> {
    let catalog = CatalogService::new(state.pool(), state.media());

    Ok(Json(DashboardView {
        categories: catalog.categories().await?,
        products: catalog.all_products().await?,
        flash: take_flash(&session).await,
    }))
}
