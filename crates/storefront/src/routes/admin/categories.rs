//! Category management.

use axum::{
    Form, Json,
    extract::{Path, State},
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::CategoryId;

use crate::error::Result;
use crate::middleware::{RequireAdmin, set_flash, take_flash};
use crate::models::Category;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Category name form.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
}

/// Category list page.
#[derive(Debug, Serialize)]
pub struct CategoryListView {
    pub categories: Vec<Category>,
    pub flash: Option<String>,
}

/// All categories.
///
/// # Errors
///
/// Returns 500 if the categories cannot be read.
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<CategoryListView>> {
    let categories = CatalogService::new(state.pool(), state.media())
        .categories()
        .await?;

    Ok(Json(CategoryListView {
        categories,
        flash: take_flash(&session).await,
    }))
}

/// Create a category.
///
/// # Errors
///
/// Returns 422 for a blank name, 409 for a taken name and 500 on storage failure.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    let category = CatalogService::new(state.pool(), state.media())
        .create_category(&form.name)
        .await?;

    set_flash(&session, &format!("Category {} added", category.name)).await?;
    Ok(Redirect::to("/admin/category"))
}

/// Rename a category.
///
/// # Errors
///
/// Returns 422 for a blank name, 404 for an unknown category and 409 for a
/// taken name.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn rename(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    CatalogService::new(state.pool(), state.media())
        .rename_category(id, &form.name)
        .await?;

    set_flash(&session, "Category renamed").await?;
    Ok(Redirect::to("/admin/category"))
}

/// Delete a category; its products stay, uncategorised.
///
/// # Errors
///
/// Returns 500 if the category cannot be deleted.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<Redirect> {
    CatalogService::new(state.pool(), state.media())
        .delete_category(id)
        .await?;

    set_flash(&session, "Category deleted").await?;
    Ok(Redirect::to("/admin/category"))
}
