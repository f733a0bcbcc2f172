//! Product management.
//!
//! Add and edit take `multipart/form-data` with the fields `name`, `price`,
//! `category_id` and `img`. An `img` part with an empty filename means no
//! upload, which on edit keeps the current image.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    response::Redirect,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::ProductId;

use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, set_flash, take_flash};
use crate::models::{Category, Product};
use crate::services::catalog::{CatalogService, ProductForm, Upload};
use crate::state::AppState;

/// Product list page.
#[derive(Debug, Serialize)]
pub struct ProductListView {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub flash: Option<String>,
}

/// Edit page: the product plus category choices.
#[derive(Debug, Serialize)]
pub struct ProductEditView {
    pub product: Product,
    pub categories: Vec<Category>,
}

/// All products, with categories for the add form.
///
/// # Errors
///
/// Returns 500 if the catalog cannot be read.
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ProductListView>> {
    let catalog = CatalogService::new(state.pool(), state.media());

    Ok(Json(ProductListView {
        products: catalog.all_products().await?,
        categories: catalog.categories().await?,
        flash: take_flash(&session).await,
    }))
}

/// Create a product from an upload form.
///
/// # Errors
///
/// Returns 400 for a malformed upload, 422 for invalid fields and 500 if the
/// product or image cannot be stored.
#[instrument(skip(state, session, admin, multipart), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<Redirect> {
    let form = read_product_form(multipart).await?;
    let product = CatalogService::new(state.pool(), state.media())
        .create_product(form)
        .await?;

    set_flash(&session, &format!("Product {} added", product.name)).await?;
    Ok(Redirect::to("/admin/product"))
}

/// The product being edited.
///
/// # Errors
///
/// Returns 404 for an unknown product.
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductEditView>> {
    let (product, categories) = CatalogService::new(state.pool(), state.media())
        .product_for_edit(id)
        .await?;

    Ok(Json(ProductEditView {
        product,
        categories,
    }))
}

/// Save product edits.
///
/// # Errors
///
/// Returns 400 for a malformed upload, 422 for invalid fields and 404 for an
/// unknown product.
#[instrument(skip(state, session, admin, multipart), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Redirect> {
    let form = read_product_form(multipart).await?;
    CatalogService::new(state.pool(), state.media())
        .update_product(id, form)
        .await?;

    set_flash(&session, "Product updated").await?;
    Ok(Redirect::to("/admin/product"))
}

/// Delete a product. Past orders keep their line snapshots.
///
/// # Errors
///
/// Returns 500 if the product cannot be deleted.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    CatalogService::new(state.pool(), state.media())
        .delete_product(id)
        .await?;

    set_flash(&session, "Product deleted").await?;
    Ok(Redirect::to("/admin/product"))
}

/// Collect the product fields from a multipart body. Unknown parts are skipped.
async fn read_product_form(mut multipart: Multipart) -> Result<ProductForm> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "name" => form.name = field.text().await.map_err(bad_multipart)?,
            "price" => form.price = field.text().await.map_err(bad_multipart)?,
            "category_id" => form.category_id = field.text().await.map_err(bad_multipart)?,
            "img" => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if !filename.is_empty() {
                    form.image = Some(Upload {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => tracing::debug!(field = other, "ignoring multipart field"),
        }
    }

    Ok(form)
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("invalid form upload: {}", e.body_text()))
}
