//! Catalog browsing and back-office category/product management.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{CategoryId, Price, PriceError, ProductId};

use crate::db::products::ProductInput;
use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::models::{Category, Product};
use crate::services::media::{MediaError, MediaStore};

/// Number of products suggested on a product page.
pub const RECOMMENDATION_COUNT: i64 = 3;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A required name was blank.
    #[error("{0} name is required")]
    EmptyName(&'static str),

    /// The price is not a positive whole number.
    #[error("invalid price: {0}")]
    InvalidPrice(#[from] PriceError),

    /// A new product was submitted without an image.
    #[error("product image is required")]
    MissingImage,

    /// A category ID in a form or filter is not a number.
    #[error("invalid category id: {0}")]
    InvalidCategoryId(String),

    /// The category does not exist.
    #[error("category not found")]
    CategoryNotFound,

    /// The product does not exist.
    #[error("product not found")]
    ProductNotFound,

    /// Another category already has this name.
    #[error("category {0:?} already exists")]
    DuplicateCategory(String),

    /// Storing the uploaded image failed.
    #[error("image upload failed: {0}")]
    Media(#[from] MediaError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// An uploaded file from a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Raw product form fields.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub price: String,
    /// Blank means uncategorised.
    pub category_id: String,
    pub image: Option<Upload>,
}

/// Products filtered by category, with the filter UI data.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub selected: Vec<CategoryId>,
}

/// A product with its recommendations.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub product: Product,
    pub recommendations: Vec<Product>,
}

/// Parse the repeated `category` parameter of a catalog query string.
///
/// Other parameters are ignored. Blank values are skipped.
///
/// # Errors
///
/// Returns `CatalogError::InvalidCategoryId` for a non-numeric value.
pub fn parse_category_filter(query: &str) -> Result<Vec<CategoryId>, CatalogError> {
    let mut selected = Vec::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if key != "category" || value.trim().is_empty() {
            continue;
        }
        let id = value
            .parse::<CategoryId>()
            .map_err(|_| CatalogError::InvalidCategoryId(value.to_string()))?;
        if !selected.contains(&id) {
            selected.push(id);
        }
    }
    Ok(selected)
}

fn required_name(value: &str, what: &'static str) -> Result<String, CatalogError> {
    let name = value.trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName(what));
    }
    Ok(name.to_owned())
}

fn optional_category(value: &str) -> Result<Option<CategoryId>, CatalogError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<CategoryId>()
        .map(Some)
        .map_err(|_| CatalogError::InvalidCategoryId(value.to_owned()))
}

fn category_error(e: RepositoryError, name: &str) -> CatalogError {
    match e {
        RepositoryError::Conflict(_) => CatalogError::DuplicateCategory(name.to_owned()),
        RepositoryError::NotFound => CatalogError::CategoryNotFound,
        other => CatalogError::Repository(other),
    }
}

/// Catalog service.
pub struct CatalogService<'a> {
    categories: CategoryRepository<'a>,
    products: ProductRepository<'a>,
    media: &'a MediaStore,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, media: &'a MediaStore) -> Self {
        Self {
            categories: CategoryRepository::new(pool),
            products: ProductRepository::new(pool),
            media,
        }
    }

    // =========================================================================
    // Browsing
    // =========================================================================

    /// Every product, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on database failure.
    pub async fn all_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list_all().await?)
    }

    /// Products in any of `selected` (all products when empty).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on database failure.
    pub async fn catalog(&self, selected: Vec<CategoryId>) -> Result<CatalogPage, CatalogError> {
        let products = if selected.is_empty() {
            self.products.list_all().await?
        } else {
            self.products.list_by_categories(&selected).await?
        };
        let categories = self.categories.list_all().await?;

        Ok(CatalogPage {
            products,
            categories,
            selected,
        })
    }

    /// A product and up to three others to suggest.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if the product does not exist.
    pub async fn product_page(&self, id: ProductId) -> Result<ProductPage, CatalogError> {
        let product = self
            .products
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::ProductNotFound)?;
        let recommendations = self
            .products
            .recommendations(id, RECOMMENDATION_COUNT)
            .await?;

        Ok(ProductPage {
            product,
            recommendations,
        })
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on database failure.
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.categories.list_all().await?)
    }

    /// Create a category with a unique, non-blank name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyName` or `CatalogError::DuplicateCategory`.
    #[instrument(skip(self))]
    pub async fn create_category(&self, name: &str) -> Result<Category, CatalogError> {
        let name = required_name(name, "category")?;
        let category = self
            .categories
            .create(&name)
            .await
            .map_err(|e| category_error(e, &name))?;

        tracing::info!(category_id = %category.id, "category created");
        Ok(category)
    }

    /// Rename a category under the same rules as creation.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyName`, `CatalogError::DuplicateCategory`
    /// or `CatalogError::CategoryNotFound`.
    #[instrument(skip(self))]
    pub async fn rename_category(&self, id: CategoryId, name: &str) -> Result<Category, CatalogError> {
        let name = required_name(name, "category")?;
        self.categories
            .rename(id, &name)
            .await
            .map_err(|e| category_error(e, &name))
    }

    /// Delete a category; its products become uncategorised.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CategoryNotFound` if it does not exist.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), CatalogError> {
        self.categories
            .delete(id)
            .await
            .map_err(|e| category_error(e, ""))?;

        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// A product and the categories it may be moved to.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if the product does not exist.
    pub async fn product_for_edit(
        &self,
        id: ProductId,
    ) -> Result<(Product, Vec<Category>), CatalogError> {
        let product = self
            .products
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::ProductNotFound)?;
        let categories = self.categories.list_all().await?;
        Ok((product, categories))
    }

    /// Create a product. Fields are validated and the category checked before
    /// the image is written.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyName`, `CatalogError::InvalidPrice`,
    /// `CatalogError::MissingImage`, `CatalogError::CategoryNotFound` or
    /// `CatalogError::Media`.
    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create_product(&self, form: ProductForm) -> Result<Product, CatalogError> {
        let (name, price, category_id) = self.validate_product(&form).await?;
        let upload = form.image.ok_or(CatalogError::MissingImage)?;
        let image = self.media.save(&upload.filename, &upload.bytes).await?;

        let product = self
            .products
            .create(&ProductInput {
                name,
                price,
                image: Some(image),
                category_id,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogError::CategoryNotFound,
                other => CatalogError::Repository(other),
            })?;

        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Update a product. Without a new upload the stored image is kept.
    ///
    /// # Errors
    ///
    /// As [`Self::create_product`], plus `CatalogError::ProductNotFound`.
    #[instrument(skip(self, form))]
    pub async fn update_product(
        &self,
        id: ProductId,
        form: ProductForm,
    ) -> Result<Product, CatalogError> {
        let (name, price, category_id) = self.validate_product(&form).await?;
        if self.products.get_by_id(id).await?.is_none() {
            return Err(CatalogError::ProductNotFound);
        }

        let image = match form.image {
            Some(upload) => Some(self.media.save(&upload.filename, &upload.bytes).await?),
            None => None,
        };

        self.products
            .update(
                id,
                &ProductInput {
                    name,
                    price,
                    image,
                    category_id,
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogError::ProductNotFound,
                other => CatalogError::Repository(other),
            })
    }

    /// Delete a product and its cart lines.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if it does not exist.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        self.products.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => CatalogError::ProductNotFound,
            other => CatalogError::Repository(other),
        })?;

        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn validate_product(
        &self,
        form: &ProductForm,
    ) -> Result<(String, Price, Option<CategoryId>), CatalogError> {
        let name = required_name(&form.name, "product")?;
        let price = Price::parse(&form.price)?;
        let category_id = optional_category(&form.category_id)?;

        if let Some(category_id) = category_id
            && self.categories.get_by_id(category_id).await?.is_none()
        {
            return Err(CatalogError::CategoryNotFound);
        }

        Ok((name, price, category_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_filter_repeated_parameter() {
        let ids = parse_category_filter("category=2&category=5&sort=name&category=2").unwrap();
        assert_eq!(ids, vec![CategoryId::new(2), CategoryId::new(5)]);
    }

    #[test]
    fn test_category_filter_empty() {
        assert!(parse_category_filter("").unwrap().is_empty());
        assert!(parse_category_filter("category=").unwrap().is_empty());
    }

    #[test]
    fn test_category_filter_rejects_words() {
        assert!(matches!(
            parse_category_filter("category=shoes"),
            Err(CatalogError::InvalidCategoryId(v)) if v == "shoes"
        ));
    }

    #[test]
    fn test_required_name_trims() {
        assert_eq!(required_name("  Toys ", "category").unwrap(), "Toys");
        assert!(matches!(
            required_name(" ", "category"),
            Err(CatalogError::EmptyName("category"))
        ));
    }

    #[test]
    fn test_optional_category() {
        assert_eq!(optional_category("").unwrap(), None);
        assert_eq!(optional_category(" 4 ").unwrap(), Some(CategoryId::new(4)));
        assert!(optional_category("x").is_err());
    }
}
