//! Profile view, profile edit and account deletion.

use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use bazaar_core::{Email, UserId};

use crate::db::{OrderRepository, RepositoryError, UserRepository};
use crate::models::user::ContactBackfill;
use crate::models::{Category, CurrentUser, OrderDetail, Product, User};
use crate::services::auth::{self, AuthError};
use crate::services::catalog::{CatalogError, CatalogService};
use crate::services::media::MediaStore;

/// What `/profile` shows.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileView {
    /// Back-office landing data.
    Admin {
        categories: Vec<Category>,
        products: Vec<Product>,
    },
    /// A shopper's profile and order history.
    Customer {
        user: User,
        orders: Vec<OrderDetail>,
    },
}

/// Submitted profile changes.
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub email: String,
    /// Blank keeps the current password.
    pub password: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
}

/// Account errors.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// The account no longer exists.
    #[error("account not found")]
    NotFound,

    /// Email or password rejected, or the email is taken.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Loading the admin dashboard failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Account service.
pub struct AccountService<'a> {
    pool: &'a PgPool,
    media: &'a MediaStore,
}

impl<'a> AccountService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, media: &'a MediaStore) -> Self {
        Self { pool, media }
    }

    /// The profile page for `viewer`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if the account was deleted meanwhile.
    pub async fn profile(&self, viewer: &CurrentUser) -> Result<ProfileView, AccountError> {
        if viewer.is_admin() {
            let catalog = CatalogService::new(self.pool, self.media);
            return Ok(ProfileView::Admin {
                categories: catalog.categories().await?,
                products: catalog.all_products().await?,
            });
        }

        let user = UserRepository::new(self.pool)
            .get_by_id(viewer.id)
            .await?
            .ok_or(AccountError::NotFound)?;
        let orders = OrderRepository::new(self.pool).list_for_user(viewer.id).await?;

        Ok(ProfileView::Customer { user, orders })
    }

    /// Apply profile changes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword` or
    /// `AuthError::UserAlreadyExists` (wrapped), or `AccountError::NotFound`.
    #[instrument(skip(self, edit))]
    pub async fn edit(&self, user_id: UserId, edit: &ProfileEdit) -> Result<User, AccountError> {
        let email = Email::parse(&edit.email).map_err(AuthError::from)?;
        let password_hash = match edit.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => {
                auth::validate_password(password)?;
                Some(auth::hash_password(password)?)
            }
            None => None,
        };
        let contact = ContactBackfill::new(
            edit.name.as_deref(),
            edit.surname.as_deref(),
            edit.phone.as_deref(),
        );

        UserRepository::new(self.pool)
            .update_account(user_id, &email, password_hash.as_deref(), &contact)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AccountError::Auth(AuthError::UserAlreadyExists),
                RepositoryError::NotFound => AccountError::NotFound,
                other => AccountError::Repository(other),
            })
    }

    /// Delete the account with its carts and orders.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if it was already gone.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: UserId) -> Result<(), AccountError> {
        UserRepository::new(self.pool)
            .delete(user_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AccountError::NotFound,
                other => AccountError::Repository(other),
            })?;

        tracing::info!(user_id = %user_id, "account deleted");
        Ok(())
    }
}
