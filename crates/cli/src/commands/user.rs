//! Account role management.
//!
//! Registration only ever creates `user` accounts; these commands are the
//! way to grant and revoke back-office access.

use bazaar_core::{Email, UserRole};
use bazaar_storefront::db::{RepositoryError, UserRepository};

use super::{CommandError, connect};

/// Give `email` the admin role.
pub async fn promote(email: &str) -> Result<(), CommandError> {
    set_role(email, UserRole::Admin).await
}

/// Return `email` to the user role.
pub async fn demote(email: &str) -> Result<(), CommandError> {
    set_role(email, UserRole::User).await
}

async fn set_role(email: &str, role: UserRole) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_role(&email, role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CommandError::UnknownUser(email.to_string()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "role updated");
    Ok(())
}
