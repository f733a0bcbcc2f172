//! Cart maintenance.

use bazaar_storefront::db::CartRepository;

use super::{CommandError, connect};

/// Merge every duplicate (user, product) cart line into one.
pub async fn reconcile() -> Result<(), CommandError> {
    let pool = connect().await?;

    let removed = CartRepository::new(&pool).reconcile_all().await?;

    if removed == 0 {
        tracing::info!("No duplicate cart lines found");
    } else {
        tracing::warn!(removed, "Merged duplicate cart lines");
    }
    Ok(())
}
