//! Demo catalog data.
//!
//! Creates a few categories and products so a fresh database has something
//! to browse. Categories that already exist are reused, so the command can
//! be run more than once; products are only added to an empty catalog.
//! Image paths point at `/media`; drop matching files there to see them.

use bazaar_core::Price;
use bazaar_storefront::db::products::ProductInput;
use bazaar_storefront::db::{CategoryRepository, ProductRepository, RepositoryError};
use bazaar_storefront::models::Category;

use super::{CommandError, connect};

const CATEGORIES: &[&str] = &["Kitchen", "Garden", "Books"];

/// (name, price in minor units, image file, category)
const PRODUCTS: &[(&str, i32, &str, &str)] = &[
    ("Cast iron skillet", 3900, "skillet.jpg", "Kitchen"),
    ("Chef's knife", 5400, "knife.jpg", "Kitchen"),
    ("Watering can", 1800, "watering_can.jpg", "Garden"),
    ("Seed starter kit", 2200, "seed_kit.jpg", "Garden"),
    ("Field guide to birds", 2500, "birds.jpg", "Books"),
    ("Gift card", 5000, "gift_card.png", ""),
];

/// Insert the demo catalog.
pub async fn demo() -> Result<(), CommandError> {
    let pool = connect().await?;
    let categories = CategoryRepository::new(&pool);
    let products = ProductRepository::new(&pool);

    for name in CATEGORIES {
        match categories.create(name).await {
            Ok(category) => tracing::info!(id = %category.id, name, "category created"),
            Err(RepositoryError::Conflict(_)) => tracing::info!(name, "category exists"),
            Err(e) => return Err(e.into()),
        }
    }
    let existing = categories.list_all().await?;

    if !products.list_all().await?.is_empty() {
        tracing::info!("Catalog already has products, skipping");
        return Ok(());
    }

    for &(name, price, image, category) in PRODUCTS {
        let input = ProductInput {
            name: name.to_owned(),
            price: Price::new(price).map_err(|e| CommandError::Seed(format!("{name}: {e}")))?,
            image: Some(image.to_owned()),
            category_id: find(&existing, category),
        };
        let product = products.create(&input).await?;
        tracing::info!(id = %product.id, name, "product created");
    }

    tracing::info!("Seed complete!");
    Ok(())
}

fn find(categories: &[Category], name: &str) -> Option<bazaar_core::CategoryId> {
    categories.iter().find(|c| c.name == name).map(|c| c.id)
}
