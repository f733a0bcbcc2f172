//! Catalog browsing and back-office management against a real database.
//!
//! Requires `DATABASE_URL`; run with `cargo test -- --ignored`.

#![allow(clippy::unwrap_used)]

use bazaar_core::{ProductId, UserRole};
use bazaar_integration_tests::{
    checkout_request, create_category, create_product, create_user, scratch_media_dir,
};
use bazaar_storefront::services::cart::CartService;
use bazaar_storefront::services::catalog::{CatalogError, CatalogService, ProductForm, Upload};
use bazaar_storefront::services::checkout::CheckoutService;
use bazaar_storefront::services::media::MediaStore;
use sqlx::PgPool;

fn form(name: &str, price: &str, category_id: &str, image: Option<&str>) -> ProductForm {
    ProductForm {
        name: name.to_owned(),
        price: price.to_owned(),
        category_id: category_id.to_owned(),
        image: image.map(|filename| Upload {
            filename: filename.to_owned(),
            bytes: b"\x89PNG fake".to_vec(),
        }),
    }
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_category_filter_matches_any_selected(pool: PgPool) {
    let kitchen = create_category(&pool, "Kitchen").await;
    let garden = create_category(&pool, "Garden").await;
    let books = create_category(&pool, "Books").await;
    let mug = create_product(&pool, "Mug", 1200, Some(kitchen.id)).await;
    let hose = create_product(&pool, "Hose", 3000, Some(garden.id)).await;
    create_product(&pool, "Atlas", 2500, Some(books.id)).await;
    create_product(&pool, "Gift card", 5000, None).await;

    let media = MediaStore::new(scratch_media_dir());
    let catalog = CatalogService::new(&pool, &media);

    let page = catalog.catalog(vec![kitchen.id, garden.id]).await.unwrap();
    let ids: Vec<ProductId> = page.products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![mug.id, hose.id]);
    assert_eq!(page.categories.len(), 3);

    let everything = catalog.catalog(Vec::new()).await.unwrap();
    assert_eq!(everything.products.len(), 4);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_product_page_recommends_others(pool: PgPool) {
    let mug = create_product(&pool, "Mug", 1200, None).await;
    for name in ["Lamp", "Rug", "Vase", "Clock"] {
        create_product(&pool, name, 1000, None).await;
    }

    let media = MediaStore::new(scratch_media_dir());
    let page = CatalogService::new(&pool, &media)
        .product_page(mug.id)
        .await
        .unwrap();

    assert_eq!(page.product.id, mug.id);
    assert_eq!(page.recommendations.len(), 3);
    assert!(page.recommendations.iter().all(|p| p.id != mug.id));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_category_names_are_unique_and_required(pool: PgPool) {
    let media = MediaStore::new(scratch_media_dir());
    let catalog = CatalogService::new(&pool, &media);

    let kitchen = catalog.create_category("  Kitchen ").await.unwrap();
    assert_eq!(kitchen.name, "Kitchen");

    assert!(matches!(
        catalog.create_category("Kitchen").await,
        Err(CatalogError::DuplicateCategory(_))
    ));
    assert!(matches!(
        catalog.create_category("   ").await,
        Err(CatalogError::EmptyName(_))
    ));

    let garden = catalog.create_category("Garden").await.unwrap();
    assert!(matches!(
        catalog.rename_category(garden.id, "Kitchen").await,
        Err(CatalogError::DuplicateCategory(_))
    ));
    let renamed = catalog.rename_category(garden.id, "Yard").await.unwrap();
    assert_eq!(renamed.name, "Yard");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_deleting_category_keeps_products(pool: PgPool) {
    let kitchen = create_category(&pool, "Kitchen").await;
    let mug = create_product(&pool, "Mug", 1200, Some(kitchen.id)).await;

    let media = MediaStore::new(scratch_media_dir());
    let catalog = CatalogService::new(&pool, &media);
    catalog.delete_category(kitchen.id).await.unwrap();

    let page = catalog.product_page(mug.id).await.unwrap();
    assert_eq!(page.product.category_id, None);
    assert!(matches!(
        catalog.delete_category(kitchen.id).await,
        Err(CatalogError::CategoryNotFound)
    ));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_create_product_saves_upload(pool: PgPool) {
    let kitchen = create_category(&pool, "Kitchen").await;
    let dir = scratch_media_dir();
    let media = MediaStore::new(&dir);
    let catalog = CatalogService::new(&pool, &media);

    let product = catalog
        .create_product(form(
            "Teapot",
            " 2800 ",
            &kitchen.id.to_string(),
            Some("My Teapot.PNG"),
        ))
        .await
        .unwrap();

    assert_eq!(product.price.minor_units(), 2800);
    assert_eq!(product.category_id, Some(kitchen.id));
    assert!(dir.join(&product.image).exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_create_product_rejects_bad_input_without_writing(pool: PgPool) {
    let dir = scratch_media_dir();
    let media = MediaStore::new(&dir);
    let catalog = CatalogService::new(&pool, &media);

    assert!(matches!(
        catalog
            .create_product(form("Teapot", "free", "", Some("teapot.png")))
            .await,
        Err(CatalogError::InvalidPrice(_))
    ));
    assert!(matches!(
        catalog.create_product(form("Teapot", "2800", "", None)).await,
        Err(CatalogError::MissingImage)
    ));
    assert!(matches!(
        catalog
            .create_product(form("Teapot", "2800", "9999", Some("teapot.png")))
            .await,
        Err(CatalogError::CategoryNotFound)
    ));

    assert!(catalog.all_products().await.unwrap().is_empty());
    assert!(!dir.join("teapot.png").exists());
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_update_without_upload_keeps_image(pool: PgPool) {
    let mug = create_product(&pool, "Mug", 1200, None).await;
    let media = MediaStore::new(scratch_media_dir());
    let catalog = CatalogService::new(&pool, &media);

    let updated = catalog
        .update_product(mug.id, form("Large mug", "1500", "", None))
        .await
        .unwrap();

    assert_eq!(updated.name, "Large mug");
    assert_eq!(updated.price.minor_units(), 1500);
    assert_eq!(updated.image, mug.image);

    assert!(matches!(
        catalog
            .update_product(ProductId::new(9_999), form("X", "1", "", None))
            .await,
        Err(CatalogError::ProductNotFound)
    ));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_deleting_product_clears_carts_keeps_orders(pool: PgPool) {
    let user = create_user(&pool, "ann@example.com", UserRole::User).await;
    let mug = create_product(&pool, "Mug", 1200, None).await;
    let lamp = create_product(&pool, "Lamp", 4500, None).await;

    let placed = CheckoutService::new(&pool)
        .checkout(user.id, &checkout_request(&[(&mug, 1)]))
        .await
        .unwrap();
    let cart = CartService::new(&pool);
    cart.add_or_increment(user.id, mug.id).await.unwrap();
    cart.add_or_increment(user.id, lamp.id).await.unwrap();

    let media = MediaStore::new(scratch_media_dir());
    CatalogService::new(&pool, &media)
        .delete_product(mug.id)
        .await
        .unwrap();

    assert_eq!(cart.summary(user.id).await.unwrap().product_ids(), vec![lamp.id]);

    let detail = bazaar_storefront::db::OrderRepository::new(&pool)
        .get_detail(placed.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.lines[0].product_id, None);
    assert_eq!(detail.lines[0].product_name, "Mug");
}
