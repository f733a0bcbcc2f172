//! Checkout flows against a real database.
//!
//! Requires `DATABASE_URL`; run with `cargo test -- --ignored`.

#![allow(clippy::unwrap_used)]

use bazaar_core::{ProductId, UserRole};
use bazaar_integration_tests::{checkout_request, create_product, create_user, current};
use bazaar_storefront::db::{OrderRepository, UserRepository};
use bazaar_storefront::models::order::INITIAL_ORDER_STATUS;
use bazaar_storefront::services::cart::CartService;
use bazaar_storefront::services::checkout::{
    CheckoutError, CheckoutItem, CheckoutService, CheckoutValidationError,
};
use chrono::NaiveDate;
use sqlx::PgPool;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_checkout_creates_order_and_clears_purchased_lines(pool: PgPool) {
    let user = create_user(&pool, "ann@example.com", UserRole::User).await;
    let mug = create_product(&pool, "Mug", 1200, None).await;
    let lamp = create_product(&pool, "Lamp", 4500, None).await;
    let rug = create_product(&pool, "Rug", 8000, None).await;
    let cart = CartService::new(&pool);
    for product in [&mug, &lamp, &rug] {
        cart.add_or_increment(user.id, product.id).await.unwrap();
    }

    let placed = CheckoutService::new(&pool)
        .checkout_on(
            user.id,
            &checkout_request(&[(&mug, 2), (&lamp, 1)]),
            day(2026, 12, 28),
        )
        .await
        .unwrap();

    assert_eq!(placed.order.user_id, user.id);
    assert_eq!(placed.order.status, INITIAL_ORDER_STATUS);
    assert_eq!(placed.order.created_on, day(2026, 12, 28));
    assert_eq!(placed.order.ships_on, day(2027, 1, 4));
    let lines: Vec<(&str, i32)> = placed
        .lines
        .iter()
        .map(|l| (l.product_name.as_str(), l.quantity.get()))
        .collect();
    assert_eq!(lines, vec![("Mug", 2), ("Lamp", 1)]);
    assert_eq!(placed.total, 2 * 1200 + 4500);

    // Only the purchased products leave the cart
    let summary = cart.summary(user.id).await.unwrap();
    assert_eq!(summary.product_ids(), vec![rug.id]);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_checkout_backfills_contact_fields(pool: PgPool) {
    let user = create_user(&pool, "ann@example.com", UserRole::User).await;
    let mug = create_product(&pool, "Mug", 1200, None).await;

    let mut request = checkout_request(&[(&mug, 1)]);
    request.name = Some("Ann".to_owned());
    request.phone = Some("  ".to_owned());

    CheckoutService::new(&pool)
        .checkout(user.id, &request)
        .await
        .unwrap();

    let stored = UserRepository::new(&pool)
        .get_by_id(user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name.as_deref(), Some("Ann"));
    assert_eq!(stored.phone, None);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_missing_product_rolls_back_everything(pool: PgPool) {
    let user = create_user(&pool, "ann@example.com", UserRole::User).await;
    let mug = create_product(&pool, "Mug", 1200, None).await;
    CartService::new(&pool)
        .add_or_increment(user.id, mug.id)
        .await
        .unwrap();

    let mut request = checkout_request(&[(&mug, 1)]);
    request.name = Some("Ann".to_owned());
    request.items.push(CheckoutItem {
        product_id: ProductId::new(9_999),
        quantity: 1,
    });

    let err = CheckoutService::new(&pool)
        .checkout(user.id, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::ProductNotFound(id) if id == ProductId::new(9_999)));

    let orders = OrderRepository::new(&pool)
        .list_for_user(user.id)
        .await
        .unwrap();
    assert!(orders.is_empty());

    let stored = UserRepository::new(&pool)
        .get_by_id(user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, None);

    let summary = CartService::new(&pool).summary(user.id).await.unwrap();
    assert_eq!(summary.total_quantity, 1);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_invalid_card_writes_nothing(pool: PgPool) {
    let user = create_user(&pool, "ann@example.com", UserRole::User).await;
    let mug = create_product(&pool, "Mug", 1200, None).await;

    let mut request = checkout_request(&[(&mug, 1)]);
    request.card_number = "4111".to_owned();

    let err = CheckoutService::new(&pool)
        .checkout(user.id, &request)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Validation(CheckoutValidationError::InvalidCardNumber)
    ));

    let orders = OrderRepository::new(&pool)
        .list_for_user(user.id)
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_order_keeps_snapshot_after_product_changes(pool: PgPool) {
    let admin = create_user(&pool, "root@example.com", UserRole::Admin).await;
    let user = create_user(&pool, "ann@example.com", UserRole::User).await;
    let mug = create_product(&pool, "Mug", 1200, None).await;

    let placed = CheckoutService::new(&pool)
        .checkout(user.id, &checkout_request(&[(&mug, 2)]))
        .await
        .unwrap();

    sqlx::query("UPDATE shop.product SET price = 9900, name = 'Big mug' WHERE id = $1")
        .bind(mug.id)
        .execute(&pool)
        .await
        .unwrap();

    let detail = CheckoutService::new(&pool)
        .order_for(&current(&admin), placed.order.id)
        .await
        .unwrap();
    assert_eq!(detail.lines[0].product_name, "Mug");
    assert_eq!(detail.lines[0].unit_price.minor_units(), 1200);
    assert_eq!(detail.total, 2400);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_orders_are_private_to_owner_and_admins(pool: PgPool) {
    let ann = create_user(&pool, "ann@example.com", UserRole::User).await;
    let bob = create_user(&pool, "bob@example.com", UserRole::User).await;
    let admin = create_user(&pool, "root@example.com", UserRole::Admin).await;
    let mug = create_product(&pool, "Mug", 1200, None).await;
    let checkout = CheckoutService::new(&pool);

    let placed = checkout
        .checkout(ann.id, &checkout_request(&[(&mug, 1)]))
        .await
        .unwrap();
    let id = placed.order.id;

    assert!(checkout.order_for(&current(&ann), id).await.is_ok());
    assert!(checkout.order_for(&current(&admin), id).await.is_ok());
    assert!(matches!(
        checkout.order_for(&current(&bob), id).await,
        Err(CheckoutError::OrderNotFound)
    ));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_order_history_is_newest_first(pool: PgPool) {
    let user = create_user(&pool, "ann@example.com", UserRole::User).await;
    let mug = create_product(&pool, "Mug", 1200, None).await;
    let checkout = CheckoutService::new(&pool);

    let first = checkout
        .checkout_on(user.id, &checkout_request(&[(&mug, 1)]), day(2026, 1, 1))
        .await
        .unwrap();
    let second = checkout
        .checkout_on(user.id, &checkout_request(&[(&mug, 2)]), day(2026, 2, 1))
        .await
        .unwrap();

    let orders = OrderRepository::new(&pool)
        .list_for_user(user.id)
        .await
        .unwrap();
    let ids: Vec<_> = orders.iter().map(|o| o.order.id).collect();
    assert_eq!(ids, vec![second.order.id, first.order.id]);
    assert_eq!(orders[0].total, 2400);
}
