//! Logged-in sessions outliving a role change or the account itself.
//!
//! Requires `DATABASE_URL`; run with `cargo test -- --ignored`.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use bazaar_core::{Email, UserRole};
use bazaar_integration_tests::{
    create_product, create_user, live_app, location, login, post_form,
};
use bazaar_storefront::db::{CategoryRepository, UserRepository};
use bazaar_storefront::services::cart::CartService;
use sqlx::PgPool;

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_demoted_admin_loses_admin_routes(pool: PgPool) {
    create_user(&pool, "boss@example.com", UserRole::Admin).await;
    let app = live_app(pool.clone());
    let cookie = login(&app, "boss@example.com").await;

    let response = post_form(&app, "/admin/category/add", Some(&cookie), "name=Before").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/category");

    UserRepository::new(&pool)
        .set_role(&Email::parse("boss@example.com").unwrap(), UserRole::User)
        .await
        .unwrap();

    let response = post_form(&app, "/admin/category/add", Some(&cookie), "name=After").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let names: Vec<String> = CategoryRepository::new(&pool)
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["Before"]);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_promoted_user_gets_admin_routes_without_relogin(pool: PgPool) {
    create_user(&pool, "clerk@example.com", UserRole::User).await;
    let app = live_app(pool.clone());
    let cookie = login(&app, "clerk@example.com").await;

    let response = post_form(&app, "/admin/category/add", Some(&cookie), "name=Early").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    UserRepository::new(&pool)
        .set_role(&Email::parse("clerk@example.com").unwrap(), UserRole::Admin)
        .await
        .unwrap();

    let response = post_form(&app, "/admin/category/add", Some(&cookie), "name=Late").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(CategoryRepository::new(&pool).list_all().await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_deleted_account_ends_other_sessions(pool: PgPool) {
    let user = create_user(&pool, "twice@example.com", UserRole::User).await;
    let mug = create_product(&pool, "Mug", 800, None).await;
    let app = live_app(pool.clone());
    let laptop = login(&app, "twice@example.com").await;
    let phone = login(&app, "twice@example.com").await;
    assert_ne!(laptop, phone);

    let response = post_form(&app, "/profile/delete", Some(&laptop), "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let body = format!("product_id={}&operation=%2B", mug.id);
    let response = post_form(&app, "/cart", Some(&phone), &body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fcart");

    // The stale session was dropped, not just rejected once
    let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tower_sessions.session")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
    assert!(
        CartService::new(&pool)
            .list_for_user(user.id)
            .await
            .unwrap()
            .is_empty()
    );
}
