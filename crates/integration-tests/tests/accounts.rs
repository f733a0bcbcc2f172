//! Registration, login, profile edits and account deletion against a real
//! database.
//!
//! Requires `DATABASE_URL`; run with `cargo test -- --ignored`.

#![allow(clippy::unwrap_used)]

use bazaar_core::UserRole;
use bazaar_integration_tests::{
    TEST_PASSWORD, checkout_request, create_product, create_user, current, scratch_media_dir,
};
use bazaar_storefront::db::{OrderRepository, UserRepository};
use bazaar_storefront::services::account::{AccountError, AccountService, ProfileEdit, ProfileView};
use bazaar_storefront::services::auth::{AuthError, AuthService};
use bazaar_storefront::services::cart::CartService;
use bazaar_storefront::services::checkout::CheckoutService;
use bazaar_storefront::services::media::MediaStore;
use sqlx::PgPool;

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_register_then_login(pool: PgPool) {
    let auth = AuthService::new(&pool);

    let user = auth
        .register(" Ann@Example.com ", TEST_PASSWORD, TEST_PASSWORD)
        .await
        .unwrap();
    assert_eq!(user.email.as_str(), "ann@example.com");
    assert_eq!(user.role, UserRole::User);

    let logged_in = auth.login("ANN@example.com", TEST_PASSWORD).await.unwrap();
    assert_eq!(logged_in.id, user.id);

    assert!(matches!(
        auth.login("ann@example.com", "wrong password").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.login("nobody@example.com", TEST_PASSWORD).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_register_rejects_duplicates_and_mismatches(pool: PgPool) {
    let auth = AuthService::new(&pool);
    auth.register("ann@example.com", TEST_PASSWORD, TEST_PASSWORD)
        .await
        .unwrap();

    assert!(matches!(
        auth.register("ANN@example.com", TEST_PASSWORD, TEST_PASSWORD)
            .await,
        Err(AuthError::UserAlreadyExists)
    ));
    assert!(matches!(
        auth.register("bob@example.com", TEST_PASSWORD, "something else")
            .await,
        Err(AuthError::PasswordMismatch)
    ));
    assert!(matches!(
        auth.register("bob@example.com", "short", "short").await,
        Err(AuthError::WeakPassword(_))
    ));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_profile_edit_changes_email_and_password(pool: PgPool) {
    let user = create_user(&pool, "ann@example.com", UserRole::User).await;
    create_user(&pool, "bob@example.com", UserRole::User).await;
    let media = MediaStore::new(scratch_media_dir());
    let accounts = AccountService::new(&pool, &media);

    let edited = accounts
        .edit(
            user.id,
            &ProfileEdit {
                email: "ann.new@example.com".to_owned(),
                password: Some("a brand new secret".to_owned()),
                name: Some("Ann".to_owned()),
                surname: None,
                phone: Some("555-0100".to_owned()),
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.email.as_str(), "ann.new@example.com");
    assert_eq!(edited.name.as_deref(), Some("Ann"));
    assert_eq!(edited.phone.as_deref(), Some("555-0100"));

    let auth = AuthService::new(&pool);
    assert!(auth.login("ann.new@example.com", "a brand new secret").await.is_ok());
    assert!(auth.login("ann.new@example.com", TEST_PASSWORD).await.is_err());

    let taken = accounts
        .edit(
            user.id,
            &ProfileEdit {
                email: "bob@example.com".to_owned(),
                password: None,
                name: None,
                surname: None,
                phone: None,
            },
        )
        .await;
    assert!(matches!(
        taken,
        Err(AccountError::Auth(AuthError::UserAlreadyExists))
    ));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_profile_depends_on_role(pool: PgPool) {
    let user = create_user(&pool, "ann@example.com", UserRole::User).await;
    let admin = create_user(&pool, "root@example.com", UserRole::Admin).await;
    let mug = create_product(&pool, "Mug", 1200, None).await;
    CheckoutService::new(&pool)
        .checkout(user.id, &checkout_request(&[(&mug, 1)]))
        .await
        .unwrap();

    let media = MediaStore::new(scratch_media_dir());
    let accounts = AccountService::new(&pool, &media);

    match accounts.profile(&current(&user)).await.unwrap() {
        ProfileView::Customer { user: shown, orders } => {
            assert_eq!(shown.id, user.id);
            assert_eq!(orders.len(), 1);
        }
        ProfileView::Admin { .. } => panic!("customer got the admin profile"),
    }

    match accounts.profile(&current(&admin)).await.unwrap() {
        ProfileView::Admin { products, .. } => assert_eq!(products.len(), 1),
        ProfileView::Customer { .. } => panic!("admin got the customer profile"),
    }
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_delete_account_removes_carts_and_orders(pool: PgPool) {
    let ann = create_user(&pool, "ann@example.com", UserRole::User).await;
    let bob = create_user(&pool, "bob@example.com", UserRole::User).await;
    let mug = create_product(&pool, "Mug", 1200, None).await;

    for user in [&ann, &bob] {
        CheckoutService::new(&pool)
            .checkout(user.id, &checkout_request(&[(&mug, 1)]))
            .await
            .unwrap();
        CartService::new(&pool)
            .add_or_increment(user.id, mug.id)
            .await
            .unwrap();
    }

    let media = MediaStore::new(scratch_media_dir());
    let accounts = AccountService::new(&pool, &media);
    accounts.delete(ann.id).await.unwrap();

    assert!(UserRepository::new(&pool).get_by_id(ann.id).await.unwrap().is_none());
    let orders = OrderRepository::new(&pool);
    assert!(orders.list_for_user(ann.id).await.unwrap().is_empty());

    // Other accounts are untouched
    assert_eq!(orders.list_for_user(bob.id).await.unwrap().len(), 1);
    assert_eq!(
        CartService::new(&pool).summary(bob.id).await.unwrap().total_quantity,
        1
    );

    assert!(matches!(
        accounts.delete(ann.id).await,
        Err(AccountError::NotFound)
    ));
}
