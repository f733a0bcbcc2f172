//! HTTP route handlers for the storefront.
//!
//! Handlers return JSON view data; every redirect target below is a page
//! that a front end renders.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database)
//!
//! # Catalog
//! GET  /                            - All products
//! GET  /catalog?category=..         - Products in any of the categories
//! GET  /product/{name}/{id}         - Product detail + recommendations
//!
//! # Auth
//! GET  /login, POST /login          - Login (rate limited)
//! GET  /registr, POST /registr      - Registration (rate limited)
//! POST /logout                      - Logout
//!
//! # Account (requires auth)
//! GET  /profile                     - Profile + orders, or admin dashboard
//! POST /profile/edit                - Edit profile
//! POST /profile/delete              - Delete own account
//!
//! # Cart (requires auth)
//! GET  /cart                        - Cart summary
//! POST /cart                        - `operation` + / - on one product
//! POST /cart/delete/{product_id}    - Remove a line
//!
//! # Orders (requires auth)
//! GET  /order                       - Checkout view
//! POST /order                       - Place order (JSON)
//! GET  /order/products/{id}         - Order detail (owner or admin)
//!
//! # Back-office (requires admin)
//! GET  /admin                       - Dashboard
//! GET  /admin/product               - Products
//! POST /admin/product/add           - Create (multipart)
//! GET  /admin/product/edit/{id}     - Product + categories
//! POST /admin/product/edit/{id}     - Update (multipart)
//! POST /admin/product/delete/{id}   - Delete
//! GET  /admin/category              - Categories
//! POST /admin/category/add          - Create
//! POST /admin/category/edit/{id}    - Rename
//! POST /admin/category/delete/{id}  - Delete
//!
//! GET  /media/*                     - Uploaded images
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod home;
pub mod order;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use sentry_tower::{NewSentryLayer, SentryHttpLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth_rate_limiter, create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Login, registration and logout. Only the POSTs are rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route(
            "/registr",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Profile routes.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(account::profile))
        .route("/profile/edit", post(account::edit))
        .route("/profile/delete", post(account::delete))
}

/// Cart routes.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show).post(cart::update))
        .route("/cart/delete/{product_id}", post(cart::remove))
}

/// Checkout and order routes.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/order", get(order::checkout_page).post(order::place))
        .route("/order/products/{id}", get(order::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/", get(home::home))
        .route("/catalog", get(home::catalog))
        .route("/product/{name}/{id}", get(products::show))
        .merge(auth_routes())
        .merge(account_routes())
        .merge(cart_routes())
        .merge(order_routes())
        .nest("/admin", admin::routes())
}

/// The complete application: routes, `/media` files and the middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());
    let media = ServeDir::new(state.media().dir());

    Router::new()
        .merge(routes())
        .nest_service("/media", media)
        .layer(session_layer)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(NewSentryLayer::new_from_top())
        .layer(SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
