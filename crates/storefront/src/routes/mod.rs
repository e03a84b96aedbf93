//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (session database)
//!
//! # Catalog
//! GET  /api/products                    - Listing (filters, sort, paging)
//! GET  /api/products/{id}               - Detail (records recently viewed)
//! GET  /api/products/{id}/related       - Related products
//! GET  /api/products/{id}/reviews       - Reviews with rating summary
//! POST /api/products/{id}/reviews       - Submit review (auth)
//! GET  /api/categories                  - Categories
//!
//! # Cart
//! GET    /api/cart                      - Cart with summary
//! GET    /api/cart/quote?delivery=      - Cart priced for a delivery option
//! POST   /api/cart/items                - Add product
//! PUT    /api/cart/items/{product_id}   - Set quantity
//! DELETE /api/cart/items/{product_id}   - Remove line
//! DELETE /api/cart                      - Empty cart
//! POST   /api/cart/coupon               - Apply coupon (auth)
//! DELETE /api/cart/coupon               - Remove coupon (auth)
//! POST   /api/checkout                  - Place order (auth)
//!
//! # Lists
//! GET|POST /api/wishlist, DELETE /api/wishlist/{product_id}
//! POST     /api/wishlist/{product_id}/toggle
//! POST     /api/wishlist/{product_id}/move-to-cart
//! GET|POST|DELETE /api/compare, DELETE /api/compare/{product_id}
//! GET|DELETE /api/recently-viewed
//! GET|PUT  /api/currency
//!
//! # Auth (OTP endpoints rate limited)
//! POST /api/auth/otp/request, POST /api/auth/otp/verify
//! POST /api/auth/logout, GET|PUT /api/auth/me
//!
//! # Account (auth)
//! /api/account/orders, /addresses, /returns, /tickets, /notifications
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod compare;
pub mod currency;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/related", get(products::related))
        .route(
            "/{id}/reviews",
            get(products::reviews).post(products::submit_review),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/quote", get(cart::quote))
        .route("/items", post(cart::add))
        .route("/items/{product_id}", put(cart::update).delete(cart::remove))
        .route(
            "/coupon",
            post(cart::apply_coupon).delete(cart::remove_coupon),
        )
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show).post(wishlist::add))
        .route("/{product_id}", delete(wishlist::remove))
        .route("/{product_id}/toggle", post(wishlist::toggle))
        .route("/{product_id}/move-to-cart", post(wishlist::move_to_cart))
}

/// Create the comparison routes router.
pub fn compare_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(compare::show).post(compare::add).delete(compare::clear),
        )
        .route("/{product_id}", delete(compare::remove))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let otp = Router::new()
        .route("/otp/request", post(auth::request_otp))
        .route("/otp/verify", post(auth::verify_otp))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(otp)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me).put(auth::update_me))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route("/orders/{id}/cancel", post(account::cancel_order))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            put(account::update_address).delete(account::delete_address),
        )
        .route("/addresses/{id}/default", post(account::set_default_address))
        .route(
            "/returns",
            get(account::returns).post(account::create_return),
        )
        .route("/tickets", get(account::tickets).post(account::create_ticket))
        .route("/tickets/{id}", get(account::ticket))
        .route("/tickets/{id}/messages", post(account::reply_to_ticket))
        .route("/notifications", get(account::notifications))
        .route(
            "/notifications/{id}/read",
            post(account::mark_notification_read),
        )
        .route(
            "/notifications/read-all",
            post(account::mark_all_notifications_read),
        )
}

/// Create the JSON API router, mounted at `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .route("/categories", get(products::categories))
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout))
        .nest("/wishlist", wishlist_routes())
        .nest("/compare", compare_routes())
        .route(
            "/recently-viewed",
            get(compare::recently_viewed).delete(compare::clear_recently_viewed),
        )
        .route("/currency", get(currency::show).put(currency::select))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the session database is reachable. Without a database (sessions
/// held in memory) the server is always ready.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
