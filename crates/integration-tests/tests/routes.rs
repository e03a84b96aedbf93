//! The HTTP surface, driven without a listener.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use lumen_integration_tests::{MockApi, cart_json, product_json, script_sign_in};
use lumen_storefront::middleware::session_layer;
use lumen_storefront::routes;
use lumen_storefront::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

fn app(mock: &MockApi) -> Router {
    let state = AppState::without_database(mock.storefront_config());
    routes::routes()
        .layer(session_layer(MemoryStore::default(), state.config()))
        .with_state(state)
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.9");
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn with_cookie(mut req: Request<Body>, cookie: &str) -> Request<Body> {
    req.headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    req
}

/// Sign in through the API and return the session cookie to replay.
async fn sign_in(app: &Router, mock: &MockApi) -> String {
    script_sign_in(mock, "tok-ada");
    mock.respond(Method::GET, "/wishlist", 200, json!([]));
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/auth/otp/verify",
            Some(json!({ "identifier": "ada@lumen.example", "code": "123456" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_owned()
}

fn shipping() -> Value {
    json!({
        "fullName": " Ada Lovelace ",
        "email": "ADA@Lumen.example",
        "phone": "+1 (415) 555-0100",
        "addressLine1": "12 Ivy Lane",
        "city": "Portland",
        "state": "OR",
        "postalCode": "97201",
        "country": "US",
        "deliveryOption": "express"
    })
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let mock = MockApi::start().await;
    let app = app(&mock);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");

    let (status, _) = send(&app, request(Method::GET, "/health/ready", None)).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// API
// =============================================================================

#[tokio::test]
async fn test_empty_guest_cart() {
    let mock = MockApi::start().await;
    let app = app(&mock);

    let (status, body) = send(&app, request(Method::GET, "/api/cart", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["signedIn"], json!(false));
}

#[tokio::test]
async fn test_account_requires_sign_in() {
    let mock = MockApi::start().await;
    let app = app(&mock);

    let (status, body) = send(&app, request(Method::GET, "/api/account/orders", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let mock = MockApi::start().await;
    let app = app(&mock);

    let (status, body) = send(&app, request(Method::GET, "/api/products/999", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_product_detail_carries_derived_fields() {
    let mock = MockApi::start().await;
    let app = app(&mock);
    let mut product = product_json(4, "Retinol Night Cream", "30.00");
    product["originalPrice"] = json!("40.00");
    product["stock"] = json!(3);
    mock.respond(Method::GET, "/products/4", 200, json!({ "product": product }));

    let (status, body) = send(&app, request(Method::GET, "/api/products/4", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Retinol Night Cream");
    assert_eq!(body["discountPercent"], json!(25));
    assert_eq!(body["lowStock"], json!(true));
    assert_eq!(body["purchasable"], json!(true));
    assert_eq!(body["gallery"], json!(["https://cdn.lumen.example/4.jpg"]));
}

#[tokio::test]
async fn test_malformed_otp_request_is_rejected_locally() {
    let mock = MockApi::start().await;
    let app = app(&mock);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/auth/otp/request",
            Some(json!({ "identifier": "nobody" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_unsupported_currency_is_rejected() {
    let mock = MockApi::start().await;
    let app = app(&mock);

    let (status, _) = send(
        &app,
        request(Method::PUT, "/api/currency", Some(json!({ "currency": "XYZ" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_quantity_is_rejected_locally() {
    let mock = MockApi::start().await;
    let app = app(&mock);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/cart/items",
            Some(json!({ "product_id": "1", "quantity": 4_294_967_295_u32 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "quantity_too_large");
    assert!(mock.requests().is_empty());
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_requires_sign_in() {
    let mock = MockApi::start().await;
    let app = app(&mock);

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/checkout",
            Some(json!({ "shipping": shipping() })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_checkout_orders_the_refreshed_server_cart() {
    let mock = MockApi::start().await;
    let app = app(&mock);
    mock.respond(
        Method::GET,
        "/cart",
        200,
        json!({
            "cart": {
                "items": [{ "id": "line-0", "product": product_json(1, "Vitamin C Serum", "24.00"), "quantity": 2 }],
                "totals": { "couponCode": "GLOW10", "discount": "4.80" }
            }
        }),
    );
    let cookie = sign_in(&app, &mock).await;
    mock.respond(
        Method::POST,
        "/orders",
        201,
        json!({ "order": { "id": "ord-1", "total": "47.20" } }),
    );
    // Emptying the cart afterwards is best effort.
    mock.respond(Method::DELETE, "/cart", 500, json!({}));

    let (status, body) = send(
        &app,
        with_cookie(
            request(
                Method::POST,
                "/api/checkout",
                Some(json!({ "shipping": shipping() })),
            ),
            &cookie,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "ord-1");

    // Once on sign-in, once more before ordering.
    assert_eq!(mock.requests_to(&Method::GET, "/cart").len(), 2);

    let orders = mock.requests_to(&Method::POST, "/orders");
    assert_eq!(orders.len(), 1);
    let placed = &orders[0];
    assert_eq!(placed.authorization.as_deref(), Some("Bearer tok-ada"));
    assert!(placed.idempotency_key.is_some());
    assert_eq!(placed.body["items"], json!([{ "productId": "1", "quantity": 2 }]));
    assert_eq!(placed.body["couponCode"], "GLOW10");
    assert_eq!(placed.body["paymentMethod"], "card");
    assert_eq!(placed.body["deliveryOption"], "express");
    assert_eq!(placed.body["shippingDetails"]["fullName"], "Ada Lovelace");
    assert_eq!(placed.body["shippingDetails"]["email"], "ada@lumen.example");

    assert_eq!(mock.requests_to(&Method::DELETE, "/cart").len(), 1);
}

#[tokio::test]
async fn test_checkout_with_empty_cart_places_nothing() {
    let mock = MockApi::start().await;
    let app = app(&mock);
    mock.respond(Method::GET, "/cart", 200, cart_json(&[]));
    let cookie = sign_in(&app, &mock).await;

    let (status, body) = send(
        &app,
        with_cookie(
            request(
                Method::POST,
                "/api/checkout",
                Some(json!({ "shipping": shipping() })),
            ),
            &cookie,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(mock.requests_to(&Method::POST, "/orders").is_empty());
}
