//! The HTTP wrapper and envelope handling against the mock commerce API.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::Method;
use lumen_core::{ProductId, SortOrder};
use lumen_integration_tests::{MockApi, cart_json, product_json};
use lumen_storefront::api::{ApiError, ProductQuery};
use serde_json::json;

// =============================================================================
// Retry and idempotency
// =============================================================================

#[tokio::test]
async fn test_timeout_is_retried_once_with_same_idempotency_key() {
    let mock = MockApi::start().await;
    let api = mock.client();

    mock.respond_once_after(
        Duration::from_millis(1500),
        Method::POST,
        "/cart/items",
        200,
        json!({}),
    );
    mock.respond(
        Method::POST,
        "/cart/items",
        200,
        cart_json(&[(product_json(1, "Vitamin C Serum", "24.00"), 1)]),
    );

    let cart = api
        .add_cart_item("tok", &ProductId::new("1"), 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cart.lines.item_count(), 1);

    let calls = mock.requests_to(&Method::POST, "/cart/items");
    assert_eq!(calls.len(), 2);
    let key = calls[0].idempotency_key.clone().unwrap();
    assert!(!key.is_empty());
    assert_eq!(calls[1].idempotency_key.as_deref(), Some(key.as_str()));
}

#[tokio::test]
async fn test_second_timeout_gives_up() {
    let mock = MockApi::start().await;
    let api = mock.client();

    for _ in 0..2 {
        mock.respond_once_after(
            Duration::from_millis(1500),
            Method::DELETE,
            "/cart",
            200,
            json!({}),
        );
    }

    let err = api.clear_cart("tok").await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout { attempts: 2, .. }));
    assert_eq!(mock.requests_to(&Method::DELETE, "/cart").len(), 2);
}

#[tokio::test]
async fn test_error_status_is_not_retried() {
    let mock = MockApi::start().await;
    let api = mock.client();
    mock.respond(
        Method::POST,
        "/cart/items",
        503,
        json!({ "message": "try later" }),
    );

    let err = api
        .add_cart_item("tok", &ProductId::new("1"), 1)
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(503));
    assert_eq!(mock.requests_to(&Method::POST, "/cart/items").len(), 1);
}

#[tokio::test]
async fn test_unauthorized_is_its_own_error() {
    let mock = MockApi::start().await;
    let api = mock.client();
    mock.respond(Method::GET, "/cart", 401, json!({ "error": "token expired" }));

    let err = api.get_cart("stale").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn test_reads_carry_no_idempotency_key() {
    let mock = MockApi::start().await;
    let api = mock.client();
    mock.respond(
        Method::GET,
        "/categories",
        200,
        json!({ "categories": [{ "id": "skincare", "name": "Skincare" }] }),
    );

    let categories = api.categories().await.unwrap();
    assert_eq!(categories.len(), 1);

    let calls = mock.requests_to(&Method::GET, "/categories");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].idempotency_key.is_none());
    assert!(calls[0].authorization.is_none());
}

// =============================================================================
// Envelopes
// =============================================================================

#[tokio::test]
async fn test_product_listing_nested_envelope_with_meta() {
    let mock = MockApi::start().await;
    let api = mock.client();
    mock.respond(
        Method::GET,
        "/products",
        200,
        json!({
            "data": { "items": [product_json(1, "Serum", "24.00"), product_json(2, "Toner", "12.50")] },
            "meta": { "total": 42, "page": 3, "pageSize": 2, "totalPages": 21 }
        }),
    );

    let query = ProductQuery {
        category: Some("skincare".to_string()),
        sort: Some(SortOrder::PriceAsc),
        page: Some(3),
        limit: Some(2),
        ..ProductQuery::default()
    };
    let page = api.list_products(&query).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 42);
    assert_eq!(page.page, 3);
    assert_eq!(page.limit, 2);
    assert_eq!(page.total_pages, 21);

    let calls = mock.requests_to(&Method::GET, "/products");
    let sent = calls[0].query.clone().unwrap();
    assert!(sent.contains("category=skincare"));
    assert!(sent.contains("page=3"));
    assert!(sent.contains("limit=2"));
}

#[tokio::test]
async fn test_bare_array_listing_skips_malformed_entries() {
    let mock = MockApi::start().await;
    let api = mock.client();
    mock.respond(
        Method::GET,
        "/products",
        200,
        json!([product_json(1, "Serum", "24.00"), { "id": 9 }, product_json(3, "Balm", "8.00")]),
    );

    let page = api.list_products(&ProductQuery::default()).await.unwrap();
    let ids: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["1", "3"]);
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_garbage_body_reads_as_empty() {
    let mock = MockApi::start().await;
    let api = mock.client();
    mock.respond(Method::GET, "/products", 200, json!("maintenance window"));

    let page = api.list_products(&ProductQuery::default()).await.unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_missing_product_is_none_and_found_product_is_cached() {
    let mock = MockApi::start().await;
    let api = mock.client();
    mock.respond(
        Method::GET,
        "/products/5",
        200,
        json!({ "item": product_json(5, "Clay Mask", "18.00") }),
    );

    assert!(api.get_product(&ProductId::new("404")).await.unwrap().is_none());

    let first = api.get_product(&ProductId::new("5")).await.unwrap().unwrap();
    let second = api.get_product(&ProductId::new("5")).await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(mock.requests_to(&Method::GET, "/products/5").len(), 1);
}

#[tokio::test]
async fn test_ids_are_percent_encoded_in_paths() {
    let mock = MockApi::start().await;
    let api = mock.client();

    assert!(api.get_product(&ProductId::new("a/b")).await.unwrap().is_none());
    let calls = mock.requests();
    assert_eq!(calls[0].path, "/products/a%2Fb");
}
