//! One-time-code sign-in, profile and sign-out against the mock commerce API.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use lumen_core::ProductId;
use lumen_integration_tests::{MockApi, product_json, script_sign_in, session};
use lumen_storefront::models::{AuthSession, session_keys};
use lumen_storefront::services::{AuthError, AuthService, CartService};
use serde_json::json;

// =============================================================================
// Requesting and verifying codes
// =============================================================================

#[tokio::test]
async fn test_request_otp_sends_normalized_email() {
    let mock = MockApi::start().await;
    let api = mock.client();
    let session = session();
    mock.respond(Method::POST, "/auth/otp/request", 204, json!(null));

    AuthService::new(&api, &session)
        .request_otp("  Ada@Lumen.Example ")
        .await
        .unwrap();

    let calls = mock.requests_to(&Method::POST, "/auth/otp/request");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].body, json!({ "email": "ada@lumen.example" }));
    assert!(calls[0].idempotency_key.is_some());
}

#[tokio::test]
async fn test_malformed_input_never_reaches_the_api() {
    let mock = MockApi::start().await;
    let api = mock.client();
    let session = session();
    let auth = AuthService::new(&api, &session);

    let err = auth.request_otp("not an address").await.unwrap_err();
    assert!(matches!(err, AuthError::Invalid(_)));

    let err = auth.verify_otp("ada@lumen.example", "12ab").await.unwrap_err();
    assert!(matches!(err, AuthError::Invalid(_)));

    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_rejected_code_is_invalid_code() {
    let mock = MockApi::start().await;
    let api = mock.client();
    let session = session();
    mock.respond(
        Method::POST,
        "/auth/otp/verify",
        401,
        json!({ "message": "code expired" }),
    );

    let err = AuthService::new(&api, &session)
        .verify_otp("ada@lumen.example", "123456")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCode));

    let auth: Option<AuthSession> = session.get(session_keys::AUTH).await.unwrap();
    assert!(auth.is_none());
}

#[tokio::test]
async fn test_success_without_token_is_invalid_code() {
    let mock = MockApi::start().await;
    let api = mock.client();
    let session = session();
    mock.respond(Method::POST, "/auth/otp/verify", 200, json!({ "ok": true }));

    let err = AuthService::new(&api, &session)
        .verify_otp("ada@lumen.example", "123456")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCode));
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_expired_token_signs_out_on_profile_read() {
    let mock = MockApi::start().await;
    let api = mock.client();
    let session = session();
    script_sign_in(&mock, "tok-ada");
    mock.respond(Method::GET, "/cart", 200, json!({ "cart": { "items": [] } }));
    mock.respond(Method::GET, "/wishlist", 200, json!([]));

    let auth = AuthService::new(&api, &session);
    auth.verify_otp("ada@lumen.example", "123456").await.unwrap();

    mock.respond(Method::GET, "/auth/me", 401, json!({ "message": "expired" }));
    let err = auth.profile().await.unwrap_err();
    assert!(matches!(err, AuthError::NotSignedIn));
    assert!(matches!(auth.current().await, Err(AuthError::NotSignedIn)));
}

#[tokio::test]
async fn test_profile_is_refreshed_into_session() {
    let mock = MockApi::start().await;
    let api = mock.client();
    let session = session();
    script_sign_in(&mock, "tok-ada");
    mock.respond(Method::GET, "/cart", 200, json!({ "cart": { "items": [] } }));
    mock.respond(Method::GET, "/wishlist", 200, json!([]));

    let auth = AuthService::new(&api, &session);
    auth.verify_otp("ada@lumen.example", "123456").await.unwrap();

    mock.respond(
        Method::GET,
        "/auth/me",
        200,
        json!({ "user": { "id": 77, "name": "Ada Lovelace", "email": "ada@lumen.example" } }),
    );
    let user = auth.profile().await.unwrap();
    assert_eq!(user.name, "Ada Lovelace");
    assert_eq!(auth.current().await.unwrap().user.name, "Ada Lovelace");

    let calls = mock.requests_to(&Method::GET, "/auth/me");
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer tok-ada"));
}

// =============================================================================
// Sign-out
// =============================================================================

#[tokio::test]
async fn test_logout_survives_failed_revocation_and_keeps_unpushed_lines() {
    let mock = MockApi::start().await;
    let api = mock.client();
    let session = session();
    mock.respond(
        Method::GET,
        "/products/3",
        200,
        json!({ "product": product_json(3, "Overnight Balm", "8.00") }),
    );

    let cart = CartService::new(&api, &session);
    cart.add(&ProductId::new("3"), 1).await.unwrap();

    script_sign_in(&mock, "tok-ada");
    mock.respond(Method::POST, "/cart/items", 500, json!({ "message": "boom" }));
    mock.respond(Method::GET, "/cart", 200, json!({ "cart": { "items": [] } }));
    mock.respond(Method::GET, "/wishlist", 200, json!([]));
    mock.respond(Method::POST, "/auth/logout", 500, json!({ "message": "boom" }));

    let auth = AuthService::new(&api, &session);
    let signed_in = auth.verify_otp("ada@lumen.example", "123456").await.unwrap();
    assert_eq!(signed_in.cart.failed, 1);

    auth.logout().await.unwrap();

    let revoke = mock.requests_to(&Method::POST, "/auth/logout");
    assert_eq!(revoke.len(), 1);
    assert_eq!(revoke[0].authorization.as_deref(), Some("Bearer tok-ada"));

    assert!(matches!(auth.current().await, Err(AuthError::NotSignedIn)));
    let after = cart.state().await.unwrap();
    assert!(!after.signed_in);
    assert_eq!(after.lines.item_count(), 1);
}

#[tokio::test]
async fn test_logout_as_guest_is_a_no_op() {
    let mock = MockApi::start().await;
    let api = mock.client();
    let session = session();

    AuthService::new(&api, &session).logout().await.unwrap();
    assert!(mock.requests().is_empty());
}
