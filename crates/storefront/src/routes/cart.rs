//! Cart and checkout route handlers.
//!
//! Every cart response carries the lines, the base-currency summary and the
//! same summary in the visitor's display currency.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use lumen_core::{
    CartItem, CartSummary, DeliveryOption, Order, PaymentMethod, ProductId, ShippingDetails,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::api::orders::NewOrder;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::{CartService, CartState, CurrencyService};
use crate::state::AppState;

/// Cart display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
    /// `summary` in the visitor's display currency.
    pub display: CartSummary,
    pub signed_in: bool,
}

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CouponRequest {
    pub code: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteQuery {
    #[serde(default)]
    pub delivery: DeliveryOption,
}

/// Checkout request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping: ShippingDetails,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Summarize a cart for a response.
pub(super) async fn cart_view(
    state: &AppState,
    session: &Session,
    cart: CartState,
    delivery: DeliveryOption,
) -> Result<CartView> {
    let summary = cart.summarize(&state.pricing().totals, delivery);
    let display = CurrencyService::new(session, state.pricing())
        .present(&summary)
        .await?;
    Ok(CartView {
        items: cart.lines.into_items(),
        summary,
        display,
        signed_in: cart.signed_in,
    })
}

async fn render(
    state: &AppState,
    session: &Session,
    cart: CartState,
    delivery: DeliveryOption,
) -> Result<Json<CartView>> {
    cart_view(state, session, cart, delivery).await.map(Json)
}

/// The current cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = CartService::new(state.api(), &session).state().await?;
    render(&state, &session, cart, DeliveryOption::Standard).await
}

/// The cart priced for a delivery option.
#[instrument(skip(state, session))]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.api(), &session).state().await?;
    render(&state, &session, cart, query.delivery).await
}

/// Add a product to the cart.
#[instrument(skip(state, session), fields(product_id = %req.product_id, quantity = req.quantity))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.api(), &session)
        .add(&req.product_id, req.quantity)
        .await?;
    render(&state, &session, cart, DeliveryOption::Standard).await
}

/// Set a line's quantity. Zero removes it.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.api(), &session)
        .update_quantity(&ProductId::new(product_id), req.quantity)
        .await?;
    render(&state, &session, cart, DeliveryOption::Standard).await
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<String>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.api(), &session)
        .remove(&ProductId::new(product_id))
        .await?;
    render(&state, &session, cart, DeliveryOption::Standard).await
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = CartService::new(state.api(), &session).clear().await?;
    render(&state, &session, cart, DeliveryOption::Standard).await
}

/// Apply a coupon. Signed-in customers only.
#[instrument(skip(state, session, req))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CouponRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.api(), &session)
        .apply_coupon(&req.code)
        .await?;
    render(&state, &session, cart, DeliveryOption::Standard).await
}

/// Remove the applied coupon.
#[instrument(skip(state, session))]
pub async fn remove_coupon(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.api(), &session)
        .remove_coupon()
        .await?;
    render(&state, &session, cart, DeliveryOption::Standard).await
}

/// Place an order for the server cart.
///
/// The cart is re-fetched first so the order matches what the server holds.
/// Once the order exists the cart is emptied; a failure there is logged and
/// does not fail the checkout.
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Option<Order>>)> {
    let shipping = req.shipping.validated()?;
    let cart = CartService::new(state.api(), &session);
    let current = cart.refresh().await?;
    let coupon = current.totals.as_ref().and_then(|t| t.coupon_code.clone());

    let order = NewOrder::from_cart(&current.lines, shipping, req.payment_method, coupon)?;
    let placed = state.api().place_order(&auth.token, &order).await?;
    info!(
        user_id = %auth.user.id,
        lines = order.items.len(),
        order_id = placed.as_ref().map(|o| o.id.to_string()),
        "Order placed"
    );

    if let Err(e) = cart.clear().await {
        warn!(error = %e, "Order placed but the cart could not be emptied");
    }

    Ok((StatusCode::CREATED, Json(placed)))
}
