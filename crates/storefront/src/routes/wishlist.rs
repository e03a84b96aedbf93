//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use lumen_core::{DeliveryOption, Product, ProductId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use super::cart::{CartView, cart_view};
use crate::error::Result;
use crate::services::WishlistService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WishlistRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductId,
}

/// Result of moving a product from the wishlist into the cart.
#[derive(Debug, Serialize)]
pub struct MovedToCart {
    pub wishlist: Vec<Product>,
    pub cart: CartView,
}

/// The saved products.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<Vec<Product>>> {
    let list = WishlistService::new(state.api(), &session).list().await?;
    Ok(Json(list.items().to_vec()))
}

/// Save a product.
#[instrument(skip(state, session), fields(product_id = %req.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<WishlistRequest>,
) -> Result<Json<Vec<Product>>> {
    let list = WishlistService::new(state.api(), &session)
        .add(&req.product_id)
        .await?;
    Ok(Json(list.items().to_vec()))
}

/// Forget a saved product.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let list = WishlistService::new(state.api(), &session)
        .remove(&ProductId::new(product_id))
        .await?;
    Ok(Json(list.items().to_vec()))
}

/// Save or forget a product, whichever applies.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let list = WishlistService::new(state.api(), &session)
        .toggle(&ProductId::new(product_id))
        .await?;
    Ok(Json(list.items().to_vec()))
}

/// Move a saved product into the cart.
#[instrument(skip(state, session))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<String>,
) -> Result<Json<MovedToCart>> {
    let (list, cart) = WishlistService::new(state.api(), &session)
        .move_to_cart(&ProductId::new(product_id))
        .await?;

    Ok(Json(MovedToCart {
        wishlist: list.items().to_vec(),
        cart: cart_view(&state, &session, cart, DeliveryOption::Standard).await?,
    }))
}
