//! Product comparison and recently viewed handlers. Both live in the
//! session only.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use lumen_core::{Product, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::services::{CompareService, CompareView, RecentlyViewedService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductId,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    /// Product to leave out, usually the one on screen.
    pub exclude: Option<String>,
}

/// The comparison table.
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CompareView>> {
    Ok(Json(CompareService::new(state.api(), &session).view().await?))
}

/// Add a product to the comparison.
#[instrument(skip(state, session), fields(product_id = %req.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CompareRequest>,
) -> Result<Json<CompareView>> {
    let view = CompareService::new(state.api(), &session)
        .add(&req.product_id)
        .await?;
    Ok(Json(view))
}

/// Drop a product from the comparison.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<String>,
) -> Result<Json<CompareView>> {
    let view = CompareService::new(state.api(), &session)
        .remove(&ProductId::new(product_id))
        .await?;
    Ok(Json(view))
}

pub async fn clear(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    CompareService::new(state.api(), &session).clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Recently viewed products, most recent first.
pub async fn recently_viewed(
    session: Session,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Product>>> {
    let exclude = query.exclude.map(ProductId::new);
    let items = RecentlyViewedService::new(&session)
        .list(exclude.as_ref())
        .await?;
    Ok(Json(items))
}

pub async fn clear_recently_viewed(session: Session) -> Result<StatusCode> {
    RecentlyViewedService::new(&session).clear().await?;
    Ok(StatusCode::NO_CONTENT)
}
