//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use lumen_core::{Category, NewReview, Product, ProductId, RatingSummary, Review};
use serde::Serialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::api::{Page, ProductQuery};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::RecentlyViewedService;
use crate::state::AppState;

/// A product with its derived display flags.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub discount_percent: Option<u32>,
    pub low_stock: bool,
    pub purchasable: bool,
    /// Primary image first, without duplicates.
    pub gallery: Vec<String>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            discount_percent: product.discount_percent(),
            low_stock: product.is_low_stock(),
            purchasable: product.is_purchasable(),
            gallery: product.gallery().into_iter().map(ToOwned::to_owned).collect(),
            product,
        }
    }
}

/// Reviews for a product with their aggregate.
#[derive(Debug, Serialize)]
pub struct ReviewsView {
    pub summary: RatingSummary,
    pub reviews: Vec<Review>,
}

/// Product listing with filters, sort and paging.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Page<Product>>> {
    Ok(Json(state.api().list_products(&query).await?))
}

/// Product detail. Serving it records a recently-viewed entry.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<ProductView>> {
    let id = ProductId::new(id);
    let product = state
        .api()
        .get_product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;

    // A session hiccup must not hide the product.
    if let Err(e) = RecentlyViewedService::new(&session)
        .record(product.clone())
        .await
    {
        warn!(error = %e, "Failed to record product view");
    }

    Ok(Json(ProductView::from(product)))
}

/// Products related to one product.
#[instrument(skip(state))]
pub async fn related(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let id = ProductId::new(id);
    Ok(Json(state.api().related_products(&id).await?))
}

/// All categories.
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.api().categories().await?))
}

/// A product's reviews and rating breakdown.
#[instrument(skip(state))]
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReviewsView>> {
    let reviews = state.api().list_reviews(&ProductId::new(id)).await?;
    Ok(Json(ReviewsView {
        summary: RatingSummary::from_reviews(&reviews),
        reviews,
    }))
}

/// Submit a review as the signed-in customer.
#[instrument(skip(state, auth, review))]
pub async fn submit_review(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    Json(review): Json<NewReview>,
) -> Result<(StatusCode, Json<Option<Review>>)> {
    review.validate()?;
    let review = state
        .api()
        .submit_review(&auth.token, &ProductId::new(id), &review)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}
