//! Catalog records: products, categories and reviews.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, ReviewId};

/// Stock level at or below which a product is flagged as running low.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// A product as served by the catalog API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_type: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

const fn default_in_stock() -> bool {
    true
}

impl Product {
    /// Whether the product can be added to a cart.
    ///
    /// A reported stock of zero overrides a stale `in_stock` flag.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        self.in_stock && self.stock != Some(0)
    }

    /// Percentage saved against the original price, rounded down.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?;
        if original <= self.price || original <= Decimal::ZERO {
            return None;
        }
        ((original - self.price) / original * Decimal::ONE_HUNDRED)
            .floor()
            .to_u32()
    }

    /// Stock is known and between 1 and [`LOW_STOCK_THRESHOLD`].
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.stock
            .is_some_and(|s| (1..=LOW_STOCK_THRESHOLD).contains(&s))
    }

    /// All images, the primary image first, without duplicates.
    #[must_use]
    pub fn gallery(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(self.images.len() + 1);
        for url in std::iter::once(&self.image).chain(&self.images) {
            if !url.is_empty() && !out.contains(&url.as_str()) {
                out.push(url);
            }
        }
        out
    }
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_count: Option<u32>,
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    Rating,
    Newest,
}

impl SortOrder {
    /// Query-string value understood by the catalog API.
    #[must_use]
    pub const fn as_query(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Rating => "rating",
            Self::Newest => "newest",
        }
    }
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    #[serde(default, alias = "product")]
    pub product_id: Option<ProductId>,
    #[serde(default, alias = "userName")]
    pub author: String,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "comment")]
    pub body: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Errors validating a new review before it is submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error("rating must be between 1 and 5")]
    Rating,
    #[error("review text is required")]
    EmptyBody,
    #[error("review text must be at most {0} characters")]
    TooLong(usize),
}

/// A review as submitted by a signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
}

impl NewReview {
    pub const MAX_BODY: usize = 2000;

    /// Check the rating range and body length.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ReviewError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ReviewError::Rating);
        }
        let body = self.body.trim();
        if body.is_empty() {
            return Err(ReviewError::EmptyBody);
        }
        if body.chars().count() > Self::MAX_BODY {
            return Err(ReviewError::TooLong(Self::MAX_BODY));
        }
        Ok(())
    }
}

/// Aggregate view of a product's reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: u32,
    /// Review counts for 1 through 5 stars.
    pub histogram: [u32; 5],
}

impl RatingSummary {
    /// Summarize reviews, ignoring ratings outside 1-5.
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut histogram = [0_u32; 5];
        let mut total = 0_u32;
        for review in reviews {
            if let Some(slot) = usize::from(review.rating)
                .checked_sub(1)
                .and_then(|i| histogram.get_mut(i))
            {
                *slot += 1;
                total += u32::from(review.rating);
            }
        }
        let count: u32 = histogram.iter().sum();
        let average = if count == 0 {
            0.0
        } else {
            (f64::from(total) / f64::from(count) * 10.0).round() / 10.0
        };
        Self {
            average,
            count,
            histogram,
        }
    }
}
