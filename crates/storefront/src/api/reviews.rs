//! Product review endpoints.

use lumen_core::{NewReview, ProductId, Review};
use reqwest::Method;
use tracing::instrument;

use super::cache::CacheKey;
use super::envelope;
use super::{ApiClient, ApiError, Auth};

impl ApiClient {
    /// Reviews for a product, as the API orders them.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn list_reviews(&self, product_id: &ProductId) -> Result<Vec<Review>, ApiError> {
        let body = self
            .get(&["products", product_id.as_str(), "reviews"], &[], Auth::Anonymous)
            .await?;
        Ok(envelope::list(&body))
    }

    /// Submit a review. The cached product is dropped so its rating refreshes.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the review or the request fails.
    #[instrument(skip(self, token, review), fields(product_id = %product_id))]
    pub async fn submit_review(
        &self,
        token: &str,
        product_id: &ProductId,
        review: &NewReview,
    ) -> Result<Option<Review>, ApiError> {
        let body = self
            .call(
                Method::POST,
                &["products", product_id.as_str(), "reviews"],
                &[],
                Some(review),
                Auth::Bearer(token),
            )
            .await?;
        self.cache()
            .invalidate(&CacheKey::Product(product_id.clone()))
            .await;
        Ok(envelope::single(&body, &["review"]))
    }
}
