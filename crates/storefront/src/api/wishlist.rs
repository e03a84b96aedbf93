//! Server wishlist endpoints for signed-in customers.

use lumen_core::{Product, ProductId};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use super::envelope;
use super::{ApiClient, ApiError, Auth};

/// A wishlist element: either a bare product or a record wrapping one.
#[derive(Deserialize)]
#[serde(untagged)]
enum WishlistEntry {
    Wrapped { product: Product },
    Bare(Product),
}

impl From<WishlistEntry> for Product {
    fn from(entry: WishlistEntry) -> Self {
        match entry {
            WishlistEntry::Wrapped { product } | WishlistEntry::Bare(product) => product,
        }
    }
}

/// Products on a wishlist response.
#[must_use]
pub fn parse_wishlist(body: &Value) -> Vec<Product> {
    let entries: Vec<WishlistEntry> = match body.get("wishlist") {
        Some(inner) => envelope::list(inner),
        None => envelope::list(body),
    };
    entries.into_iter().map(Product::from).collect()
}

impl ApiClient {
    /// The customer's saved products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_wishlist(&self, token: &str) -> Result<Vec<Product>, ApiError> {
        let body = self.get(&["wishlist"], &[], Auth::Bearer(token)).await?;
        Ok(parse_wishlist(&body))
    }

    /// Save a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(&self, token: &str, product_id: &ProductId) -> Result<(), ApiError> {
        self.call(
            Method::POST,
            &["wishlist"],
            &[],
            Some(&json!({ "productId": product_id })),
            Auth::Bearer(token),
        )
        .await?;
        Ok(())
    }

    /// Unsave a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<(), ApiError> {
        self.call::<()>(
            Method::DELETE,
            &["wishlist", product_id.as_str()],
            &[],
            None,
            Auth::Bearer(token),
        )
        .await?;
        Ok(())
    }
}
