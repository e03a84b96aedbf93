//! Catalog endpoints: products, related products and categories.
//!
//! Reads are cached for the configured TTL. Search results are not cached.

use lumen_core::{Category, Product, ProductId, SortOrder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::envelope::{self, Page};
use super::{ApiClient, ApiError, Auth};

/// Largest page size forwarded to the API.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Filters, sort and paging for a product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub skin_type: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductQuery {
    /// Query-string pairs, skipping unset and blank filters.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let text = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
        };

        let mut pairs = Vec::new();
        if let Some(category) = text(&self.category) {
            pairs.push(("category", category));
        }
        if let Some(search) = text(&self.search) {
            pairs.push(("search", search));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_query().to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.max(1).to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()));
        }
        if let Some(skin_type) = text(&self.skin_type) {
            pairs.push(("skinType", skin_type));
        }
        if let Some(brand) = text(&self.brand) {
            pairs.push(("brand", brand));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice", max.to_string()));
        }
        pairs
    }

    fn is_search(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

fn cache_key(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

impl ApiClient {
    /// List products matching a query.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let pairs = query.to_pairs();
        let key = CacheKey::Products(cache_key(&pairs));

        let cacheable = !query.is_search();
        if cacheable && let Some(CacheValue::Products(page)) = self.cache().get(&key).await {
            debug!("Cache hit for product listing");
            return Ok(page);
        }

        let body = self.get(&["products"], &pairs, Auth::Anonymous).await?;
        let page = envelope::page(&body, query.limit.map(u64::from));

        if cacheable {
            self.cache().insert(key, CacheValue::Products(page.clone())).await;
        }
        Ok(page)
    }

    /// Get a product by id. A 404 or unreadable body yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails for another reason.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cache().get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let body = match self.get(&["products", id.as_str()], &[], Auth::Anonymous).await {
            Ok(body) => body,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let product: Option<Product> = envelope::single(&body, &["product"]);
        if let Some(product) = &product {
            self.cache()
                .insert(key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }
        Ok(product)
    }

    /// Products related to the given one.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn related_products(&self, id: &ProductId) -> Result<Vec<Product>, ApiError> {
        let key = CacheKey::Related(id.clone());
        if let Some(CacheValue::Related(products)) = self.cache().get(&key).await {
            debug!("Cache hit for related products");
            return Ok(products);
        }

        let body = self
            .get(&["products", id.as_str(), "related"], &[], Auth::Anonymous)
            .await?;
        let products: Vec<Product> = envelope::list(&body);
        let products: Vec<Product> = products.into_iter().filter(|p| &p.id != id).collect();

        self.cache()
            .insert(key, CacheValue::Related(products.clone()))
            .await;
        Ok(products)
    }

    /// All catalog categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache().get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let body = self.get(&["categories"], &[], Auth::Anonymous).await?;
        let categories: Vec<Category> = if body.get("categories").is_some() {
            envelope::list(&body["categories"])
        } else {
            envelope::list(&body)
        };

        self.cache()
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }
}
