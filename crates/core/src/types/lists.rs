//! Product lists kept per visitor: wishlist, comparison and recently viewed.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;

/// Most products a visitor can compare side by side.
pub const COMPARE_LIMIT: usize = 4;

/// Most products kept in the recently-viewed strip.
pub const RECENTLY_VIEWED_LIMIT: usize = 12;

fn position(items: &[Product], id: &ProductId) -> Option<usize> {
    items.iter().position(|p| &p.id == id)
}

/// Saved products, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    items: Vec<Product>,
}

impl Wishlist {
    #[must_use]
    pub fn from_products(products: Vec<Product>) -> Self {
        let mut list = Self::default();
        for product in products {
            list.add(product);
        }
        list
    }

    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        position(&self.items, id).is_some()
    }

    /// Add a product. Returns `false` if it was already saved.
    pub fn add(&mut self, product: Product) -> bool {
        if self.contains(&product.id) {
            return false;
        }
        self.items.push(product);
        true
    }

    /// Remove a product, returning it if it was saved.
    pub fn remove(&mut self, id: &ProductId) -> Option<Product> {
        position(&self.items, id).map(|i| self.items.remove(i))
    }

    /// Add if absent, remove if present. Returns whether it is now saved.
    pub fn toggle(&mut self, product: Product) -> bool {
        if self.remove(&product.id).is_some() {
            false
        } else {
            self.items.push(product);
            true
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Errors adding to the comparison list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompareError {
    #[error("you can compare up to 4 products")]
    Full,
}

/// Products picked for side-by-side comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompareList {
    items: Vec<Product>,
}

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureRow {
    pub feature: String,
    /// Whether each compared product has the feature, in list order.
    pub present: Vec<bool>,
}

impl CompareList {
    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        position(&self.items, id).is_some()
    }

    /// Add a product. Already-listed products are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CompareError::Full` when [`COMPARE_LIMIT`] products are listed.
    pub fn add(&mut self, product: Product) -> Result<bool, CompareError> {
        if self.contains(&product.id) {
            return Ok(false);
        }
        if self.items.len() >= COMPARE_LIMIT {
            return Err(CompareError::Full);
        }
        self.items.push(product);
        Ok(true)
    }

    pub fn remove(&mut self, id: &ProductId) -> Option<Product> {
        position(&self.items, id).map(|i| self.items.remove(i))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Union of all features, first-seen order, with per-product presence.
    #[must_use]
    pub fn feature_matrix(&self) -> Vec<FeatureRow> {
        let mut features: Vec<&str> = Vec::new();
        for product in &self.items {
            for feature in &product.features {
                if !features.contains(&feature.as_str()) {
                    features.push(feature);
                }
            }
        }
        features
            .into_iter()
            .map(|feature| FeatureRow {
                feature: feature.to_owned(),
                present: self
                    .items
                    .iter()
                    .map(|p| p.features.iter().any(|f| f == feature))
                    .collect(),
            })
            .collect()
    }
}

/// Recently viewed products, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentlyViewed {
    items: Vec<Product>,
}

impl RecentlyViewed {
    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Move a product to the front, dropping the oldest past the limit.
    pub fn record(&mut self, product: Product) {
        if let Some(i) = position(&self.items, &product.id) {
            self.items.remove(i);
        }
        self.items.insert(0, product);
        self.items.truncate(RECENTLY_VIEWED_LIMIT);
    }

    /// Recent products other than `current`, for a "you looked at" strip.
    #[must_use]
    pub fn excluding(&self, current: &ProductId) -> Vec<&Product> {
        self.items.iter().filter(|p| &p.id != current).collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::product::tests::product;

    #[test]
    fn test_wishlist_dedupes_and_toggles() {
        let mut list = Wishlist::default();
        assert!(list.add(product("a", 100)));
        assert!(!list.add(product("a", 100)));
        assert!(list.toggle(product("b", 100)));
        assert!(!list.toggle(product("a", 100)));
        assert_eq!(list.len(), 1);
        assert!(list.contains(&ProductId::new("b")));
    }

    #[test]
    fn test_wishlist_from_products_dedupes() {
        let list = Wishlist::from_products(vec![product("a", 1), product("b", 1), product("a", 1)]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_compare_limit() {
        let mut list = CompareList::default();
        for id in ["a", "b", "c", "d"] {
            assert!(list.add(product(id, 100)).unwrap());
        }
        assert!(!list.add(product("a", 100)).unwrap());
        assert_eq!(list.add(product("e", 100)), Err(CompareError::Full));
        assert_eq!(list.len(), COMPARE_LIMIT);
        list.remove(&ProductId::new("a"));
        assert!(list.add(product("e", 100)).unwrap());
    }

    #[test]
    fn test_feature_matrix() {
        let mut a = product("a", 100);
        a.features = vec!["vegan".to_string(), "spf 30".to_string()];
        let mut b = product("b", 100);
        b.features = vec!["spf 30".to_string(), "fragrance free".to_string()];
        let mut list = CompareList::default();
        list.add(a).unwrap();
        list.add(b).unwrap();

        let rows = list.feature_matrix();
        let names: Vec<_> = rows.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(names, ["vegan", "spf 30", "fragrance free"]);
        assert_eq!(rows.first().unwrap().present, vec![true, false]);
        assert_eq!(rows.get(1).unwrap().present, vec![true, true]);
    }

    #[test]
    fn test_recently_viewed_order_and_cap() {
        let mut recent = RecentlyViewed::default();
        for i in 0..15 {
            recent.record(product(&i.to_string(), 100));
        }
        assert_eq!(recent.items().len(), RECENTLY_VIEWED_LIMIT);
        assert_eq!(recent.items().first().unwrap().id.as_str(), "14");

        recent.record(product("10", 100));
        assert_eq!(recent.items().first().unwrap().id.as_str(), "10");
        assert_eq!(recent.items().len(), RECENTLY_VIEWED_LIMIT);
        let count_10 = recent.items().iter().filter(|p| p.id.as_str() == "10").count();
        assert_eq!(count_10, 1);

        assert_eq!(recent.excluding(&ProductId::new("10")).len(), 11);
    }
}
