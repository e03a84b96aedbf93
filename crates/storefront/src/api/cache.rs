//! Cache types for catalog responses.

use lumen_core::{Category, Product, ProductId};

use super::envelope::Page;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// A product listing, keyed by its encoded query string.
    Products(String),
    Product(ProductId),
    Related(ProductId),
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Page<Product>),
    Product(Box<Product>),
    Related(Vec<Product>),
    Categories(Vec<Category>),
}
