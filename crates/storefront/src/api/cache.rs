//! Cache types for catalog responses.

use crate::types::{Product, ProductPage};

/// Cache key for product lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(String),
    /// Encoded query string of the listing.
    Products(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductPage),
}
