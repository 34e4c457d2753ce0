//! Cache types for backend responses.

use storefront_sync_core::ProductId;

use crate::backend::types::Product;

/// Cache key for cacheable responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
}
