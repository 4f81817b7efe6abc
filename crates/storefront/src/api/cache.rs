//! Cache types for catalog responses.

use gaojie_core::ProductId;

use super::products::ProductCollection;
use super::types::{Product, ProductList, ProductQuery};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    ProductBySlug(String),
    Products(ProductQuery),
    Collection { kind: ProductCollection, limit: u32 },
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductList),
    Collection(Vec<Product>),
    Categories(Vec<String>),
}
