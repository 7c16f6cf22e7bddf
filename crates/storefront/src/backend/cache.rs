//! Cache types for catalog responses.

use crate::backend::types::{Category, Page, Product};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Page<Product>),
    Featured(Vec<Product>),
    Categories(Vec<Category>),
}
