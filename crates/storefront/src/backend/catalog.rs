//! Catalog endpoints. Responses are cached.

use reqwest::Method;
use tracing::{debug, instrument};

use super::{BackendClient, BackendError, CacheValue};
use crate::backend::types::{Category, Page, Product, ProductQuery};

impl BackendClient {
    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no product has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product(&self, slug: &str) -> Result<Product, BackendError> {
        let cache_key = format!("product:{slug}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let path = format!("/products/{}", urlencoding::encode(slug));
        let product: Product = self.send(self.request(Method::GET, &path, None)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a page of products.
    ///
    /// Search queries are never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self, query: &ProductQuery) -> Result<Page<Product>, BackendError> {
        let cacheable = query.search.is_none();
        let cache_key = format!(
            "products:{}:{}:{}:{}",
            query.category.as_deref().unwrap_or(""),
            query.sort.as_str(),
            query.page,
            query.page_size
        );

        if cacheable
            && let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let request = self
            .request(Method::GET, "/products", None)
            .query(&query.to_params());
        let page: Page<Product> = self.send(request).await?;

        if cacheable {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(page.clone()))
                .await;
        }

        Ok(page)
    }

    /// Get featured products for the home page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_featured_products(&self) -> Result<Vec<Product>, BackendError> {
        let cache_key = "products:featured".to_string();

        if let Some(CacheValue::Featured(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for featured products");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .send(self.request(Method::GET, "/products/featured", None))
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Featured(products.clone()))
            .await;

        Ok(products)
    }

    /// Get all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>, BackendError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .send(self.request(Method::GET, "/categories", None))
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }
}
