//! Catalog endpoints.

use gaojie_core::ProductId;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::types::{
    CategoriesEnvelope, Product, ProductEnvelope, ProductList, ProductQuery, ProductsEnvelope,
};
use super::{ApiClient, ApiError};

/// Curated product lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductCollection {
    Featured,
    Bestsellers,
    New,
}

impl ProductCollection {
    /// Default list size.
    pub const DEFAULT_LIMIT: u32 = 4;

    const fn segment(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::Bestsellers => "bestsellers",
            Self::New => "new",
        }
    }
}

impl ApiClient {
    /// Get a page of products.
    ///
    /// Search queries bypass the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<ProductList, ApiError> {
        let cacheable = query.search.as_deref().is_none_or(|s| s.trim().is_empty());
        let cache_key = CacheKey::Products(query.clone());

        if cacheable
            && let Some(CacheValue::Products(list)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(list);
        }

        let mut url = self.endpoint(&["products"])?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let list: ProductList = self.execute(self.inner.client.get(url), None).await?;

        if cacheable {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(list.clone()))
                .await;
        }

        Ok(list)
    }

    /// Get a curated list (featured, bestsellers, new arrivals).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn collection(
        &self,
        kind: ProductCollection,
        limit: u32,
    ) -> Result<Vec<Product>, ApiError> {
        let cache_key = CacheKey::Collection { kind, limit };
        if let Some(CacheValue::Collection(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for collection");
            return Ok(products);
        }

        let mut url = self.endpoint(&["products", kind.segment()])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let envelope: ProductsEnvelope = self.execute(self.inner.client.get(url), None).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Collection(envelope.products.clone()))
            .await;

        Ok(envelope.products)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown id, or an error if the
    /// API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", id.as_str()])?;
        let envelope: ProductEnvelope = self.execute(self.inner.client.get(url), None).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(envelope.product.clone())))
            .await;

        Ok(envelope.product)
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown slug, or an error if the
    /// API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, ApiError> {
        let cache_key = CacheKey::ProductBySlug(slug.to_string());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", "slug", slug])?;
        let envelope: ProductEnvelope = self.execute(self.inner.client.get(url), None).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(envelope.product.clone())))
            .await;

        Ok(envelope.product)
    }

    /// Get the category names.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint(&["products", "categories"])?;
        let envelope: CategoriesEnvelope = self.execute(self.inner.client.get(url), None).await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(envelope.categories.clone()),
            )
            .await;

        Ok(envelope.categories)
    }
}
