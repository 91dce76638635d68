//! Product catalog endpoints with an in-memory TTL cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sheshape_core::ProductId;
use tracing::{debug, instrument};

use super::SortDirection;
use crate::api::{ApiClient, ApiError};
use crate::types::{Page, Product};

/// Cache key for products and product listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    Products(ProductQuery),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Page<Product>),
}

/// Paging, sorting and filtering for `GET /api/products`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    /// Zero-based page index.
    pub page: u32,
    pub size: u32,
    pub sort_by: String,
    pub direction: SortDirection,
    pub category: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort_by: "name".to_string(),
            direction: SortDirection::Asc,
            category: None,
        }
    }
}

impl ProductQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("size", self.size.max(1).to_string()),
            ("sortBy", self.sort_by.clone()),
            ("direction", self.direction.as_str().to_string()),
        ];
        if let Some(category) = self.category.as_deref().map(str::trim)
            && !category.is_empty()
        {
            pairs.push(("category", category.to_string()));
        }
        pairs
    }
}

/// Typed access to `/api/products`.
///
/// Product details and listing pages are cached for the configured TTL.
#[derive(Clone)]
pub struct ProductService {
    inner: Arc<ProductServiceInner>,
}

struct ProductServiceInner {
    api: ApiClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ProductService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductService")
            .field("cached_entries", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl ProductService {
    #[must_use]
    pub fn new(api: ApiClient, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(ProductServiceInner { api, cache }),
        }
    }

    /// One page of active products.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self))]
    pub async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let cache_key = CacheKey::Products(query.clone());

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product page");
            return Ok(page);
        }

        let page: Page<Product> = self
            .inner
            .api
            .get_query("/api/products", &query.to_pairs())
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    /// A single product by id.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`]; an unknown id is [`ErrorKind::NotFound`](crate::api::ErrorKind::NotFound).
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.inner.api.get(&format!("/api/products/{id}")).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Drop every cached product and listing.
    pub fn invalidate(&self) {
        self.inner.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_filter_is_optional() {
        let pairs = ProductQuery::default().to_pairs();
        assert!(pairs.iter().all(|(key, _)| *key != "category"));
        assert!(pairs.contains(&("sortBy", "name".to_string())));
        assert!(pairs.contains(&("direction", "asc".to_string())));

        let filtered = ProductQuery {
            category: Some(" Supplements ".to_string()),
            ..ProductQuery::default()
        };
        assert!(
            filtered
                .to_pairs()
                .contains(&("category", "Supplements".to_string()))
        );

        let blank = ProductQuery {
            category: Some("  ".to_string()),
            ..ProductQuery::default()
        };
        assert!(blank.to_pairs().iter().all(|(key, _)| *key != "category"));
    }
}
