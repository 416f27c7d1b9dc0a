//! Catalog lookups.

use tracing::{debug, instrument};

use autoparts_core::ProductId;

use crate::api::cache::{CacheKey, CacheValue};
use crate::api::{ApiClient, segment};
use crate::error::Result;
use crate::types::{Facets, Product, ProductFilter, ProductPage};

impl ApiClient {
    /// List products matching a filter.
    ///
    /// Results are cached per distinct query for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not a product list.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<ProductPage> {
        let query = filter.to_query();
        let cache_key = CacheKey::Products(
            query
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&"),
        );

        if let Some(CacheValue::Products(page)) = self.cache_get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let value = self.get_raw("/products", &query).await?;
        let page = ProductPage::from_value(value)?;

        self.cache_insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist, or an error
    /// if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product> {
        let cache_key = CacheKey::Product(id.to_string());

        if let Some(CacheValue::Product(product)) = self.cache_get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .get(&format!("/products/{}", segment(id.as_str())))
            .await?;

        self.cache_insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Categories and brands present in the unfiltered catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be listed.
    #[instrument(skip(self))]
    pub async fn product_facets(&self) -> Result<Facets> {
        let page = self.list_products(&ProductFilter::default()).await?;
        Ok(Facets::from_products(&page.products))
    }
}
