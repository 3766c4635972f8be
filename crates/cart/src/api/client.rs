use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use rocketshoes_core::{Product, ProductId, Stock};

use super::ApiError;
use crate::config::ApiConfig;
use crate::source::{ProductSource, StockSource};

const PRODUCT_CACHE_CAPACITY: u64 = 1000;

/// Client for the catalog API.
///
/// Cheap to clone; clones share the connection pool and product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    products: Cache<ProductId, Product>,
}

impl ApiClient {
    /// Create a new catalog API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let products = Cache::builder()
            .max_capacity(PRODUCT_CACHE_CAPACITY)
            .time_to_live(config.product_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: with_trailing_slash(config.base_url.clone()),
                products,
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, resource: &str, id: ProductId) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(&format!("{resource}/{id}"))?)
    }

    /// GET `url` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.inner.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        // Read as text first so parse failures can log the body
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            debug!(url = %url, body = %body, "Failed to decode API response");
            ApiError::Parse(e)
        })
    }
}

#[async_trait]
impl StockSource for ApiClient {
    #[instrument(skip(self))]
    async fn stock(&self, id: ProductId) -> Result<Stock, ApiError> {
        let url = self.endpoint("stock", id)?;
        let stock: Stock = self.get_json(url).await?;
        ensure_same_product(id, stock.id)?;
        debug!(available = stock.amount, "Fetched stock");
        Ok(stock)
    }
}

#[async_trait]
impl ProductSource for ApiClient {
    #[instrument(skip(self))]
    async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        if let Some(product) = self.inner.products.get(&id).await {
            debug!("Product cache hit");
            return Ok(product);
        }

        let url = self.endpoint("products", id)?;
        let product: Product = self.get_json(url).await?;
        ensure_same_product(id, product.id)?;
        self.inner.products.insert(id, product.clone()).await;
        debug!(title = %product.title, "Fetched product");
        Ok(product)
    }
}

const fn ensure_same_product(requested: ProductId, received: ProductId) -> Result<(), ApiError> {
    if requested.as_i32() == received.as_i32() {
        Ok(())
    } else {
        Err(ApiError::UnexpectedProduct {
            requested,
            received,
        })
    }
}

/// `Url::join` drops the last path segment unless the base ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
