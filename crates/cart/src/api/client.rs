//! HTTP implementation of the storefront lookups.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use rocketshoes_core::{Product, ProductId, Stock};

use super::{ApiError, ProductLookup, StockLookup};
use crate::config::ApiConfig;

/// Longest slice of an error body kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 200;

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the connection pool and the product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    products: Option<Cache<ProductId, Product>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("cached_products", &self.inner.products.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// A zero `product_cache_ttl` disables the product cache.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let products = (!config.product_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(config.product_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
                products,
            }),
        })
    }

    /// Build an endpoint URL by appending `segments` to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Execute a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let mut request = self.inner.client.get(url.clone());
        if let Some(token) = &self.inner.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url.path().to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                url = %url,
                body = %body.chars().take(500).collect::<String>(),
                "Storefront API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                url = %url,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse storefront API response"
            );
            ApiError::Parse(e)
        })
    }
}

#[async_trait]
impl StockLookup for ApiClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn stock(&self, id: ProductId) -> Result<Stock, ApiError> {
        let url = self.endpoint(&["stock", &id.to_string()])?;
        let stock: Stock = self.get_json(url).await?;
        debug!(amount = stock.amount, "Fetched stock");
        Ok(stock)
    }
}

#[async_trait]
impl ProductLookup for ApiClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        if let Some(cache) = &self.inner.products
            && let Some(product) = cache.get(&id).await
        {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let url = self.endpoint(&["products", &id.to_string()])?;
        let product: Product = self.get_json(url).await?;

        if product.id != id {
            return Err(ApiError::ProductMismatch {
                requested: id,
                returned: product.id,
            });
        }

        if let Some(cache) = &self.inner.products {
            cache.insert(id, product.clone()).await;
        }

        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_on_bare_host() {
        let url = client("http://localhost:3333").endpoint(&["stock", "1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3333/stock/1");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = client("https://api.example.com/v1/")
            .endpoint(&["products", "12"])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/products/12");

        let url = client("https://api.example.com/v1")
            .endpoint(&["products", "12"])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/products/12");
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let mut config = ApiConfig::new(Url::parse("http://localhost:3333").unwrap());
        config.product_cache_ttl = Duration::ZERO;

        let client = ApiClient::new(&config).unwrap();
        assert!(client.inner.products.is_none());
    }

    #[test]
    fn test_debug_hides_token() {
        let mut config = ApiConfig::new(Url::parse("http://localhost:3333").unwrap());
        config.token = Some(SecretString::from("super_secret_token"));

        let client = ApiClient::new(&config).unwrap();
        assert!(!format!("{client:?}").contains("super_secret_token"));
    }
}
