//! REST client for the products and stock endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rocketshoes_core::{ProductDetails, ProductId, StockRecord};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, ProductCatalog, StockGateway};
use crate::config::ApiConfig;

/// Body of `GET stock/{id}`.
#[derive(Debug, Deserialize)]
struct StockResponse {
    amount: i64,
}

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and the product
/// cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    /// `None` when the configured TTL is zero
    products: Option<Cache<ProductId, ProductDetails>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| ApiError::Config(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
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
                products,
            }),
        })
    }

    /// GET a path relative to the base URL and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.inner.base_url.join(path)?;

        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path.to_string()));
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

        // Read as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "API returned non-success status"
            );
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }
}

#[async_trait]
impl StockGateway for ApiClient {
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn stock(&self, product_id: ProductId) -> Result<StockRecord, ApiError> {
        let response: StockResponse = self.get_json(&format!("stock/{product_id}")).await?;
        debug!(available = response.amount, "Fetched stock");

        Ok(StockRecord {
            product_id,
            available_amount: response.amount,
        })
    }
}

#[async_trait]
impl ProductCatalog for ApiClient {
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn product(&self, product_id: ProductId) -> Result<ProductDetails, ApiError> {
        if let Some(cache) = &self.inner.products
            && let Some(product) = cache.get(&product_id).await
        {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product: ProductDetails = self.get_json(&format!("products/{product_id}")).await?;
        if product.id != product_id {
            return Err(ApiError::Api {
                status: 200,
                message: format!("requested product {product_id}, got {}", product.id),
            });
        }

        if let Some(cache) = &self.inner.products {
            cache.insert(product_id, product.clone()).await;
        }

        Ok(product)
    }
}
