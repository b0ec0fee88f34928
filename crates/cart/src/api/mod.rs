//! Stock and product catalog lookups.
//!
//! # Architecture
//!
//! - [`StockGateway`] and [`ProductCatalog`] are the ports the cart rules
//!   depend on; tests substitute in-memory fakes
//! - [`ApiClient`] implements both against the storefront REST API using
//!   `reqwest`
//! - The stock service is the source of truth for availability, so stock is
//!   fetched on every check and NEVER cached
//! - Product details rarely change and are cached in memory via `moka`
//!
//! # Endpoints
//!
//! - `GET {base}/stock/{id}` → `{ "id": 1, "amount": 3 }`
//! - `GET {base}/products/{id}` → `{ "id": 1, "title": "...", "price": 179.9, "image": "..." }`

mod client;

pub use client::ApiClient;

use async_trait::async_trait;
use rocketshoes_core::{ProductDetails, ProductId, StockRecord};
use thiserror::Error;

/// Errors that can occur when talking to the stock or products API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    /// Client could not be configured.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Read-only lookup of remote stock levels.
#[async_trait]
pub trait StockGateway: Send + Sync {
    /// Fetch the current stock record for a product.
    async fn stock(&self, product_id: ProductId) -> Result<StockRecord, ApiError>;
}

/// Read-only lookup of product display details.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch name, price, and image for a product.
    async fn product(&self, product_id: ProductId) -> Result<ProductDetails, ApiError>;
}
