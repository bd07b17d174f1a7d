//! Storefront API lookups.
//!
//! # Architecture
//!
//! - [`StockLookup`] and [`ProductLookup`] are the seams the cart manager
//!   depends on; tests substitute mocks or in-memory fakes
//! - [`ApiClient`] implements both over HTTP with `reqwest`
//! - Product metadata is cached via `moka`; stock is never cached
//!
//! # Endpoints
//!
//! - `GET /stock/{id}` → `{ "id": 1, "amount": 3 }`
//! - `GET /products/{id}` → `{ "id": 1, "title": "...", "price": 179.9, "image": "..." }`
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::api::{ApiClient, StockLookup};
//!
//! let client = ApiClient::new(&config.api)?;
//! let stock = client.stock(ProductId::new(1)).await?;
//! ```

mod client;

pub use client::ApiClient;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use rocketshoes_core::{Product, ProductId, Stock};

/// Errors that can occur when calling the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code.
        status: u16,
        /// Leading part of the response body.
        body: String,
    },

    /// The API answered for a different product than the one requested.
    #[error("Requested product {requested} but received product {returned}")]
    ProductMismatch {
        /// Product id that was asked for.
        requested: ProductId,
        /// Product id in the response.
        returned: ProductId,
    },

    /// An endpoint URL could not be built from the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Source of authoritative stock levels.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StockLookup: Send + Sync {
    /// Fetch the stock currently available for `id`.
    async fn stock(&self, id: ProductId) -> Result<Stock, ApiError>;
}

/// Source of product metadata.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProductLookup: Send + Sync {
    /// Fetch the product record for `id`.
    async fn product(&self, id: ProductId) -> Result<Product, ApiError>;
}
