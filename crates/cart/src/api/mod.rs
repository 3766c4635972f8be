//! HTTP client for the RocketShoes catalog API.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP (`json-server` style resources)
//! - The catalog is source of truth for stock - never cached locally
//! - In-memory caching via `moka` for product metadata (5 minute TTL by default)
//!
//! # Endpoints
//!
//! - `GET /stock/{id}` → `{ "id": 1, "amount": 3 }`
//! - `GET /products/{id}` → `{ "id": 1, "title": "...", "price": 179.9, "image": "..." }`
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::{ApiClient, StockSource};
//!
//! let client = ApiClient::new(&config.api)?;
//! let stock = client.stock(ProductId::new(1)).await?;
//! ```

mod client;

pub use client::ApiClient;

use rocketshoes_core::ProductId;
use thiserror::Error;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request URL could not be built from the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API answered with an unexpected status.
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// The API answered for a different product than the one requested.
    #[error("Asked for product {requested}, got product {received}")]
    UnexpectedProduct {
        requested: ProductId,
        received: ProductId,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
