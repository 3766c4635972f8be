//! Lookup seams for the remote catalog.
//!
//! The manager only needs two questions answered: how many units of a
//! product are available right now, and what the product looks like. Both
//! may fail on the network or with a missing product, and both are awaited
//! inside a cart transaction.

use async_trait::async_trait;
use rocketshoes_core::{Product, ProductId, Stock};

use crate::api::ApiError;

/// Source of current stock levels.
///
/// Implementations must not serve stale data from a cache: the stock ceiling
/// is checked against whatever this returns.
#[async_trait]
pub trait StockSource: Send + Sync {
    /// Fetch the available quantity for `id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or if the product is unknown.
    async fn stock(&self, id: ProductId) -> Result<Stock, ApiError>;
}

/// Source of product metadata.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch the catalog record for `id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or if the product is unknown.
    async fn product(&self, id: ProductId) -> Result<Product, ApiError>;
}
