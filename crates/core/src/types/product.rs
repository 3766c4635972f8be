//! Catalog records returned by the product and stock endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::price::Price;

/// Product metadata as served by the catalog.
///
/// Only the fields the cart relies on are named. Anything else the catalog
/// sends is kept in `extra` and written back untouched, so a persisted cart
/// carries the full record it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Create a product with no extra metadata.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Price, image: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            image: image.into(),
            extra: Map::new(),
        }
    }
}

/// Available stock for a product at the time it was queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: ProductId,
    pub amount: u32,
}
