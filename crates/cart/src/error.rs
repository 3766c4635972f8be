//! Error taxonomy for aborted cart operations.
//!
//! None of these reach the caller as `Err`: the manager turns each into a
//! [`Notice`] and an [`Outcome::Aborted`](crate::Outcome::Aborted).

use rocketshoes_core::{CartDataError, ProductId};
use thiserror::Error;

use crate::api::ApiError;
use crate::notify::Notice;
use crate::store::StoreError;

/// The three cart transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Remove,
    Update,
}

impl Operation {
    /// Notice shown when this operation fails for a reason other than stock.
    #[must_use]
    pub const fn failure_notice(self) -> Notice {
        match self {
            Self::Add => Notice::AddFailed,
            Self::Remove => Notice::RemoveFailed,
            Self::Update => Notice::UpdateFailed,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Why a cart operation aborted.
#[derive(Debug, Error)]
pub enum CartError {
    /// The stock lookup failed.
    #[error("stock query failed: {0}")]
    StockQuery(#[source] ApiError),

    /// The product lookup failed on first add.
    #[error("product query failed: {0}")]
    ProductQuery(#[source] ApiError),

    /// The requested quantity is above the available stock.
    #[error("product {product_id}: requested {requested}, only {available} in stock")]
    StockExceeded {
        product_id: ProductId,
        requested: u64,
        available: u32,
    },

    /// The product has no line in the cart.
    #[error("product {0} is not in the cart")]
    EntryNotFound(ProductId),

    /// The working copy would break a cart invariant.
    #[error("invalid cart: {0}")]
    Data(#[from] CartDataError),

    /// Writing the new cart to storage failed.
    #[error("failed to persist cart: {0}")]
    Persist(#[from] StoreError),
}

impl CartError {
    /// The notice to show for this error raised by `operation`.
    #[must_use]
    pub const fn notice(&self, operation: Operation) -> Notice {
        match self {
            Self::StockExceeded { .. } => Notice::OutOfStock,
            Self::StockQuery(_)
            | Self::ProductQuery(_)
            | Self::EntryNotFound(_)
            | Self::Data(_)
            | Self::Persist(_) => operation.failure_notice(),
        }
    }
}
