//! Command implementations.

pub mod cart;

use thiserror::Error;

use rocketshoes_cart::{ApiError, CartError, ConfigError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The catalog client could not be built.
    #[error("Catalog client error: {0}")]
    Api(#[from] ApiError),

    /// The cart operation aborted.
    #[error("Cart operation aborted: {0}")]
    Aborted(#[from] CartError),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Encoding the cart failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
