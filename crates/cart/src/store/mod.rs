//! Durable key-value storage for the cart blob.
//!
//! The manager writes the whole cart under one key on every commit. Stores
//! only deal in strings; encoding the cart is the manager's concern.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding a stored value failed.
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A string key-value store, `localStorage` style.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// The write is durable once this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
