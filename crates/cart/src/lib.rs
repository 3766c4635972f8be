//! RocketShoes cart library.
//!
//! Owns the shopping cart for a single session: every mutation is checked
//! against live stock, written to durable storage, and only then made
//! visible to the rest of the application.
//!
//! # Modules
//!
//! - [`manager`] - [`CartManager`], the add/remove/update transactions
//! - [`source`] - Stock and product lookup seams
//! - [`api`] - HTTP catalog client implementing both lookups
//! - [`store`] - Key-value persistence (file and in-memory)
//! - [`notify`] - User-facing notices and their sinks
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Error taxonomy for aborted operations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod manager;
pub mod notify;
pub mod source;
pub mod store;

pub use api::{ApiClient, ApiError};
pub use config::{CartConfig, ConfigError};
pub use error::{CartError, Operation};
pub use manager::{CartManager, CartServices, Outcome};
pub use notify::{Notice, Notifier, RecordingNotifier, TracingNotifier};
pub use source::{ProductSource, StockSource};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
