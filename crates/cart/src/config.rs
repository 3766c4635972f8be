//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ROCKETSHOES_API_URL` - Catalog API base URL (default: <http://localhost:3333>)
//! - `ROCKETSHOES_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)
//! - `ROCKETSHOES_PRODUCT_CACHE_TTL_SECS` - Product metadata cache TTL in seconds (default: 300)
//! - `ROCKETSHOES_DATA_DIR` - Directory holding the cart storage file (default: .rocketshoes)
//! - `ROCKETSHOES_STORAGE_KEY` - Storage key for the cart blob (default: @RocketShoes:cart)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default storage key for the cart blob.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";

const DEFAULT_API_URL: &str = "http://localhost:3333";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "10";
const DEFAULT_PRODUCT_CACHE_TTL_SECS: &str = "300";
const DEFAULT_DATA_DIR: &str = ".rocketshoes";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Catalog API configuration
    pub api: ApiConfig,
    /// Directory holding the storage file
    pub data_dir: PathBuf,
    /// Key the cart blob is stored under
    pub storage_key: String,
}

/// Catalog API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL for `/stock` and `/products`
    pub base_url: Url,
    /// Timeout applied to each request
    pub request_timeout: Duration,
    /// How long fetched product metadata stays cached
    pub product_cache_ttl: Duration,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Lookup(lookup);

        let storage_key = env.get_or_default("ROCKETSHOES_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ROCKETSHOES_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            api: ApiConfig::from_lookup(&env)?,
            data_dir: PathBuf::from(env.get_or_default("ROCKETSHOES_DATA_DIR", DEFAULT_DATA_DIR)),
            storage_key,
        })
    }
}

impl ApiConfig {
    fn from_lookup<F: Fn(&str) -> Option<String>>(env: &Lookup<F>) -> Result<Self, ConfigError> {
        let base_url: Url = env.parse("ROCKETSHOES_API_URL", DEFAULT_API_URL)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "ROCKETSHOES_API_URL".to_string(),
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(
                env.parse("ROCKETSHOES_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            ),
            product_cache_ttl: Duration::from_secs(env.parse(
                "ROCKETSHOES_PRODUCT_CACHE_TTL_SECS",
                DEFAULT_PRODUCT_CACHE_TTL_SECS,
            )?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Lookup<F>(F);

impl<F: Fn(&str) -> Option<String>> Lookup<F> {
    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a variable (or its default) and parse it.
    fn parse<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<CartConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CartConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api.base_url.as_str(), "http://localhost:3333/");
        assert_eq!(config.api.request_timeout, Duration::from_secs(10));
        assert_eq!(config.api.product_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.data_dir, PathBuf::from(".rocketshoes"));
        assert_eq!(config.storage_key, "@RocketShoes:cart");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("ROCKETSHOES_API_URL", "https://api.example.com/v1"),
            ("ROCKETSHOES_HTTP_TIMEOUT_SECS", "3"),
            ("ROCKETSHOES_DATA_DIR", "/tmp/cart"),
            ("ROCKETSHOES_STORAGE_KEY", "cart"),
        ])
        .unwrap();
        assert_eq!(config.api.base_url.host_str(), Some("api.example.com"));
        assert_eq!(config.api.request_timeout, Duration::from_secs(3));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cart"));
        assert_eq!(config.storage_key, "cart");
    }

    #[test]
    fn test_invalid_timeout() {
        let err = load(&[("ROCKETSHOES_HTTP_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "ROCKETSHOES_HTTP_TIMEOUT_SECS"));
    }

    #[test]
    fn test_invalid_url() {
        assert!(load(&[("ROCKETSHOES_API_URL", "not a url")]).is_err());
        assert!(load(&[("ROCKETSHOES_API_URL", "ftp://example.com")]).is_err());
    }

    #[test]
    fn test_empty_storage_key() {
        assert!(load(&[("ROCKETSHOES_STORAGE_KEY", "  ")]).is_err());
    }
}
