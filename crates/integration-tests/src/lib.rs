//! Integration tests for RocketShoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - Add/remove/update transactions against fakes
//! - `cart_properties` - Invariants over random operation sequences
//! - `api_client` - HTTP catalog client against a mock server
//! - `file_store` - File-backed persistence in a temp directory
//!
//! This library holds the fakes the test files share.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;

use rocketshoes_cart::{
    ApiError, CartManager, CartServices, KeyValueStore, MemoryStore, ProductSource,
    RecordingNotifier, StockSource, StoreError,
};
use rocketshoes_core::{Cart, CartItem, Price, Product, ProductId, Stock};

/// Storage key used by every fixture.
pub const CART_KEY: &str = "@RocketShoes:cart";

/// Catalog record for `id`, as the fake catalog serves it.
#[must_use]
pub fn product(id: i32) -> Product {
    Product::new(
        ProductId::new(id),
        format!("Tênis {id}"),
        Price::new(Decimal::new(1799, 1) + Decimal::from(id)),
        format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/modulo-redux/tenis{id}.jpg"),
    )
}

/// Build a cart from `(product id, amount)` pairs, in order.
///
/// # Panics
///
/// Panics if an amount is zero or an id repeats.
#[must_use]
pub fn cart_of(lines: &[(i32, u32)]) -> Cart {
    let mut cart = Cart::new();
    for &(id, amount) in lines {
        let mut item = CartItem::new(product(id));
        item.amount = NonZeroU32::new(amount).unwrap_or_else(|| panic!("zero amount for {id}"));
        cart.push(item)
            .unwrap_or_else(|e| panic!("bad fixture cart: {e}"));
    }
    cart
}

/// Decode the cart a store holds under [`CART_KEY`].
///
/// # Panics
///
/// Panics if the stored blob cannot be decoded.
#[must_use]
pub fn decode(blob: &str) -> Cart {
    serde_json::from_str(blob).unwrap_or_else(|e| panic!("stored cart is malformed: {e}"))
}

// =============================================================================
// FakeCatalog
// =============================================================================

/// Scripted stock and product lookups.
///
/// Products without an explicit stock level are unknown to the stock
/// endpoint and fail with `ApiError::NotFound`.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    stock: Mutex<HashMap<ProductId, u32>>,
    failing_products: Mutex<HashSet<ProductId>>,
    stock_lookups: AtomicUsize,
    product_lookups: AtomicUsize,
}

impl FakeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the given `(product id, stock)` levels.
    #[must_use]
    pub fn with_stock(levels: &[(i32, u32)]) -> Self {
        let catalog = Self::new();
        for &(id, amount) in levels {
            catalog.set_stock(id, amount);
        }
        catalog
    }

    pub fn set_stock(&self, id: i32, amount: u32) {
        self.stock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ProductId::new(id), amount);
    }

    /// Make the stock endpoint fail for `id`.
    pub fn drop_stock(&self, id: i32) {
        self.stock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&ProductId::new(id));
    }

    /// Make the product endpoint fail for `id`.
    pub fn fail_product(&self, id: i32) {
        self.failing_products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ProductId::new(id));
    }

    #[must_use]
    pub fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.stock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
    }

    #[must_use]
    pub fn stock_lookups(&self) -> usize {
        self.stock_lookups.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn product_lookups(&self) -> usize {
        self.product_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockSource for FakeCatalog {
    async fn stock(&self, id: ProductId) -> Result<Stock, ApiError> {
        self.stock_lookups.fetch_add(1, Ordering::SeqCst);
        // Yield so concurrent callers get a chance to interleave
        tokio::task::yield_now().await;
        self.stock_of(id)
            .map(|amount| Stock { id, amount })
            .ok_or_else(|| ApiError::NotFound(format!("/stock/{id}")))
    }
}

#[async_trait]
impl ProductSource for FakeCatalog {
    async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.product_lookups.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let failing = self
            .failing_products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id);
        if failing {
            return Err(ApiError::NotFound(format!("/products/{id}")));
        }
        Ok(product(id.as_i32()))
    }
}

// =============================================================================
// FlakyStore
// =============================================================================

/// Memory store whose writes can be switched off.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The blob currently stored under [`CART_KEY`].
    #[must_use]
    pub fn blob(&self) -> Option<String> {
        self.inner.snapshot(CART_KEY)
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.set(key, value).await
    }
}

// =============================================================================
// Fixture
// =============================================================================

/// A manager wired to fakes, with handles on each collaborator.
pub struct Fixture {
    pub manager: CartManager,
    pub catalog: Arc<FakeCatalog>,
    pub store: Arc<FlakyStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Fixture {
    /// Load a manager whose store already holds `initial`.
    ///
    /// # Panics
    ///
    /// Panics if `initial` cannot be encoded or stored.
    pub async fn new(catalog: FakeCatalog, initial: &Cart) -> Self {
        let store = Arc::new(FlakyStore::new());
        if !initial.is_empty() {
            let blob = serde_json::to_string(initial)
                .unwrap_or_else(|e| panic!("cannot encode fixture cart: {e}"));
            store
                .set(CART_KEY, &blob)
                .await
                .unwrap_or_else(|e| panic!("cannot seed store: {e}"));
        }

        let catalog = Arc::new(catalog);
        let notifier = Arc::new(RecordingNotifier::new());
        let services = CartServices::new(catalog.clone(), store.clone(), notifier.clone());
        let manager = CartManager::load(services, CART_KEY).await;

        Self {
            manager,
            catalog,
            store,
            notifier,
        }
    }

    /// The cart as a reload would see it.
    #[must_use]
    pub fn persisted(&self) -> Option<Cart> {
        self.store.blob().as_deref().map(decode)
    }
}
