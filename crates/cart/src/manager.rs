//! Cart state manager.
//!
//! [`CartManager`] owns the session's cart. Each mutation is a transaction:
//!
//! 1. take a working copy of the committed cart
//! 2. validate against live stock (and fetch metadata on first add)
//! 3. write the working copy to the store
//! 4. publish it as the new committed cart
//!
//! Any failure before step 4 leaves the committed cart untouched and emits
//! one [`Notice`]. The store is always written before the in-memory cart
//! changes, so the committed cart is never ahead of what a reload would see.
//!
//! Transactions are serialized by a writer lock held across the lookups, so
//! concurrent callers queue rather than interleave.

use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use rocketshoes_core::{Cart, CartItem, ProductId};

use crate::error::{CartError, Operation};
use crate::notify::{Notice, Notifier};
use crate::source::{ProductSource, StockSource};
use crate::store::{KeyValueStore, StoreError};

/// Collaborators a [`CartManager`] is built from.
#[derive(Clone)]
pub struct CartServices {
    pub stock: Arc<dyn StockSource>,
    pub products: Arc<dyn ProductSource>,
    pub store: Arc<dyn KeyValueStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl CartServices {
    /// Build services from one catalog that answers both stock and product lookups.
    #[must_use]
    pub fn new<C>(catalog: Arc<C>, store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self
    where
        C: StockSource + ProductSource + 'static,
    {
        let stock: Arc<dyn StockSource> = catalog.clone();
        let products: Arc<dyn ProductSource> = catalog;
        Self {
            stock,
            products,
            store,
            notifier,
        }
    }
}

/// Result of a cart operation.
///
/// Operations never fail with `Err`; the shopper learns about aborts through
/// the [`Notifier`]. This value is for callers that want to branch on it.
#[derive(Debug)]
pub enum Outcome {
    /// The new cart was persisted and published.
    Committed,
    /// The request was a silent no-op: no lookup, no notice, no change.
    Ignored,
    /// The operation aborted; the cart is unchanged and a notice was sent.
    Aborted(CartError),
}

impl Outcome {
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }

    /// The abort reason, if the operation aborted.
    #[must_use]
    pub const fn error(&self) -> Option<&CartError> {
        match self {
            Self::Aborted(error) => Some(error),
            Self::Committed | Self::Ignored => None,
        }
    }
}

/// The session's cart.
///
/// Construct once with [`CartManager::load`] and hand clones to every
/// consumer; clones share the same cart.
#[derive(Clone)]
pub struct CartManager {
    inner: Arc<CartManagerInner>,
}

struct CartManagerInner {
    services: CartServices,
    storage_key: String,
    writer: Mutex<()>,
    state: watch::Sender<Cart>,
}

impl CartManager {
    /// Create the manager, restoring the cart stored under `storage_key`.
    ///
    /// A missing, unreadable or malformed blob yields an empty cart. This
    /// never fails.
    #[instrument(skip_all)]
    pub async fn load(services: CartServices, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();
        let cart = restore(services.store.as_ref(), &storage_key).await;
        let (state, _) = watch::channel(cart);

        Self {
            inner: Arc::new(CartManagerInner {
                services,
                storage_key,
                writer: Mutex::new(()),
                state,
            }),
        }
    }

    /// Snapshot of the committed cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.state.borrow().clone()
    }

    /// Watch the committed cart. The receiver is woken after every commit.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.state.subscribe()
    }

    /// Key the cart is persisted under.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.storage_key
    }

    /// Add one unit of `product_id`.
    ///
    /// Fetches the product's metadata the first time it enters the cart.
    /// Aborts with [`Notice::OutOfStock`] once the stock ceiling is reached,
    /// or [`Notice::AddFailed`] if a lookup or the write fails.
    #[instrument(skip(self))]
    pub async fn add_product(&self, product_id: ProductId) -> Outcome {
        let _writer = self.inner.writer.lock().await;
        let result = self.try_add(product_id).await;
        self.finish(Operation::Add, result)
    }

    /// Remove the line for `product_id`, whatever its quantity.
    ///
    /// Aborts with [`Notice::RemoveFailed`] if the product is not in the
    /// cart or the write fails. The line at the head of the cart counts as
    /// not in the cart and cannot be removed.
    #[instrument(skip(self))]
    pub async fn remove_product(&self, product_id: ProductId) -> Outcome {
        let _writer = self.inner.writer.lock().await;
        let result = self.try_remove(product_id).await;
        self.finish(Operation::Remove, result)
    }

    /// Set the quantity of `product_id` to `amount`.
    ///
    /// `amount <= 0` is ignored without a notice; use
    /// [`remove_product`](Self::remove_product) to drop a line. Never creates
    /// a line. Aborts with [`Notice::OutOfStock`] above the stock ceiling, or
    /// [`Notice::UpdateFailed`] if the lookup fails, the product is not in
    /// the cart or the write fails.
    #[instrument(skip(self))]
    pub async fn update_product_amount(&self, product_id: ProductId, amount: i64) -> Outcome {
        if amount <= 0 {
            debug!(amount, "Ignoring non-positive amount");
            return Outcome::Ignored;
        }

        let _writer = self.inner.writer.lock().await;
        let result = self.try_update(product_id, amount.unsigned_abs()).await;
        self.finish(Operation::Update, result)
    }

    async fn try_add(&self, product_id: ProductId) -> Result<Cart, CartError> {
        let mut working = self.cart();

        let stock = self
            .inner
            .services
            .stock
            .stock(product_id)
            .await
            .map_err(CartError::StockQuery)?;

        let current = working.get(product_id).map_or(0, |item| item.amount.get());
        let desired = u64::from(current) + 1;
        if desired > u64::from(stock.amount) {
            return Err(CartError::StockExceeded {
                product_id,
                requested: desired,
                available: stock.amount,
            });
        }

        if let Some(item) = working.get_mut(product_id) {
            item.amount = item.amount.saturating_add(1);
        } else {
            let product = self
                .inner
                .services
                .products
                .product(product_id)
                .await
                .map_err(CartError::ProductQuery)?;
            working.push(CartItem::new(product))?;
        }

        self.persist(&working).await?;
        Ok(working)
    }

    async fn try_remove(&self, product_id: ProductId) -> Result<Cart, CartError> {
        let mut working = self.cart();

        // Position 0 is treated as absent, so the head line cannot be
        // removed. Kept until it is settled whether that line should be
        // removable like the others.
        let index = match working.position(product_id) {
            Some(index) if index > 0 => index,
            Some(_) => {
                debug!("Product is the head line, treated as not in cart");
                return Err(CartError::EntryNotFound(product_id));
            }
            None => return Err(CartError::EntryNotFound(product_id)),
        };
        working.remove_at(index);

        self.persist(&working).await?;
        Ok(working)
    }

    async fn try_update(&self, product_id: ProductId, requested: u64) -> Result<Cart, CartError> {
        let mut working = self.cart();

        let stock = self
            .inner
            .services
            .stock
            .stock(product_id)
            .await
            .map_err(CartError::StockQuery)?;

        let exceeded = || CartError::StockExceeded {
            product_id,
            requested,
            available: stock.amount,
        };
        if requested > u64::from(stock.amount) {
            return Err(exceeded());
        }
        let amount = u32::try_from(requested)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(exceeded)?;

        let item = working
            .get_mut(product_id)
            .ok_or(CartError::EntryNotFound(product_id))?;
        item.amount = amount;

        self.persist(&working).await?;
        Ok(working)
    }

    async fn persist(&self, cart: &Cart) -> Result<(), CartError> {
        let blob = serde_json::to_string(cart).map_err(StoreError::from)?;
        self.inner
            .services
            .store
            .set(&self.inner.storage_key, &blob)
            .await?;
        Ok(())
    }

    /// Publish a committed cart, or notify about an abort.
    fn finish(&self, operation: Operation, result: Result<Cart, CartError>) -> Outcome {
        match result {
            Ok(cart) => {
                info!(
                    %operation,
                    items = cart.len(),
                    quantity = cart.total_quantity(),
                    "Cart committed"
                );
                self.inner.state.send_replace(cart);
                Outcome::Committed
            }
            Err(error) => {
                let notice: Notice = error.notice(operation);
                match &error {
                    CartError::StockExceeded { .. } | CartError::EntryNotFound(_) => {
                        info!(%operation, error = %error, "Cart operation rejected");
                    }
                    _ => warn!(%operation, error = %error, "Cart operation failed"),
                }
                self.inner.services.notifier.notify(notice);
                Outcome::Aborted(error)
            }
        }
    }
}

/// Read the stored cart, falling back to an empty one.
async fn restore(store: &dyn KeyValueStore, key: &str) -> Cart {
    match store.get(key).await {
        Ok(Some(blob)) => match serde_json::from_str::<Cart>(&blob) {
            Ok(cart) => {
                info!(items = cart.len(), "Restored cart");
                cart
            }
            Err(e) => {
                warn!(error = %e, "Stored cart is malformed, starting empty");
                Cart::new()
            }
        },
        Ok(None) => {
            debug!("No stored cart, starting empty");
            Cart::new()
        }
        Err(e) => {
            warn!(error = %e, "Failed to read stored cart, starting empty");
            Cart::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rocketshoes_core::{Price, Product, Stock};
    use rust_decimal::Decimal;

    use super::*;
    use crate::api::ApiError;
    use crate::notify::RecordingNotifier;
    use crate::store::MemoryStore;

    const KEY: &str = "@RocketShoes:cart";

    /// Every product has `stock` units; counts lookups.
    struct FixedStock {
        stock: u32,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl StockSource for FixedStock {
        async fn stock(&self, id: ProductId) -> Result<Stock, ApiError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(Stock {
                id,
                amount: self.stock,
            })
        }
    }

    #[async_trait]
    impl ProductSource for FixedStock {
        async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
            Ok(Product::new(
                id,
                format!("Tênis {id}"),
                Price::new(Decimal::new(1799, 1)),
                "https://example.com/shoe.jpg",
            ))
        }
    }

    struct Harness {
        manager: CartManager,
        catalog: Arc<FixedStock>,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
    }

    async fn harness(store: MemoryStore, stock: u32) -> Harness {
        let catalog = Arc::new(FixedStock {
            stock,
            lookups: AtomicUsize::new(0),
        });
        let store = Arc::new(store);
        let notifier = Arc::new(RecordingNotifier::new());
        let services = CartServices::new(catalog.clone(), store.clone(), notifier.clone());
        Harness {
            manager: CartManager::load(services, KEY).await,
            catalog,
            store,
            notifier,
        }
    }

    #[tokio::test]
    async fn test_load_missing_blob_starts_empty() {
        let h = harness(MemoryStore::new(), 5).await;
        assert!(h.manager.cart().is_empty());
        assert_eq!(h.manager.storage_key(), KEY);
    }

    #[tokio::test]
    async fn test_load_malformed_blob_starts_empty() {
        let h = harness(MemoryStore::with_entry(KEY, "{not json"), 5).await;
        assert!(h.manager.cart().is_empty());
        assert!(h.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_load_restores_stored_cart() {
        let blob = r#"[{"id":2,"title":"Tênis 2","price":139.9,"image":"x","amount":3}]"#;
        let h = harness(MemoryStore::with_entry(KEY, blob), 5).await;

        let cart = h.manager.cart();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(2)).unwrap().amount.get(), 3);
    }

    #[tokio::test]
    async fn test_non_positive_update_skips_stock_lookup() {
        let h = harness(MemoryStore::new(), 5).await;

        assert!(matches!(
            h.manager.update_product_amount(ProductId::new(1), 0).await,
            Outcome::Ignored
        ));
        assert!(matches!(
            h.manager.update_product_amount(ProductId::new(1), -3).await,
            Outcome::Ignored
        ));

        assert_eq!(h.catalog.lookups.load(Ordering::SeqCst), 0);
        assert!(h.notifier.notices().is_empty());
        assert!(h.store.snapshot(KEY).is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_commits() {
        let h = harness(MemoryStore::new(), 5).await;
        let mut rx = h.manager.subscribe();

        assert!(h.manager.add_product(ProductId::new(1)).await.is_committed());

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);
    }

    #[tokio::test]
    async fn test_update_above_u32_is_out_of_stock() {
        let h = harness(MemoryStore::new(), u32::MAX).await;
        h.manager.add_product(ProductId::new(1)).await;

        let outcome = h
            .manager
            .update_product_amount(ProductId::new(1), i64::from(u32::MAX) + 1)
            .await;

        assert!(matches!(
            outcome.error(),
            Some(CartError::StockExceeded { .. })
        ));
        assert_eq!(h.notifier.notices(), vec![Notice::OutOfStock]);
    }

    /// Answers every product lookup with the record for product 1.
    struct Misfiled;

    #[async_trait]
    impl StockSource for Misfiled {
        async fn stock(&self, id: ProductId) -> Result<Stock, ApiError> {
            Ok(Stock { id, amount: 5 })
        }
    }

    #[async_trait]
    impl ProductSource for Misfiled {
        async fn product(&self, _id: ProductId) -> Result<Product, ApiError> {
            Ok(Product::new(
                ProductId::new(1),
                "Tênis 1",
                Price::new(Decimal::new(1799, 1)),
                "https://example.com/shoe.jpg",
            ))
        }
    }

    #[tokio::test]
    async fn test_add_rejects_record_that_duplicates_a_line() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let services = CartServices::new(Arc::new(Misfiled), store.clone(), notifier.clone());
        let manager = CartManager::load(services, KEY).await;
        assert!(manager.add_product(ProductId::new(1)).await.is_committed());
        let before = manager.cart();

        let outcome = manager.add_product(ProductId::new(2)).await;

        assert!(matches!(outcome.error(), Some(CartError::Data(_))));
        assert_eq!(notifier.notices(), vec![Notice::AddFailed]);
        assert_eq!(manager.cart(), before);
        assert_eq!(
            store.snapshot(KEY).unwrap(),
            serde_json::to_string(&before).unwrap()
        );
    }
}
