//! Cart commands.
//!
//! Each command loads the cart from the file store under the configured
//! data directory, runs at most one transaction, then prints the committed
//! cart as pretty JSON on stdout.
//!
//! # Environment Variables
//!
//! See [`rocketshoes_cart::config`] for the full list.

use std::io::Write;
use std::sync::Arc;

use tracing::info;

use rocketshoes_cart::{
    ApiClient, CartConfig, CartManager, CartServices, FileStore, Outcome, TracingNotifier,
};
use rocketshoes_core::{Cart, ProductId};

use super::CommandError;

/// Build the manager from configuration.
async fn open(config: &CartConfig) -> Result<CartManager, CommandError> {
    let catalog = Arc::new(ApiClient::new(&config.api)?);
    let store = Arc::new(FileStore::in_dir(&config.data_dir));
    info!(path = %store.path().display(), api = %catalog.base_url(), "Opening cart");

    let services = CartServices::new(catalog, store, Arc::new(TracingNotifier));
    Ok(CartManager::load(services, config.storage_key.clone()).await)
}

/// Print the stored cart.
///
/// # Errors
///
/// Returns an error if the catalog client cannot be built or stdout fails.
pub async fn show(config: &CartConfig) -> Result<(), CommandError> {
    let manager = open(config).await?;
    print_cart(&manager.cart())
}

/// Add one unit of `id`.
///
/// # Errors
///
/// Returns `CommandError::Aborted` if the add was rejected.
pub async fn add(config: &CartConfig, id: ProductId) -> Result<(), CommandError> {
    let manager = open(config).await?;
    let outcome = manager.add_product(id).await;
    finish(&manager, outcome)
}

/// Remove the line for `id`.
///
/// # Errors
///
/// Returns `CommandError::Aborted` if the removal was rejected.
pub async fn remove(config: &CartConfig, id: ProductId) -> Result<(), CommandError> {
    let manager = open(config).await?;
    let outcome = manager.remove_product(id).await;
    finish(&manager, outcome)
}

/// Set the quantity of `id` to `amount`.
///
/// # Errors
///
/// Returns `CommandError::Aborted` if the update was rejected.
pub async fn update(config: &CartConfig, id: ProductId, amount: i64) -> Result<(), CommandError> {
    let manager = open(config).await?;
    let outcome = manager.update_product_amount(id, amount).await;
    finish(&manager, outcome)
}

fn finish(manager: &CartManager, outcome: Outcome) -> Result<(), CommandError> {
    settle(outcome)?;
    print_cart(&manager.cart())
}

/// An aborted transaction becomes the command's error, so the process exits 1.
fn settle(outcome: Outcome) -> Result<(), CommandError> {
    match outcome {
        Outcome::Committed | Outcome::Ignored => Ok(()),
        Outcome::Aborted(error) => Err(error.into()),
    }
}

fn print_cart(cart: &Cart) -> Result<(), CommandError> {
    write_cart(&mut std::io::stdout().lock(), cart)
}

fn write_cart(out: &mut impl Write, cart: &Cart) -> Result<(), CommandError> {
    let json = serde_json::to_string_pretty(cart)?;
    writeln!(out, "{json}")?;
    Ok(())
}
