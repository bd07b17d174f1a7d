//! Command implementations.

pub mod cart;

use std::sync::Arc;

use tracing::warn;

use rocketshoes_cart::{ApiClient, CartConfig, CartManager, FileStorage, SnapshotStatus};

/// Build a cart manager from the environment.
///
/// # Errors
///
/// Returns an error if configuration is missing or invalid, or the HTTP
/// client cannot be built.
pub fn open_cart() -> Result<CartManager, Box<dyn std::error::Error>> {
    let config = CartConfig::from_env()?;
    let api = ApiClient::new(&config.api)?;
    let storage = Arc::new(FileStorage::new(&config.storage_dir));

    let cart = CartManager::with_api(api, storage, config.storage_key.clone());
    if let SnapshotStatus::Discarded { reason } = cart.snapshot_status() {
        warn!(%reason, "Stored cart was unusable and has been reset");
    }

    Ok(cart)
}
