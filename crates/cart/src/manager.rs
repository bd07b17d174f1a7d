//! The cart manager.
//!
//! [`CartManager`] owns the shopper's [`Cart`] and mirrors it to a
//! [`Storage`] slot after every successful change. The three mutating
//! operations validate against live stock, and every change follows the
//! same commit path:
//!
//! 1. Apply the change to a copy of the current cart.
//! 2. Encode the copy and write it to storage.
//! 3. Only if the write succeeded, make the copy the current cart.
//!
//! Steps 1-3 run under one short synchronous lock, so the snapshot and the
//! in-memory cart either both advance or neither does, and snapshots land in
//! the order the cart changes. Operations on the same product are queued
//! behind each other in arrival order; lookups for different products
//! still run concurrently.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument, warn};

use rocketshoes_core::{Cart, CartItem, InvalidCart, ProductId, Stock};

use crate::api::{ApiClient, ProductLookup, StockLookup};
use crate::error::{CartError, CartOperation};
use crate::locks::ProductLocks;
use crate::storage::Storage;

/// How [`CartManager::initialize`] resolved the stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStatus {
    /// Nothing was stored; the cart starts empty.
    Missing,
    /// The stored cart was loaded.
    Restored {
        /// Number of product lines restored.
        items: usize,
    },
    /// The stored value could not be used; the cart starts empty.
    Discarded {
        /// Why the snapshot was rejected.
        reason: String,
    },
}

/// Shopping cart state container.
///
/// Cheap to clone; clones share the same cart.
#[derive(Clone)]
pub struct CartManager {
    inner: Arc<CartManagerInner>,
}

struct CartManagerInner {
    storage: Arc<dyn Storage>,
    stock: Arc<dyn StockLookup>,
    products: Arc<dyn ProductLookup>,
    storage_key: String,
    cart: Mutex<Cart>,
    locks: ProductLocks,
    snapshot_status: SnapshotStatus,
}

impl std::fmt::Debug for CartManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartManager")
            .field("storage_key", &self.inner.storage_key)
            .field("cart", &*self.lock_cart())
            .field("snapshot_status", &self.inner.snapshot_status)
            .finish_non_exhaustive()
    }
}

impl CartManager {
    /// Create a manager, restoring the cart stored under `storage_key`.
    ///
    /// Never fails and makes no network calls. A missing snapshot gives an
    /// empty cart. An unreadable or invalid snapshot also gives an empty
    /// cart; that case is logged as a warning and reported by
    /// [`CartManager::snapshot_status`].
    pub fn initialize(
        storage: Arc<dyn Storage>,
        stock: Arc<dyn StockLookup>,
        products: Arc<dyn ProductLookup>,
        storage_key: impl Into<String>,
    ) -> Self {
        let storage_key = storage_key.into();
        let (cart, snapshot_status) = load_snapshot(storage.as_ref(), &storage_key);

        Self {
            inner: Arc::new(CartManagerInner {
                storage,
                stock,
                products,
                storage_key,
                cart: Mutex::new(cart),
                locks: ProductLocks::default(),
                snapshot_status,
            }),
        }
    }

    /// Create a manager whose stock and product lookups both go to `api`.
    pub fn with_api(
        api: ApiClient,
        storage: Arc<dyn Storage>,
        storage_key: impl Into<String>,
    ) -> Self {
        let api = Arc::new(api);
        Self::initialize(storage, api.clone(), api, storage_key)
    }

    /// A copy of the current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.lock_cart().clone()
    }

    /// How the stored snapshot was resolved at start-up.
    #[must_use]
    pub fn snapshot_status(&self) -> &SnapshotStatus {
        &self.inner.snapshot_status
    }

    /// Storage slot this manager writes to.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.storage_key
    }

    /// Add one unit of a product.
    ///
    /// A product already in the cart has its amount incremented; otherwise
    /// its metadata is fetched and a new line with one unit is appended.
    ///
    /// # Errors
    ///
    /// - [`CartError::StockExceeded`] if the new amount would exceed stock
    /// - [`CartError::Lookup`] if the stock or product lookup fails
    /// - [`CartError::Storage`] if the snapshot cannot be written
    ///
    /// The cart and the snapshot are unchanged on error.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn add_product(&self, id: ProductId) -> Result<(), CartError> {
        let operation = CartOperation::Add;
        let _queued = self.inner.locks.acquire(id).await;

        let current = self.lock_cart().amount_of(id);
        let stock = self.fetch_stock(operation, id).await?;

        let requested = u64::from(current) + 1;
        let amount = within_stock(id, requested, &stock)?;

        if current > 0 {
            self.commit(operation, |cart| cart.set_amount(id, amount))?;
        } else {
            let product = self
                .inner
                .products
                .product(id)
                .await
                .map_err(|source| lookup_failed(operation, id, source))?;
            self.commit(operation, |cart| cart.push(CartItem::new(product, amount)))?;
        }

        info!(amount, "Added product to cart");
        Ok(())
    }

    /// Remove a product line.
    ///
    /// Makes no lookups; the call only waits if another operation on the same
    /// product is in flight.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotInCart`] if the product has no line
    /// - [`CartError::Storage`] if the snapshot cannot be written
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn remove_product(&self, id: ProductId) -> Result<(), CartError> {
        let _queued = self.inner.locks.acquire(id).await;

        self.commit(CartOperation::Remove, |cart| {
            cart.remove(id)
                .map(drop)
                .ok_or(InvalidCart::UnknownProduct(id))
        })?;

        info!("Removed product from cart");
        Ok(())
    }

    /// Set the amount of a product line.
    ///
    /// Amounts of zero or less are ignored: this never removes a line. Route
    /// "decrement to zero" to [`CartManager::remove_product`] instead.
    ///
    /// # Errors
    ///
    /// - [`CartError::StockExceeded`] if `amount` exceeds stock
    /// - [`CartError::NotInCart`] if the product has no line
    /// - [`CartError::Lookup`] if the stock lookup fails
    /// - [`CartError::Storage`] if the snapshot cannot be written
    #[instrument(skip_all, fields(product_id = %id, amount))]
    pub async fn update_product_amount(&self, id: ProductId, amount: i64) -> Result<(), CartError> {
        if amount <= 0 {
            debug!(amount, "Ignoring non-positive amount");
            return Ok(());
        }

        let operation = CartOperation::Update;
        let _queued = self.inner.locks.acquire(id).await;

        let stock = self.fetch_stock(operation, id).await?;
        let amount = within_stock(id, amount.unsigned_abs(), &stock)?;

        self.commit(operation, |cart| cart.set_amount(id, amount))?;

        info!(amount, "Updated product amount");
        Ok(())
    }

    async fn fetch_stock(&self, operation: CartOperation, id: ProductId) -> Result<Stock, CartError> {
        self.inner
            .stock
            .stock(id)
            .await
            .map_err(|source| lookup_failed(operation, id, source))
    }

    /// Apply `change` to a copy of the cart, persist it, then publish it.
    fn commit<F>(&self, operation: CartOperation, change: F) -> Result<(), CartError>
    where
        F: FnOnce(&mut Cart) -> Result<(), InvalidCart>,
    {
        let mut cart = self.lock_cart();

        let mut next = cart.clone();
        change(&mut next).map_err(|source| CartError::invalid(operation, source))?;

        let snapshot = serde_json::to_string(&next)
            .map_err(|source| CartError::Snapshot { operation, source })?;

        self.inner
            .storage
            .set(&self.inner.storage_key, &snapshot)
            .map_err(|source| {
                warn!(%operation, error = %source, "Failed to persist cart");
                CartError::Storage { operation, source }
            })?;

        *cart = next;
        Ok(())
    }

    fn lock_cart(&self) -> MutexGuard<'_, Cart> {
        self.inner
            .cart
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Check `requested` units against `stock`, returning them as a line amount.
fn within_stock(id: ProductId, requested: u64, stock: &Stock) -> Result<u32, CartError> {
    match u32::try_from(requested) {
        Ok(amount) if stock.covers(amount) => Ok(amount),
        _ => {
            info!(
                product_id = %id,
                requested,
                available = stock.amount,
                "Requested amount exceeds stock"
            );
            Err(CartError::StockExceeded {
                product_id: id,
                requested,
                available: stock.amount,
            })
        }
    }
}

fn lookup_failed(
    operation: CartOperation,
    product_id: ProductId,
    source: crate::api::ApiError,
) -> CartError {
    warn!(%operation, %product_id, error = %source, "Lookup failed");
    CartError::Lookup {
        operation,
        product_id,
        source,
    }
}

/// Read and decode the snapshot stored under `key`.
fn load_snapshot(storage: &dyn Storage, key: &str) -> (Cart, SnapshotStatus) {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key, "No stored cart");
            return (Cart::new(), SnapshotStatus::Missing);
        }
        Err(e) => {
            warn!(key, error = %e, "Failed to read stored cart, starting empty");
            return (
                Cart::new(),
                SnapshotStatus::Discarded {
                    reason: e.to_string(),
                },
            );
        }
    };

    match serde_json::from_str::<Cart>(&raw) {
        Ok(cart) => {
            let items = cart.len();
            info!(key, items, "Restored stored cart");
            (cart, SnapshotStatus::Restored { items })
        }
        Err(e) => {
            warn!(
                key,
                error = %e,
                snapshot = %raw.chars().take(200).collect::<String>(),
                "Discarding malformed stored cart, starting empty"
            );
            (
                Cart::new(),
                SnapshotStatus::Discarded {
                    reason: e.to_string(),
                },
            )
        }
    }
}
