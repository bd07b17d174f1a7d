//! Per-product operation queue.
//!
//! Cart operations on the same product run one at a time, in arrival order.
//! Each product gets its own `tokio` mutex (FIFO), created on first use and
//! dropped again once nobody holds or waits for it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use rocketshoes_core::ProductId;

/// Lazily created async locks keyed by product.
#[derive(Debug, Default)]
pub struct ProductLocks {
    locks: Mutex<HashMap<ProductId, Arc<AsyncMutex<()>>>>,
}

impl ProductLocks {
    /// Wait until no other operation holds `id`, then hold it until the
    /// returned guard is dropped.
    pub async fn acquire(&self, id: ProductId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Clones are only handed out under this mutex, so a count of one
            // means the entry is idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of products with a held or awaited lock.
    #[cfg(test)]
    fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
