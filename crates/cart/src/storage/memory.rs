//! In-memory slot storage.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{Storage, StorageError};

/// Slots held in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with `key` already holding `value`.
    #[must_use]
    pub fn with_slot(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        storage
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let storage = MemoryStorage::new();
        assert!(storage.get("cart").unwrap().is_none());
    }

    #[test]
    fn test_set_then_get() {
        let storage = MemoryStorage::new();
        storage.set("cart", "[]").unwrap();
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_overwrites_previous() {
        let storage = MemoryStorage::with_slot("cart", "first");
        storage.set("cart", "second").unwrap();
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_slots_are_independent() {
        let storage = MemoryStorage::with_slot("cart", "[]");
        assert!(storage.get("wishlist").unwrap().is_none());
    }
}
