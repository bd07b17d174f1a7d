//! Durable key-value slots for the cart snapshot.
//!
//! The cart manager only needs to read and replace one named slot, so the
//! [`Storage`] trait is the smallest surface that covers it. Backends:
//!
//! - [`MemoryStorage`] - process-local map, for tests and throwaway sessions
//! - [`FileStorage`] - one JSON file per slot, replaced atomically

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Errors that can occur when reading or writing a slot.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The slot name cannot be used by this backend.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// A durable store of named string slots.
///
/// Reads return `None` for a slot that was never written. Writes replace the
/// whole slot; a reader never observes a partially written value.
#[cfg_attr(test, automock)]
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be durably written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
