//! Cart operation errors and the notifications they map to.
//!
//! Every cart operation returns `Result<(), CartError>`. The presentation
//! layer decides how to render a failure; [`CartError::notification`] gives
//! the user-facing kind and [`Notification::message`] its text.

use core::fmt;

use serde::Serialize;
use thiserror::Error;

use rocketshoes_core::{InvalidCart, ProductId};

use crate::api::ApiError;
use crate::storage::StorageError;

/// The mutating operations of the cart manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartOperation {
    /// Add one unit of a product.
    Add,
    /// Remove a product line.
    Remove,
    /// Set the amount of a product line.
    Update,
}

impl CartOperation {
    /// Notification shown when this operation fails for a reason other than
    /// stock.
    #[must_use]
    pub const fn failure(self) -> Notification {
        match self {
            Self::Add => Notification::AddFailed,
            Self::Remove => Notification::RemoveFailed,
            Self::Update => Notification::UpdateFailed,
        }
    }
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// User-facing failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    /// The requested amount exceeds available stock.
    OutOfStock,
    /// A product could not be added.
    AddFailed,
    /// A product could not be removed.
    RemoveFailed,
    /// A product amount could not be changed.
    UpdateFailed,
}

impl Notification {
    /// Message shown to the shopper.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::OutOfStock => "Requested quantity is out of stock",
            Self::AddFailed => "Error adding product",
            Self::RemoveFailed => "Error removing product",
            Self::UpdateFailed => "Error updating product quantity",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Why a cart operation left the cart unchanged.
#[derive(Debug, Error)]
pub enum CartError {
    /// More units were requested than the stock holds.
    #[error("product {product_id}: requested {requested} but only {available} in stock")]
    StockExceeded {
        /// Product concerned.
        product_id: ProductId,
        /// Units the operation would have left in the cart.
        requested: u64,
        /// Units in stock.
        available: u32,
    },

    /// The product has no line in the cart.
    #[error("{operation} failed: product {product_id} is not in the cart")]
    NotInCart {
        /// Operation that failed.
        operation: CartOperation,
        /// Product concerned.
        product_id: ProductId,
    },

    /// A stock or product lookup failed.
    #[error("{operation} failed: lookup for product {product_id}: {source}")]
    Lookup {
        /// Operation that failed.
        operation: CartOperation,
        /// Product concerned.
        product_id: ProductId,
        /// Underlying API error.
        #[source]
        source: ApiError,
    },

    /// The snapshot could not be written.
    #[error("{operation} failed: {source}")]
    Storage {
        /// Operation that failed.
        operation: CartOperation,
        /// Underlying storage error.
        #[source]
        source: StorageError,
    },

    /// The cart could not be encoded for storage.
    #[error("{operation} failed: encoding cart snapshot: {source}")]
    Snapshot {
        /// Operation that failed.
        operation: CartOperation,
        /// Underlying encoding error.
        #[source]
        source: serde_json::Error,
    },

    /// The change would have broken a cart invariant.
    #[error("{operation} failed: {source}")]
    Conflict {
        /// Operation that failed.
        operation: CartOperation,
        /// Violated invariant.
        #[source]
        source: InvalidCart,
    },
}

impl CartError {
    /// The notification the presentation layer should show.
    #[must_use]
    pub const fn notification(&self) -> Notification {
        match self {
            Self::StockExceeded { .. } => Notification::OutOfStock,
            Self::NotInCart { operation, .. }
            | Self::Lookup { operation, .. }
            | Self::Storage { operation, .. }
            | Self::Snapshot { operation, .. }
            | Self::Conflict { operation, .. } => operation.failure(),
        }
    }

    /// Map an invariant violation raised while applying `operation`.
    pub(crate) fn invalid(operation: CartOperation, source: InvalidCart) -> Self {
        match source {
            InvalidCart::UnknownProduct(product_id) => Self::NotInCart {
                operation,
                product_id,
            },
            InvalidCart::DuplicateProduct(_) | InvalidCart::ZeroAmount(_) => {
                Self::Conflict { operation, source }
            }
        }
    }
}
