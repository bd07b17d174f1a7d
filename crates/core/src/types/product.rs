//! Catalog records returned by the storefront API.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Product metadata as served by `GET /products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Image URL.
    pub image: String,
}

/// Available stock for a product, as served by `GET /stock/{id}`.
///
/// This is the authoritative ceiling for a cart line's amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    /// Product identifier. Some stock endpoints omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    /// Units available.
    pub amount: u32,
}

impl Stock {
    /// Whether `requested` units can be satisfied by this stock record.
    #[must_use]
    pub const fn covers(&self, requested: u32) -> bool {
        requested <= self.amount
    }
}
