//! Core types for RocketShoes.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartItem, InvalidCart};
pub use id::*;
pub use price::Price;
pub use product::{Product, Stock};
