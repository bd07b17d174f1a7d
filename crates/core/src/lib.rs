//! RocketShoes Core - Shared types library.
//!
//! This crate provides the domain types used across all RocketShoes components:
//! - `cart` - Cart manager (stock validation, persistence)
//! - `cli` - Command-line presentation layer
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. Cart invariants that can be checked without the network (unique
//! product ids, positive amounts) are enforced here.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs and prices, catalog records,
//!   and the cart model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
