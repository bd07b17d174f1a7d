//! RocketShoes Cart - Shopping cart state manager.
//!
//! Holds the shopper's cart, validates every change against live stock from
//! the storefront API, and mirrors the cart to durable storage so it survives
//! a restart.
//!
//! # Architecture
//!
//! ```text
//! presentation (cli)
//!        │  add / remove / update
//!        ▼
//!   CartManager ──── StockLookup / ProductLookup ──── storefront API
//!        │
//!        └────────── Storage ──── snapshot slot (JSON array of cart lines)
//! ```
//!
//! # Modules
//!
//! - [`manager`] - The [`CartManager`] and its commit path
//! - [`api`] - Stock and product lookups over HTTP
//! - [`storage`] - Snapshot slots (memory, file)
//! - [`config`] - Environment configuration
//! - [`error`] - Operation errors and user-facing notifications
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use rocketshoes_cart::{ApiClient, CartConfig, CartManager, FileStorage};
//!
//! let config = CartConfig::from_env()?;
//! let api = ApiClient::new(&config.api)?;
//! let storage = Arc::new(FileStorage::new(&config.storage_dir));
//! let cart = CartManager::with_api(api, storage, config.storage_key.clone());
//!
//! if let Err(e) = cart.add_product(ProductId::new(1)).await {
//!     eprintln!("{}", e.notification());
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
mod locks;
pub mod manager;
pub mod storage;

pub use api::{ApiClient, ApiError, ProductLookup, StockLookup};
pub use config::{ApiConfig, CartConfig, ConfigError};
pub use error::{CartError, CartOperation, Notification};
pub use manager::{CartManager, SnapshotStatus};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
