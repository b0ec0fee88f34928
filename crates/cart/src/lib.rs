//! RocketShoes cart.
//!
//! Client-side cart state for the RocketShoes storefront: adding, removing,
//! and updating quantities of products, with every change checked against
//! the remote stock API and persisted to local storage.
//!
//! # Architecture
//!
//! - [`rules`] - stock checks and next-cart computation
//! - [`store`] - [`CartStore`], which commits rule outputs to memory and storage
//! - [`api`] - stock/catalog ports and the `reqwest` REST adapter
//! - [`storage`] - persistence port with file and in-memory adapters
//! - [`notifier`] - user-facing message sink
//! - [`config`] - environment configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rocketshoes_cart::{ApiClient, CartConfig, CartPorts, CartStore, JsonFileStorage, ToastQueue};
//!
//! let config = CartConfig::from_env()?;
//! let api = Arc::new(ApiClient::new(&config.api)?);
//! let toasts = Arc::new(ToastQueue::new());
//!
//! let mut store = CartStore::initialize(CartPorts {
//!     stock: api.clone(),
//!     catalog: api,
//!     storage: Arc::new(JsonFileStorage::new(&config.storage_path)),
//!     notifier: toasts.clone(),
//! });
//!
//! store.add_product(ProductId::new(1)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod notifier;
pub mod rules;
pub mod storage;
pub mod store;

pub use api::{ApiClient, ApiError, ProductCatalog, StockGateway};
pub use config::{ApiConfig, CartConfig, ConfigError};
pub use error::{CartError, CartOperation};
pub use notifier::{Notification, NotificationLevel, Notifier, ToastQueue, TracingNotifier};
pub use storage::{CART_STORAGE_KEY, CartStorage, JsonFileStorage, MemoryStorage, StorageError};
pub use store::{CartPorts, CartStore};
