//! CropCare client library.
//!
//! Everything the mobile app needs below the presentation layer:
//!
//! - [`api`] - typed HTTP clients for products, cart, orders, user, OTP auth,
//!   and plant analysis
//! - [`store`] - the application store holding products, cart, and orders
//!   with per-slice loading and error state
//! - [`plant`] - normalizer for the plant-analysis response payloads
//! - [`storage`] / [`session`] - persisted key-value storage and the typed
//!   session and preferences view over it
//! - [`config`] / [`telemetry`] - environment configuration and tracing/Sentry
//!   setup
//!
//! # Example
//!
//! ```rust,ignore
//! use cropcare_client::{ApiClient, AppStore, ClientConfig, LocalStorage};
//!
//! let config = ClientConfig::from_env()?;
//! let storage = LocalStorage::open(config.storage_path.as_deref()).await?;
//! let api = ApiClient::new(&config, storage.clone())?;
//! let store = AppStore::new(api, storage);
//!
//! store.hydrate().await;
//! store.refresh_all().await?;
//! store.add_to_cart(&"p1".into(), 1).await?;
//! println!("total: {}", store.cart_total());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod plant;
pub mod session;
pub mod storage;
pub mod store;
pub mod telemetry;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use plant::PlantAnalysisResult;
pub use session::{LaunchRoute, Session};
pub use storage::LocalStorage;
pub use store::AppStore;
