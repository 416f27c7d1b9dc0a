//! Autoparts storefront client library.
//!
//! Talks to the auto parts REST backend: catalog, cart, favorites, orders,
//! MercadoPago checkout and authentication. The cart and favorites contexts
//! in [`state`] mirror server state for a front end (the `ap-cli` binary, or
//! any embedder).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod state;
pub mod types;

pub use api::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, Result};
pub use session::{AuthSession, FileTokenStore, MemoryTokenStore, TokenStore};
