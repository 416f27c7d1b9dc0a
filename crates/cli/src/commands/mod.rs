//! Command implementations.
//!
//! Each command builds on a shared [`App`]: one API client backed by the
//! session file, and the state contexts that drive cart and favorites.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod favorites;
pub mod orders;
mod output;
pub mod products;

use std::sync::Arc;

use autoparts_admin::AdminClient;
use autoparts_storefront::state::{CartContext, FavoritesContext, Notifier};
use autoparts_storefront::{ApiClient, ClientConfig, FileTokenStore, Result};

pub use output::ConsoleNotifier;

/// Shared client state for one CLI invocation.
pub struct App {
    pub api: ApiClient,
    notifier: Arc<dyn Notifier>,
}

impl App {
    /// Build the client from configuration, persisting the session to the
    /// configured file.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let store = Arc::new(FileTokenStore::new(config.session_file.clone()));
        tracing::debug!(path = %config.session_file.display(), "Using session file");
        Ok(Self {
            api: ApiClient::new(config, store)?,
            notifier: Arc::new(ConsoleNotifier),
        })
    }

    /// Cart context loaded with the current cart.
    pub async fn cart(&self) -> Result<CartContext> {
        let cart = CartContext::new(self.api.clone(), Arc::clone(&self.notifier));
        cart.refresh().await?;
        Ok(cart)
    }

    /// Favorites context loaded with the saved products.
    pub async fn favorites(&self) -> Result<FavoritesContext> {
        let favorites = FavoritesContext::new(self.api.clone(), Arc::clone(&self.notifier));
        favorites.refresh().await?;
        Ok(favorites)
    }

    pub fn admin(&self) -> AdminClient {
        AdminClient::new(self.api.clone())
    }
}
