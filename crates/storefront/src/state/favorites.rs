//! Client-side mirror of the customer's favorites.
//!
//! Same pattern as the cart: gate on the session, call the endpoint,
//! re-fetch `GET /favorites`, replace local state.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use autoparts_core::ProductId;

use crate::api::ApiClient;
use crate::error::{ApiError, Result};
use crate::types::FavoriteItem;

use super::notify::Notifier;

pub const MSG_FAVORITE_ADDED: &str = "Agregado a favoritos";
pub const MSG_FAVORITE_REMOVED: &str = "Eliminado de favoritos";

const ACTION: &str = "gestionar tus favoritos";

/// Snapshot of the favorites context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesState {
    pub items: Vec<FavoriteItem>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Favorites shared by a storefront session.
pub struct FavoritesContext {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    state: RwLock<FavoritesState>,
}

impl FavoritesContext {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            state: RwLock::new(FavoritesState::default()),
        }
    }

    pub async fn snapshot(&self) -> FavoritesState {
        self.state.read().await.clone()
    }

    pub async fn items(&self) -> Vec<FavoriteItem> {
        self.state.read().await.items.clone()
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn is_favorite(&self, product_id: &ProductId) -> bool {
        self.state
            .read()
            .await
            .items
            .iter()
            .any(|f| &f.product_id == product_id)
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Re-fetch favorites. Signed out, this empties the state without a request.
    ///
    /// # Errors
    ///
    /// Returns the request error after routing it.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        match self.api.current_session() {
            Ok(Some(_)) => {}
            Ok(None) => {
                *self.state.write().await = FavoritesState::default();
                return Ok(());
            }
            Err(e) => return Err(self.handle_error(e).await),
        }

        self.state.write().await.loading = true;
        match self.api.list_favorites().await {
            Ok(items) => {
                self.replace(items).await;
                Ok(())
            }
            Err(e) => Err(self.handle_error(e).await),
        }
    }

    /// Save a product.
    ///
    /// # Errors
    ///
    /// Returns the request error after routing it.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId) -> Result<()> {
        self.mutate(MSG_FAVORITE_ADDED, || self.api.add_favorite(product_id))
            .await
    }

    /// Remove a saved product.
    ///
    /// # Errors
    ///
    /// Returns the request error after routing it.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<()> {
        self.mutate(MSG_FAVORITE_REMOVED, || self.api.remove_favorite(product_id))
            .await
    }

    /// Add or remove depending on the current state. Returns whether the
    /// product is a favorite afterwards.
    ///
    /// # Errors
    ///
    /// Returns the request error after routing it.
    pub async fn toggle(&self, product_id: &ProductId) -> Result<bool> {
        if self.is_favorite(product_id).await {
            self.remove(product_id).await?;
        } else {
            self.add(product_id).await?;
        }
        Ok(self.is_favorite(product_id).await)
    }

    async fn mutate<F, Fut>(&self, success: &str, op: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        match self.api.require_session(ACTION) {
            Ok(_) => {}
            Err(e @ ApiError::NotAuthenticated(_)) => return Err(self.reject(e).await),
            Err(e) => return Err(self.handle_error(e).await),
        }

        self.state.write().await.loading = true;
        let result = async {
            op().await?;
            self.api.list_favorites().await
        }
        .await;

        match result {
            Ok(items) => {
                self.replace(items).await;
                self.notifier.success(success);
                Ok(())
            }
            Err(e) => Err(self.handle_error(e).await),
        }
    }

    async fn replace(&self, items: Vec<FavoriteItem>) {
        let mut state = self.state.write().await;
        state.items = items;
        state.loading = false;
        state.error = None;
    }

    /// Record and toast an error raised before any request was sent.
    async fn reject(&self, error: ApiError) -> ApiError {
        let message = error.user_message();
        {
            let mut state = self.state.write().await;
            state.loading = false;
            state.error = Some(message.clone());
        }
        self.notifier.error(&message);
        error
    }

    async fn handle_error(&self, error: ApiError) -> ApiError {
        if error.is_auth_error() {
            debug!(error = %error, "Auth error, clearing favorites state");
            *self.state.write().await = FavoritesState::default();
            return error;
        }

        warn!(error = %error, "Favorites operation failed");
        let message = error.user_message();
        {
            let mut state = self.state.write().await;
            state.loading = false;
            state.error = Some(message.clone());
        }
        self.notifier.error(&message);
        error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::MemoryTokenStore;
    use crate::state::RecordingNotifier;

    #[tokio::test]
    async fn test_signed_out_toggle_is_rejected() {
        let config = ClientConfig::for_api_url("http://127.0.0.1:9/api").unwrap();
        let api = ApiClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = FavoritesContext::new(api, notifier.clone());

        let err = ctx.toggle(&ProductId::new("p1")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated(_)));
        assert_eq!(
            notifier.errors(),
            vec!["Debes iniciar sesión para gestionar tus favoritos"]
        );
        assert_eq!(ctx.count().await, 0);
    }

    #[tokio::test]
    async fn test_rejection_resets_loading() {
        let config = ClientConfig::for_api_url("http://127.0.0.1:9/api").unwrap();
        let api = ApiClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap();
        let ctx = FavoritesContext::new(api, Arc::new(RecordingNotifier::new()));
        ctx.state.write().await.loading = true;

        assert!(ctx.add(&ProductId::new("p1")).await.is_err());
        let state = ctx.snapshot().await;
        assert!(!state.loading);
        assert_eq!(
            state.error.as_deref(),
            Some("Debes iniciar sesión para gestionar tus favoritos")
        );
    }
}
