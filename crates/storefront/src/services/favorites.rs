//! Favorites endpoints.

use serde::de::IgnoredAny;
use tracing::instrument;

use autoparts_core::ProductId;

use crate::api::{ApiClient, segment, unwrap_list};
use crate::error::Result;
use crate::types::FavoriteItem;

fn favorite_path(product_id: &ProductId) -> String {
    format!("/favorites/{}", segment(product_id.as_str()))
}

impl ApiClient {
    /// List the customer's favorites.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_favorites(&self) -> Result<Vec<FavoriteItem>> {
        let value = self.get_raw("/favorites", &[]).await?;
        unwrap_list(value, "favorites")
    }

    /// Save a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_favorite(&self, product_id: &ProductId) -> Result<()> {
        let _: IgnoredAny = self.post_empty(&favorite_path(product_id)).await?;
        Ok(())
    }

    /// Remove a saved product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_favorite(&self, product_id: &ProductId) -> Result<()> {
        let _: IgnoredAny = self.delete(&favorite_path(product_id)).await?;
        Ok(())
    }
}
