//! Favorites commands.

use autoparts_core::ProductId;
use autoparts_storefront::Result;

use super::{App, output};

pub async fn list(app: &App) -> Result<()> {
    let favorites = app.favorites().await?;
    output::favorites(&favorites.items().await);
    Ok(())
}

pub async fn add(app: &App, product_id: &ProductId) -> Result<()> {
    app.favorites().await?.add(product_id).await
}

pub async fn remove(app: &App, product_id: &ProductId) -> Result<()> {
    app.favorites().await?.remove(product_id).await
}

pub async fn toggle(app: &App, product_id: &ProductId) -> Result<()> {
    let saved = app.favorites().await?.toggle(product_id).await?;
    tracing::debug!(saved, "Favorite toggled");
    Ok(())
}
