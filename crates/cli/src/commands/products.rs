//! Catalog commands.

use autoparts_core::ProductId;
use autoparts_storefront::Result;
use autoparts_storefront::types::ProductFilter;

use super::{App, output};

pub async fn list(app: &App, filter: &ProductFilter) -> Result<()> {
    let page = app.api.list_products(filter).await?;
    output::product_page(&page);
    Ok(())
}

pub async fn show(app: &App, id: &ProductId) -> Result<()> {
    let product = app.api.get_product(id).await?;
    output::product(&product);
    Ok(())
}

pub async fn facets(app: &App) -> Result<()> {
    let facets = app.api.product_facets().await?;
    output::facets(&facets);
    Ok(())
}
