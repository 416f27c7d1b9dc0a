//! Order history commands.

use autoparts_core::OrderId;
use autoparts_storefront::Result;

use super::{App, output};

pub async fn list(app: &App) -> Result<()> {
    app.api.require_session("ver tus pedidos")?;
    let orders = app.api.list_orders().await?;
    output::orders(&orders);
    Ok(())
}

pub async fn show(app: &App, id: &OrderId) -> Result<()> {
    app.api.require_session("ver tus pedidos")?;
    let order = app.api.get_order(id).await?;
    output::order(&order);
    Ok(())
}
