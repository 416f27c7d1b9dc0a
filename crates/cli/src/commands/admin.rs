//! Store administration commands.
//!
//! Every command requires a signed-in admin; the admin client refuses
//! locally otherwise.

use autoparts_admin::{ProductInput, ProductPatch};
use autoparts_core::{OrderId, OrderStatus, ProductId, UserId};
use autoparts_storefront::Result;

use super::{App, output};

pub async fn list_orders(app: &App) -> Result<()> {
    let orders = app.admin().list_orders().await?;
    output::orders(&orders);
    Ok(())
}

pub async fn show_order(app: &App, id: &OrderId) -> Result<()> {
    let order = app.admin().get_order(id).await?;
    output::order(&order);
    Ok(())
}

pub async fn set_order_status(app: &App, id: &OrderId, status: OrderStatus) -> Result<()> {
    let order = app.admin().update_order_status(id, status).await?;
    output::line(&format!("Pedido {} ahora está {}", order.id, order.status.label().to_lowercase()));
    Ok(())
}

pub async fn list_users(app: &App) -> Result<()> {
    let users = app.admin().list_users().await?;
    output::users(&users);
    Ok(())
}

pub async fn show_user(app: &App, id: &UserId) -> Result<()> {
    let user = app.admin().get_user(id).await?;
    output::user(&user);
    Ok(())
}

pub async fn toggle_ban(app: &App, id: &UserId) -> Result<()> {
    let user = app.admin().toggle_ban(id).await?;
    let state = if user.is_banned { "bloqueado" } else { "desbloqueado" };
    output::line(&format!("Usuario {} {state}", user.email));
    Ok(())
}

pub async fn create_product(app: &App, input: &ProductInput) -> Result<()> {
    let product = app.admin().create_product(input).await?;
    output::line(&format!("Producto creado: {}", product.id));
    Ok(())
}

pub async fn update_product(app: &App, id: &ProductId, patch: &ProductPatch) -> Result<()> {
    let product = app.admin().update_product(id, patch).await?;
    output::product(&product);
    Ok(())
}

pub async fn delete_product(app: &App, id: &ProductId) -> Result<()> {
    app.admin().delete_product(id).await?;
    output::line(&format!("Producto {id} eliminado"));
    Ok(())
}

pub async fn dashboard(app: &App) -> Result<()> {
    let stats = app.admin().dashboard().await?;
    output::dashboard(&stats);
    Ok(())
}
