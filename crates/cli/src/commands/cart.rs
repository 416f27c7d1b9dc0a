//! Cart and checkout commands.
//!
//! Each command loads the cart first so local checks (stock, empty cart)
//! see the current server state.

use autoparts_core::{CartItemId, ProductId};
use autoparts_storefront::Result;
use autoparts_storefront::types::GuestCartItem;

use super::{App, output};

/// Parse a guest line given as `PRODUCT_ID:QUANTITY`; the quantity defaults to 1.
pub fn parse_guest_item(raw: &str) -> std::result::Result<GuestCartItem, String> {
    let (id, quantity) = match raw.rsplit_once(':') {
        Some((id, qty)) => {
            let quantity = qty
                .parse::<u32>()
                .map_err(|_| format!("invalid quantity in '{raw}'"))?;
            (id, quantity)
        }
        None => (raw, 1),
    };
    if id.is_empty() {
        return Err(format!("missing product id in '{raw}'"));
    }
    if quantity == 0 {
        return Err(format!("quantity must be positive in '{raw}'"));
    }
    Ok(GuestCartItem {
        product_id: ProductId::new(id),
        quantity,
    })
}

pub async fn show(app: &App) -> Result<()> {
    let cart = app.cart().await?;
    output::cart(cart.cart().await.as_ref());
    Ok(())
}

pub async fn add(app: &App, product_id: &ProductId, quantity: u32) -> Result<()> {
    let cart = app.cart().await?;
    cart.add_item(product_id, quantity).await?;
    output::cart(cart.cart().await.as_ref());
    Ok(())
}

pub async fn update(app: &App, item_id: &CartItemId, quantity: u32) -> Result<()> {
    let cart = app.cart().await?;
    cart.update_quantity(item_id, quantity).await?;
    output::cart(cart.cart().await.as_ref());
    Ok(())
}

pub async fn remove(app: &App, item_id: &CartItemId) -> Result<()> {
    let cart = app.cart().await?;
    cart.remove_item(item_id).await?;
    output::cart(cart.cart().await.as_ref());
    Ok(())
}

pub async fn clear(app: &App) -> Result<()> {
    let cart = app.cart().await?;
    cart.clear_cart().await
}

pub async fn merge(app: &App, items: &[GuestCartItem]) -> Result<()> {
    let cart = app.cart().await?;
    cart.merge_carts(items).await?;
    output::cart(cart.cart().await.as_ref());
    Ok(())
}

pub async fn validate(app: &App) -> Result<()> {
    let cart = app.cart().await?;
    let validation = cart.validate_for_checkout().await?;
    output::validation(&validation);
    Ok(())
}

pub async fn checkout(app: &App) -> Result<()> {
    let cart = app.cart().await?;
    let url = cart.checkout().await?;
    output::line(&format!("Completa el pago en: {url}"));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_guest_item() {
        let item = parse_guest_item("64b7f0:3").unwrap();
        assert_eq!(item.product_id, ProductId::new("64b7f0"));
        assert_eq!(item.quantity, 3);

        assert_eq!(parse_guest_item("64b7f0").unwrap().quantity, 1);
        assert!(parse_guest_item("64b7f0:0").is_err());
        assert!(parse_guest_item("64b7f0:x").is_err());
        assert!(parse_guest_item(":2").is_err());
    }
}
