//! Cart endpoints.
//!
//! Mutations return nothing: callers re-fetch the cart afterwards
//! (see `state::CartContext`).

use serde::Serialize;
use serde::de::IgnoredAny;
use tracing::instrument;

use autoparts_core::{CartItemId, ProductId};

use crate::api::{ApiClient, segment};
use crate::error::Result;
use crate::types::{Cart, CheckoutValidation, GuestCartItem};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemRequest<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(Serialize)]
struct QuantityRequest {
    quantity: u32,
}

#[derive(Serialize)]
struct MergeRequest<'a> {
    items: &'a [GuestCartItem],
}

fn item_path(item_id: &CartItemId) -> String {
    format!("/cart/items/{}", segment(item_id.as_str()))
}

impl ApiClient {
    /// Fetch the signed-in customer's cart. `None` when no cart exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (other than 404).
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Option<Cart>> {
        match self.get::<Option<Cart>>("/cart").await {
            Ok(cart) => Ok(cart),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Add a product to the cart (`POST /cart`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_cart_item(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        let _: IgnoredAny = self
            .post(
                "/cart",
                &AddItemRequest {
                    product_id,
                    quantity,
                },
            )
            .await?;
        Ok(())
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_cart_item(&self, item_id: &CartItemId, quantity: u32) -> Result<()> {
        let _: IgnoredAny = self
            .patch(&item_path(item_id), &QuantityRequest { quantity })
            .await?;
        Ok(())
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_cart_item(&self, item_id: &CartItemId) -> Result<()> {
        let _: IgnoredAny = self.delete(&item_path(item_id)).await?;
        Ok(())
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        let _: IgnoredAny = self.delete("/cart").await?;
        Ok(())
    }

    /// Merge lines collected as a guest into the customer's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn merge_carts(&self, items: &[GuestCartItem]) -> Result<()> {
        let _: IgnoredAny = self.post("/cart/merge", &MergeRequest { items }).await?;
        Ok(())
    }

    /// Ask the backend whether the cart can be checked out (stock, prices).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn validate_cart_for_checkout(&self) -> Result<CheckoutValidation> {
        let validation: Option<CheckoutValidation> = self.post_empty("/cart/checkout").await?;
        Ok(validation.unwrap_or(CheckoutValidation {
            valid: true,
            ..CheckoutValidation::default()
        }))
    }
}
