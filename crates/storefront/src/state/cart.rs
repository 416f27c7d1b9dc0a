//! Client-side mirror of the server cart.
//!
//! Every mutation follows the same sequence: check the session, call the
//! endpoint, re-fetch `GET /cart`, replace local state. There is no optimistic
//! update. Concurrent mutations are not serialized; whichever re-fetch lands
//! last wins. The state lock is only taken between network calls.

use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use autoparts_core::{CartItemId, ProductId};

use crate::api::ApiClient;
use crate::error::{ApiError, Result};
use crate::types::{Cart, CheckoutValidation, GuestCartItem};

use super::notify::Notifier;

pub const MSG_ADDED: &str = "Producto agregado al carrito";
pub const MSG_UPDATED: &str = "Cantidad actualizada";
pub const MSG_REMOVED: &str = "Producto eliminado del carrito";
pub const MSG_CLEARED: &str = "Carrito vaciado";
pub const MSG_MERGED: &str = "Carritos combinados";
pub const MSG_INVALID_QUANTITY: &str = "La cantidad debe ser mayor a cero";
pub const MSG_INSUFFICIENT_STOCK: &str = "Stock insuficiente";
pub const MSG_EMPTY_CART: &str = "Tu carrito está vacío";

/// Snapshot of the cart context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// Last cart fetched from the server; `None` before the first fetch,
    /// when signed out, or when the customer has no cart.
    pub cart: Option<Cart>,
    pub loading: bool,
    /// Message of the last failed operation, cleared by the next success.
    pub error: Option<String>,
}

/// Cart state shared by a storefront session.
pub struct CartContext {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    state: RwLock<CartState>,
}

impl CartContext {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            state: RwLock::new(CartState::default()),
        }
    }

    // =========================================================================
    // Derived values
    // =========================================================================

    pub async fn snapshot(&self) -> CartState {
        self.state.read().await.clone()
    }

    pub async fn cart(&self) -> Option<Cart> {
        self.state.read().await.cart.clone()
    }

    /// Sum of item quantities of the last fetched cart.
    pub async fn item_count(&self) -> u32 {
        self.state.read().await.cart.as_ref().map_or(0, Cart::item_count)
    }

    /// Normalized total of the last fetched cart.
    pub async fn total(&self) -> Decimal {
        self.state
            .read()
            .await
            .cart
            .as_ref()
            .map_or(Decimal::ZERO, Cart::total)
    }

    pub async fn is_empty(&self) -> bool {
        self.item_count().await == 0
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Re-fetch the cart. Signed out, this empties the state without a request.
    ///
    /// # Errors
    ///
    /// Returns the request error after routing it (see module docs).
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        match self.api.current_session() {
            Ok(Some(_)) => {}
            Ok(None) => {
                *self.state.write().await = CartState::default();
                return Ok(());
            }
            Err(e) => return Err(self.handle_error(e).await),
        }

        self.state.write().await.loading = true;
        match self.api.get_cart().await {
            Ok(cart) => {
                self.replace(cart).await;
                Ok(())
            }
            Err(e) => Err(self.handle_error(e).await),
        }
    }

    /// Add units of a product.
    ///
    /// # Errors
    ///
    /// Rejects a zero quantity or one exceeding the known stock locally;
    /// otherwise returns the request error after routing it.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(self.reject(ApiError::Validation(MSG_INVALID_QUANTITY.to_string())).await);
        }

        let exceeds_stock = self.state.read().await.cart.as_ref().is_some_and(|cart| {
            cart.item_for_product(product_id).is_some_and(|line| {
                line.stock()
                    .is_some_and(|stock| line.quantity.saturating_add(quantity) > stock)
            })
        });
        if exceeds_stock {
            return Err(self.reject(ApiError::Validation(MSG_INSUFFICIENT_STOCK.to_string())).await);
        }

        self.mutate("agregar productos al carrito", MSG_ADDED, || {
            self.api.add_cart_item(product_id, quantity)
        })
        .await
    }

    /// Set the quantity of a line. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Rejects a quantity exceeding the known stock locally; otherwise returns
    /// the request error after routing it.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_quantity(&self, item_id: &CartItemId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return self.remove_item(item_id).await;
        }

        let exceeds_stock = self.state.read().await.cart.as_ref().is_some_and(|cart| {
            cart.item(item_id)
                .and_then(|line| line.stock())
                .is_some_and(|stock| quantity > stock)
        });
        if exceeds_stock {
            return Err(self.reject(ApiError::Validation(MSG_INSUFFICIENT_STOCK.to_string())).await);
        }

        self.mutate("modificar el carrito", MSG_UPDATED, || {
            self.api.update_cart_item(item_id, quantity)
        })
        .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns the request error after routing it.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_item(&self, item_id: &CartItemId) -> Result<()> {
        self.mutate("modificar el carrito", MSG_REMOVED, || {
            self.api.remove_cart_item(item_id)
        })
        .await
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns the request error after routing it.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        self.mutate("vaciar el carrito", MSG_CLEARED, || self.api.clear_cart())
            .await
    }

    /// Merge lines collected as a guest. Nothing to merge is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the request error after routing it.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn merge_carts(&self, items: &[GuestCartItem]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.mutate("combinar carritos", MSG_MERGED, || self.api.merge_carts(items))
            .await
    }

    /// Ask the server whether the cart can be checked out.
    ///
    /// An invalid result is reported through the error toast; a re-validated
    /// cart returned by the server replaces local state.
    ///
    /// # Errors
    ///
    /// Rejects an empty cart locally; otherwise returns the request error
    /// after routing it.
    #[instrument(skip(self))]
    pub async fn validate_for_checkout(&self) -> Result<CheckoutValidation> {
        self.gate("finalizar la compra").await?;
        if self.is_empty().await {
            return Err(self.reject(ApiError::Validation(MSG_EMPTY_CART.to_string())).await);
        }

        self.state.write().await.loading = true;
        let validation = match self.api.validate_cart_for_checkout().await {
            Ok(validation) => validation,
            Err(e) => return Err(self.handle_error(e).await),
        };

        {
            let mut state = self.state.write().await;
            state.loading = false;
            if let Some(cart) = &validation.cart {
                state.cart = Some(cart.clone());
            }
            state.error = (!validation.valid).then(|| validation.errors.join("; "));
        }
        if !validation.valid {
            let message = validation.errors.join("; ");
            warn!(errors = %message, "Cart failed checkout validation");
            self.notifier.error(&message);
        }

        Ok(validation)
    }

    /// Validate the cart and create a payment preference for it.
    ///
    /// Returns the URL to redirect the customer to.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` when the cart fails validation, or the
    /// request error after routing it.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<String> {
        let validation = self.validate_for_checkout().await?;
        if !validation.valid {
            return Err(ApiError::Validation(validation.errors.join("; ")));
        }

        let cart_id = self.state.read().await.cart.as_ref().and_then(|c| c.id.clone());
        let Some(cart_id) = cart_id else {
            return Err(self.reject(ApiError::Validation(MSG_EMPTY_CART.to_string())).await);
        };

        match self.api.checkout_redirect_url(&cart_id).await {
            Ok(url) => Ok(url),
            Err(e) => Err(self.handle_error(e).await),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Run a mutation: session check, request, re-fetch, replace, toast.
    async fn mutate<F, Fut>(&self, action: &str, success: &str, op: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        self.gate(action).await?;
        self.state.write().await.loading = true;

        let result = async {
            op().await?;
            self.api.get_cart().await
        }
        .await;

        match result {
            Ok(cart) => {
                self.replace(cart).await;
                self.notifier.success(success);
                Ok(())
            }
            Err(e) => Err(self.handle_error(e).await),
        }
    }

    /// Fail with a toast unless a valid session is stored.
    async fn gate(&self, action: &str) -> Result<()> {
        match self.api.require_session(action) {
            Ok(_) => Ok(()),
            Err(e @ ApiError::NotAuthenticated(_)) => Err(self.reject(e).await),
            Err(e) => Err(self.handle_error(e).await),
        }
    }

    async fn replace(&self, cart: Option<Cart>) {
        let mut state = self.state.write().await;
        state.cart = cart;
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

    /// Route a failed request: auth-class errors silently drop the cart,
    /// anything else is recorded and toasted with the cart left as it was.
    async fn handle_error(&self, error: ApiError) -> ApiError {
        if error.is_auth_error() {
            debug!(error = %error, "Auth error, clearing cart state");
            *self.state.write().await = CartState::default();
            return error;
        }

        warn!(error = %error, "Cart operation failed");
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
