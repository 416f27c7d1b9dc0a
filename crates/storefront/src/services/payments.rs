//! MercadoPago checkout.

use tracing::{info, instrument};

use autoparts_core::CartId;

use crate::api::{ApiClient, segment};
use crate::error::{ApiError, Result};
use crate::types::PaymentPreference;

impl ApiClient {
    /// Create a payment preference for a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn create_payment_preference(&self, cart_id: &CartId) -> Result<PaymentPreference> {
        let preference: PaymentPreference = self
            .post_empty(&format!("/payments/checkout/{}", segment(cart_id.as_str())))
            .await?;
        info!(preference_id = ?preference.id, "Payment preference created");
        Ok(preference)
    }

    /// Create a payment preference and return the URL to send the customer to.
    ///
    /// Honors the configured sandbox preference.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the preference has no URL.
    pub async fn checkout_redirect_url(&self, cart_id: &CartId) -> Result<String> {
        let preference = self.create_payment_preference(cart_id).await?;
        preference
            .redirect_url(self.use_sandbox())
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::Decode(<serde_json::Error as serde::de::Error>::custom(
                    "payment preference has no redirect URL",
                ))
            })
    }
}
