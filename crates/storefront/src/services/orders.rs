//! Order history.

use tracing::instrument;

use autoparts_core::OrderId;

use crate::api::{ApiClient, segment, unwrap_list};
use crate::error::Result;
use crate::types::Order;

impl ApiClient {
    /// List orders: the customer's own, or every order for an admin.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        let value = self.get_raw("/orders", &[]).await?;
        unwrap_list(value, "orders")
    }

    /// Get a single order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist, or an error
    /// if the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order> {
        self.get(&format!("/orders/{}", segment(id.as_str()))).await
    }
}
