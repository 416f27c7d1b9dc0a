//! Order management.

use serde::Serialize;
use serde::de::IgnoredAny;
use tracing::{info, instrument};

use autoparts_core::{OrderId, OrderStatus};
use autoparts_storefront::api::segment;
use autoparts_storefront::types::Order;
use autoparts_storefront::{ApiError, Result};

use super::AdminClient;

#[derive(Serialize)]
struct StatusRequest {
    status: OrderStatus,
}

impl AdminClient {
    /// List every order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` without an admin session, or the request error.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        self.require_admin()?;
        self.api.list_orders().await
    }

    /// Get any order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` without an admin session, or the request error.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order> {
        self.require_admin()?;
        self.api.get_order(id).await
    }

    /// Move an order to a new status and return the updated order.
    ///
    /// Delivered and cancelled orders are final; changing them is rejected
    /// locally. Setting the current status again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` without an admin session,
    /// `ApiError::Validation` for a disallowed transition, or the request error.
    #[instrument(skip(self), fields(order_id = %id, status = %next))]
    pub async fn update_order_status(&self, id: &OrderId, next: OrderStatus) -> Result<Order> {
        self.require_admin()?;

        let order = self.api.get_order(id).await?;
        if order.status == next {
            return Ok(order);
        }
        if !order.status.can_transition_to(next) {
            return Err(ApiError::Validation(format!(
                "No se puede cambiar el estado de un pedido {} a {}",
                order.status.label().to_lowercase(),
                next.label().to_lowercase()
            )));
        }

        let path = format!("/orders/{}/status", segment(id.as_str()));
        let _: IgnoredAny = self.api.patch(&path, &StatusRequest { status: next }).await?;
        info!(from = %order.status, to = %next, "Order status updated");

        self.api.get_order(id).await
    }
}
