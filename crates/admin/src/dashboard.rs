//! Dashboard statistics.

use rust_decimal::Decimal;
use tracing::{error, instrument};

use autoparts_core::OrderStatus;
use autoparts_storefront::Result;
use autoparts_storefront::types::{Order, Product, ProductFilter, User};

use super::AdminClient;

/// Products at or below this stock are flagged.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// Figures shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub order_count: usize,
    /// Order count per status, in lifecycle order.
    pub orders_by_status: Vec<(OrderStatus, usize)>,
    /// Sum of totals of paid, processing, shipped and delivered orders.
    pub revenue: Decimal,
    /// Revenue divided by the number of orders contributing to it.
    pub average_order_value: Decimal,
    pub user_count: usize,
    pub banned_users: usize,
    /// Products with tracked stock at or below the threshold, lowest first.
    pub low_stock: Vec<Product>,
}

impl DashboardStats {
    /// Compute statistics with the default low-stock threshold.
    #[must_use]
    pub fn compute(orders: &[Order], users: &[User], products: &[Product]) -> Self {
        Self::compute_with_threshold(orders, users, products, LOW_STOCK_THRESHOLD)
    }

    #[must_use]
    pub fn compute_with_threshold(
        orders: &[Order],
        users: &[User],
        products: &[Product],
        low_stock_threshold: u32,
    ) -> Self {
        let orders_by_status = OrderStatus::ALL
            .iter()
            .map(|status| (*status, orders.iter().filter(|o| o.status == *status).count()))
            .collect();

        let revenue_orders: Vec<&Order> = orders.iter().filter(|o| o.status.is_revenue()).collect();
        let revenue = revenue_orders
            .iter()
            .fold(Decimal::ZERO, |acc, o| acc.saturating_add(o.total));
        let average_order_value = if revenue_orders.is_empty() {
            Decimal::ZERO
        } else {
            (revenue / Decimal::from(revenue_orders.len())).round_dp(2)
        };

        let mut low_stock: Vec<Product> = products
            .iter()
            .filter(|p| p.stock.is_some_and(|s| s <= low_stock_threshold))
            .cloned()
            .collect();
        low_stock.sort_by_key(|p| p.stock);

        Self {
            order_count: orders.len(),
            orders_by_status,
            revenue,
            average_order_value,
            user_count: users.len(),
            banned_users: users.iter().filter(|u| u.is_banned).count(),
            low_stock,
        }
    }

    /// Count for one status.
    #[must_use]
    pub fn count_for(&self, status: OrderStatus) -> usize {
        self.orders_by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, count)| *count)
    }
}

impl AdminClient {
    /// Fetch orders, users and products concurrently and compute statistics.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` without an admin session, or the first
    /// failed request's error.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardStats> {
        self.require_admin()?;

        let filter = ProductFilter::default();
        let (orders_result, users_result, products_result) = tokio::join!(
            self.list_orders(),
            self.list_users(),
            self.api.list_products(&filter)
        );

        let orders = orders_result.inspect_err(|e| error!("Failed to fetch orders: {e}"))?;
        let users = users_result.inspect_err(|e| error!("Failed to fetch users: {e}"))?;
        let products = products_result.inspect_err(|e| error!("Failed to fetch products: {e}"))?;

        Ok(DashboardStats::compute(&orders, &users, &products.products))
    }
}
