//! Status and role enums.
//!
//! The backend is inconsistent about casing and has used both English and
//! Spanish spellings over time, so parsing is case-insensitive and accepts
//! either. Values always serialize as lowercase English.

use serde::{Deserialize, Serialize};

/// Error returned when a status or role string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "&'static str")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Paid,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Label shown to customers and staff.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::Paid => "Pagado",
            Self::Processing => "En preparación",
            Self::Shipped => "Enviado",
            Self::Delivered => "Entregado",
            Self::Cancelled => "Cancelado",
        }
    }

    /// Whether the order can no longer change status.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the order counts towards revenue.
    #[must_use]
    pub const fn is_revenue(&self) -> bool {
        matches!(
            self,
            Self::Paid | Self::Processing | Self::Shipped | Self::Delivered
        )
    }

    /// Whether an order in this status may be moved to `next`.
    ///
    /// Final statuses accept no transitions; setting the current status again
    /// is a no-op and always allowed otherwise.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        !self.is_final() || *self == next
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "pending" | "pendiente" => Ok(Self::Pending),
            "paid" | "approved" | "pagado" | "pagada" => Ok(Self::Paid),
            "processing" | "procesando" | "en_proceso" | "en_preparacion" => {
                Ok(Self::Processing)
            }
            "shipped" | "enviado" | "enviada" => Ok(Self::Shipped),
            "delivered" | "entregado" | "entregada" => Ok(Self::Delivered),
            "cancelled" | "canceled" | "cancelado" | "cancelada" => Ok(Self::Cancelled),
            _ => Err(ParseStatusError {
                kind: "order status",
                value: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderStatus> for &'static str {
    fn from(status: OrderStatus) -> Self {
        status.as_str()
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "&'static str")]
pub enum UserRole {
    /// Regular customer.
    #[default]
    User,
    /// Store staff with access to the administration operations.
    Admin,
}

impl UserRole {
    /// Wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Whether this role can use the administration operations.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" | "customer" | "cliente" | "usuario" => Ok(Self::User),
            "admin" | "administrator" | "administrador" => Ok(Self::Admin),
            _ => Err(ParseStatusError {
                kind: "user role",
                value: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for UserRole {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UserRole> for &'static str {
    fn from(role: UserRole) -> Self {
        role.as_str()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parse_case_insensitive() {
        assert_eq!("PENDING".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!("Enviado".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!("canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert_eq!("en proceso".parse::<OrderStatus>().unwrap(), OrderStatus::Processing);
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_serde() {
        let status: OrderStatus = serde_json::from_str("\"DELIVERED\"").unwrap();
        assert_eq!(status, OrderStatus::Delivered);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"delivered\"");
    }

    #[test]
    fn test_order_status_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
        assert!(OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_revenue_statuses() {
        let revenue: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::is_revenue)
            .collect();
        assert_eq!(revenue.len(), 4);
        assert!(!OrderStatus::Pending.is_revenue());
    }

    #[test]
    fn test_user_role() {
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("customer".parse::<UserRole>().unwrap(), UserRole::User);
        assert!(UserRole::Admin.is_admin());
        assert_eq!(serde_json::to_string(&UserRole::User).unwrap(), "\"user\"");
    }
}
