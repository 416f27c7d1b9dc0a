//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use autoparts_core::{OrderId, OrderStatus, ProductId, UserId};

use super::de;

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Customer; the backend sends either the ID or the populated user.
    #[serde(default, deserialize_with = "de::ref_id", alias = "user")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, alias = "totalAmount", deserialize_with = "de::decimal_or_zero")]
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    /// MercadoPago payment ID, once paid.
    #[serde(default, deserialize_with = "payment_ref")]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Sum of item quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.quantity))
    }
}

/// One line of an order, priced at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, alias = "product", deserialize_with = "de::ref_id")]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default, alias = "unitPrice", deserialize_with = "de::decimal_or_zero")]
    pub price: Decimal,
}

impl OrderItem {
    /// Line total, saturating at the `Decimal` range.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

const fn one() -> u32 {
    1
}

/// Payment ID as a string; MercadoPago IDs are numeric.
fn payment_ref<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_order() {
        let order: Order = serde_json::from_value(json!({
            "id": 31,
            "user": { "id": "u1", "name": "Ana" },
            "items": [
                { "product": { "id": "p1" }, "name": "Amortiguador", "quantity": 2, "unitPrice": "15000" },
                { "productId": "p2", "price": 500 }
            ],
            "totalAmount": 30500,
            "status": "ENVIADO",
            "paymentId": 1_234_567_890_u64,
            "createdAt": "2024-05-02T12:00:00Z"
        }))
        .unwrap();

        assert_eq!(order.id, OrderId::new("31"));
        assert_eq!(order.user_id, Some(UserId::new("u1")));
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.total, Decimal::new(30_500, 0));
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.items[0].subtotal(), Decimal::new(30_000, 0));
        assert_eq!(order.items[1].quantity, 1);
        assert_eq!(order.payment_id.as_deref(), Some("1234567890"));
    }

    #[test]
    fn test_decode_minimal_order() {
        let order: Order = serde_json::from_value(json!({ "id": "o1" })).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, Decimal::ZERO);
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_order_totals_saturate() {
        let order: Order = serde_json::from_value(json!({
            "id": "o1",
            "items": [
                { "productId": "p1", "quantity": 4_294_967_295_u64, "price": 1 },
                { "productId": "p2", "quantity": 2, "price": "79228162514264337593543950335" }
            ]
        }))
        .unwrap();
        assert_eq!(order.item_count(), u32::MAX);
        assert_eq!(order.items.last().unwrap().subtotal(), Decimal::MAX);
    }
}
