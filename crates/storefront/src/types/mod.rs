//! Domain types mirroring the REST backend's JSON.
//!
//! The backend is loose about field names (`subtotal` vs `subTotal`, `price`
//! vs `amount`), about whether references are populated (`productId` may be an
//! ID or a whole product), and about number encoding (numbers or numeric
//! strings). Decoding absorbs all of that here so the rest of the crate works
//! with one shape per entity.

pub mod cart;
pub mod catalog;
pub mod favorite;
pub mod order;
pub mod payment;
pub mod user;

pub use cart::{
    Cart, CartItem, CartSummary, CheckoutValidation, GuestCartItem, ProductSnapshot,
    SummaryFields, normalize_summary,
};
pub use catalog::{Facets, Product, ProductFilter, ProductPage, ProductSort};
pub use favorite::FavoriteItem;
pub use order::{Order, OrderItem};
pub use payment::PaymentPreference;
pub use user::User;

/// Lenient deserializers shared by the DTOs.
pub(crate) mod de {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Decimal from a number, numeric string or null (as zero).
    pub fn decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Decimal>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Reference that is either a bare ID or a populated object with an `id`.
    pub fn ref_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: serde::de::DeserializeOwned,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(ref_id_from_value))
    }

    /// Same as [`ref_id`], for values already parsed.
    pub fn ref_id_from_value<T: serde::de::DeserializeOwned>(value: &Value) -> Option<T> {
        match value {
            Value::String(_) | Value::Number(_) => T::deserialize(value).ok(),
            Value::Object(map) => map
                .get("id")
                .or_else(|| map.get("_id"))
                .and_then(|id| T::deserialize(id).ok()),
            _ => None,
        }
    }

    /// Text that may be sent as a plain string or as an object with a `name`.
    pub fn name_or_object<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(name_from_value))
    }

    /// Same as [`name_or_object`], for values already parsed.
    pub fn name_from_value(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }

    /// Non-negative count from a number or numeric string.
    pub fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(count_from_value))
    }

    /// Same as [`count`], for values already parsed. Negative counts clamp to 0.
    pub fn count_from_value(value: &Value) -> Option<u32> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(truncate_float))
                .map(|n| u32::try_from(n.max(0)).unwrap_or(u32::MAX)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .map(|n| u32::try_from(n.max(0)).unwrap_or(u32::MAX)),
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation)] // saturating cast is the intent
    fn truncate_float(f: f64) -> i64 {
        f.trunc() as i64
    }

    /// Decimal from an already-parsed value, if it holds a number or numeric string.
    pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
        <Decimal as Deserialize>::deserialize(value).ok()
    }
}

/// Rewrite Mongo-style `_id` keys to `id`, recursively.
///
/// Objects carrying both keep `id` and drop `_id`.
pub fn normalize_ids(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(mongo_id) = map.remove("_id")
                && !map.contains_key("id")
            {
                map.insert("id".to_string(), mongo_id);
            }
            for child in map.values_mut() {
                normalize_ids(child);
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(normalize_ids),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn test_normalize_ids_renames_nested() {
        let mut value = json!({
            "_id": "c1",
            "items": [{ "_id": "i1", "product": { "_id": "p1", "id": "p1-virtual" } }]
        });
        normalize_ids(&mut value);
        assert_eq!(value["id"], "c1");
        assert_eq!(value["items"][0]["id"], "i1");
        assert_eq!(value["items"][0]["product"]["id"], "p1-virtual");
        assert!(value["items"][0]["product"].get("_id").is_none());
    }

    #[test]
    fn test_count_from_value() {
        assert_eq!(de::count_from_value(&json!(3)), Some(3));
        assert_eq!(de::count_from_value(&json!("7")), Some(7));
        assert_eq!(de::count_from_value(&json!(-2)), Some(0));
        assert_eq!(de::count_from_value(&json!(2.9)), Some(2));
        assert_eq!(de::count_from_value(&json!(null)), None);
    }

    #[test]
    fn test_decimal_from_value() {
        assert_eq!(de::decimal_from_value(&json!("12.50")), Some(Decimal::new(1250, 2)));
        assert_eq!(de::decimal_from_value(&json!(8500)), Some(Decimal::new(8500, 0)));
        assert_eq!(de::decimal_from_value(&json!("abc")), None);
        assert_eq!(de::decimal_from_value(&json!(null)), None);
    }

    #[test]
    fn test_name_from_value() {
        assert_eq!(de::name_from_value(&json!(" Frenos ")).as_deref(), Some("Frenos"));
        assert_eq!(
            de::name_from_value(&json!({ "id": 1, "name": "Bosch" })).as_deref(),
            Some("Bosch")
        );
        assert_eq!(de::name_from_value(&json!("")), None);
    }
}
