//! Favorites (saved products).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use autoparts_core::{FavoriteId, ProductId};

use super::catalog::Product;
use super::de;

/// A product the customer saved.
///
/// `GET /favorites` returns either favorite records
/// (`{id, productId | product, createdAt}`) or the products themselves.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct FavoriteItem {
    pub id: Option<FavoriteId>,
    pub product_id: ProductId,
    pub product: Option<Product>,
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<Value> for FavoriteItem {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = &value else {
            return Err("favorite must be a JSON object".to_string());
        };

        let reference = map
            .get("product")
            .or_else(|| map.get("productId"))
            .filter(|v| !v.is_null());

        let Some(reference) = reference else {
            // A bare product
            let product = Product::try_from(value)?;
            return Ok(Self {
                id: None,
                product_id: product.id.clone(),
                created_at: product.created_at,
                product: Some(product),
            });
        };

        let product = match reference {
            Value::Object(_) => Some(Product::try_from(reference.clone())?),
            _ => None,
        };
        let product_id = de::ref_id_from_value::<ProductId>(reference)
            .ok_or_else(|| "favorite is missing a product".to_string())?;

        Ok(Self {
            id: map.get("id").and_then(de::ref_id_from_value),
            product_id,
            product,
            created_at: map
                .get("createdAt")
                .and_then(|v| DateTime::<Utc>::deserialize(v).ok()),
        })
    }
}

impl FavoriteItem {
    /// Product name for display, falling back to the product ID.
    #[must_use]
    pub fn name(&self) -> &str {
        self.product
            .as_ref()
            .map_or(self.product_id.as_str(), |p| p.name.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_favorite_record_with_populated_product() {
        let fav: FavoriteItem = serde_json::from_value(json!({
            "id": "f1",
            "product": { "id": "p1", "name": "Radiador", "price": 90000 },
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(fav.id, Some(FavoriteId::new("f1")));
        assert_eq!(fav.product_id, ProductId::new("p1"));
        assert_eq!(fav.name(), "Radiador");
        assert!(fav.created_at.is_some());
    }

    #[test]
    fn test_favorite_record_with_bare_id() {
        let fav: FavoriteItem =
            serde_json::from_value(json!({ "id": 3, "productId": 42 })).unwrap();
        assert_eq!(fav.product_id, ProductId::new("42"));
        assert!(fav.product.is_none());
        assert_eq!(fav.name(), "42");
    }

    #[test]
    fn test_raw_product_as_favorite() {
        let fav: FavoriteItem =
            serde_json::from_value(json!({ "id": "p9", "name": "Correa", "price": 100 })).unwrap();
        assert!(fav.id.is_none());
        assert_eq!(fav.product_id, ProductId::new("p9"));
    }
}
