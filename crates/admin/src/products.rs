//! Catalog management.
//!
//! Every successful mutation drops the storefront product cache so the next
//! lookup sees the change.

use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::IgnoredAny;
use tracing::{info, instrument};

use autoparts_core::ProductId;
use autoparts_storefront::api::segment;
use autoparts_storefront::types::Product;
use autoparts_storefront::{ApiError, Result};

use super::AdminClient;

/// A new catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub compatible_vehicles: Vec<String>,
}

impl ProductInput {
    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for a blank name or non-positive price.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_price(self.price)
    }
}

/// Changes to an existing catalog entry; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ProductPatch {
    /// Check the fields being changed.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for an empty patch, a blank name or a
    /// non-positive price.
    pub fn validate(&self) -> Result<()> {
        if *self == Self::default() {
            return Err(ApiError::Validation(
                "No hay cambios para guardar".to_string(),
            ));
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation(
            "El nombre del producto es obligatorio".to_string(),
        ));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<()> {
    if price <= Decimal::ZERO {
        return Err(ApiError::Validation(
            "El precio debe ser mayor a cero".to_string(),
        ));
    }
    Ok(())
}

fn product_path(id: &ProductId) -> String {
    format!("/products/{}", segment(id.as_str()))
}

impl AdminClient {
    /// Add a product to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` without an admin session,
    /// `ApiError::Validation` for invalid input, or the request error.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product> {
        self.require_admin()?;
        input.validate()?;

        let product: Product = self.api.post("/products", input).await?;
        self.api.invalidate_product_cache();
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Change a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` without an admin session,
    /// `ApiError::Validation` for invalid input, or the request error.
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update_product(&self, id: &ProductId, patch: &ProductPatch) -> Result<Product> {
        self.require_admin()?;
        patch.validate()?;

        let product: Product = self.api.patch(&product_path(id), patch).await?;
        self.api.invalidate_product_cache();
        info!("Product updated");
        Ok(product)
    }

    /// Remove a product from the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` without an admin session, or the request error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<()> {
        self.require_admin()?;

        let _: IgnoredAny = self.api.delete(&product_path(id)).await?;
        self.api.invalidate_product_cache();
        info!("Product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_input_validation() {
        let mut input = ProductInput {
            name: "Kit de embrague".to_string(),
            price: Decimal::new(120_000, 0),
            stock: 3,
            ..ProductInput::default()
        };
        assert!(input.validate().is_ok());

        input.price = Decimal::ZERO;
        assert!(matches!(input.validate(), Err(ApiError::Validation(_))));

        input.price = Decimal::ONE;
        input.name = "   ".to_string();
        assert!(matches!(input.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_product_patch_validation() {
        assert!(ProductPatch::default().validate().is_err());
        assert!(
            ProductPatch {
                stock: Some(0),
                ..ProductPatch::default()
            }
            .validate()
            .is_ok()
        );
        assert!(
            ProductPatch {
                price: Some(Decimal::new(-1, 0)),
                ..ProductPatch::default()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_product_input_serializes_camel_case() {
        let input = ProductInput {
            name: "Faro".to_string(),
            price: Decimal::new(5000, 0),
            image_url: Some("https://cdn/faro.jpg".to_string()),
            ..ProductInput::default()
        };
        let value = serde_json::to_value(&input).unwrap_or_default();
        assert_eq!(value["imageUrl"], "https://cdn/faro.jpg");
        assert!(value.get("description").is_none());
        assert!(value.get("compatibleVehicles").is_none());
    }
}
