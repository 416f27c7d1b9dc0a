//! Cart types and summary normalization.
//!
//! [`Cart`] is the only decoder for cart payloads. The summary may arrive
//! nested under `summary`, flattened onto the cart, or not at all, and each
//! amount has several spellings; all of it is folded into one [`CartSummary`]
//! by [`normalize_summary`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use autoparts_core::{CartId, CartItemId, ProductId, UserId};

use super::de;

// =============================================================================
// Summary
// =============================================================================

/// Summary amounts exactly as the backend may send them.
///
/// Each spelling is its own field; accessors pick the first present one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SummaryFields {
    #[serde(default)]
    pub subtotal: Option<Decimal>,
    #[serde(default, rename = "subTotal")]
    pub sub_total: Option<Decimal>,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default, rename = "discountAmount")]
    pub discount_amount: Option<Decimal>,
    #[serde(default)]
    pub tax: Option<Decimal>,
    #[serde(default)]
    pub taxes: Option<Decimal>,
    #[serde(default, rename = "taxAmount")]
    pub tax_amount: Option<Decimal>,
    #[serde(default)]
    pub total: Option<Decimal>,
    #[serde(default, rename = "totalAmount")]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default, rename = "itemCount", deserialize_with = "de::count")]
    pub item_count: Option<u32>,
    #[serde(default, rename = "totalItems", deserialize_with = "de::count")]
    pub total_items: Option<u32>,
}

impl SummaryFields {
    fn subtotal(&self) -> Option<Decimal> {
        self.subtotal.or(self.sub_total)
    }

    fn discount(&self) -> Option<Decimal> {
        self.discount.or(self.discount_amount)
    }

    fn tax(&self) -> Option<Decimal> {
        self.tax.or(self.taxes).or(self.tax_amount)
    }

    fn total(&self) -> Option<Decimal> {
        self.total.or(self.total_amount).or(self.amount)
    }

    fn item_count(&self) -> Option<u32> {
        self.item_count.or(self.total_items)
    }

    /// Fill every field missing here from `other`.
    #[must_use]
    fn or(self, other: Self) -> Self {
        Self {
            subtotal: self.subtotal.or(other.subtotal),
            sub_total: self.sub_total.or(other.sub_total),
            discount: self.discount.or(other.discount),
            discount_amount: self.discount_amount.or(other.discount_amount),
            tax: self.tax.or(other.tax),
            taxes: self.taxes.or(other.taxes),
            tax_amount: self.tax_amount.or(other.tax_amount),
            total: self.total.or(other.total),
            total_amount: self.total_amount.or(other.total_amount),
            amount: self.amount.or(other.amount),
            item_count: self.item_count.or(other.item_count),
            total_items: self.total_items.or(other.total_items),
        }
    }
}

/// Canonical cart totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub item_count: u32,
}

impl From<CartSummary> for SummaryFields {
    fn from(summary: CartSummary) -> Self {
        Self {
            subtotal: Some(summary.subtotal),
            discount: Some(summary.discount),
            tax: Some(summary.tax),
            total: Some(summary.total),
            item_count: Some(summary.item_count),
            ..Self::default()
        }
    }
}

/// Collapse raw summary fields into a [`CartSummary`].
///
/// Missing amounts are zero, except `total`, which is `subtotal - discount + tax`
/// when the server omits it, saturating at the `Decimal` range. Applying this
/// to its own output yields the same summary.
#[must_use]
pub fn normalize_summary(fields: &SummaryFields) -> CartSummary {
    let subtotal = fields.subtotal().unwrap_or_default();
    let discount = fields.discount().unwrap_or_default();
    let tax = fields.tax().unwrap_or_default();
    let total = fields
        .total()
        .unwrap_or_else(|| subtotal.saturating_sub(discount).saturating_add(tax));

    CartSummary {
        subtotal,
        discount,
        tax,
        total,
        item_count: fields.item_count().unwrap_or_default(),
    }
}

// =============================================================================
// Items
// =============================================================================

/// The part of a populated product a cart line carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: Option<ProductId>,
    pub name: String,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
    pub image_url: Option<String>,
}

impl ProductSnapshot {
    fn from_map(map: &serde_json::Map<String, Value>) -> Self {
        let field = |names: &[&str]| names.iter().find_map(|n| map.get(*n).filter(|v| !v.is_null()));
        Self {
            id: field(&["id", "_id"]).and_then(de::ref_id_from_value),
            name: field(&["name", "title"])
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default(),
            price: field(&["price", "unitPrice"]).and_then(de::decimal_from_value),
            stock: field(&["stock"]).and_then(de::count_from_value),
            image_url: field(&["imageUrl", "image"])
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product: Option<ProductSnapshot>,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Line total.
    pub subtotal: Decimal,
}

impl CartItem {
    /// Product name for display, falling back to the product ID.
    #[must_use]
    pub fn name(&self) -> &str {
        self.product
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.product_id.as_str())
    }

    /// Stock of the product, when the snapshot carries it.
    #[must_use]
    pub fn stock(&self) -> Option<u32> {
        self.product.as_ref().and_then(|p| p.stock)
    }
}

impl TryFrom<Value> for CartItem {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = value else {
            return Err("cart item must be a JSON object".to_string());
        };
        let field = |names: &[&str]| names.iter().find_map(|n| map.get(*n).filter(|v| !v.is_null()));

        // `productId` and `product` are each either an ID or a populated object
        let refs = [field(&["productId"]), field(&["product"])];
        let product = refs.iter().flatten().find_map(|v| match v {
            Value::Object(m) => Some(ProductSnapshot::from_map(m)),
            _ => None,
        });
        let product_id = refs
            .iter()
            .flatten()
            .find_map(|v| de::ref_id_from_value::<ProductId>(v))
            .or_else(|| product.as_ref().and_then(|p| p.id.clone()))
            .ok_or_else(|| "cart item is missing a product".to_string())?;

        let id = field(&["id", "_id", "itemId"])
            .and_then(de::ref_id_from_value::<CartItemId>)
            .unwrap_or_else(|| CartItemId::new(product_id.as_str()));

        let quantity = field(&["quantity", "qty"])
            .and_then(de::count_from_value)
            .unwrap_or(1);

        let unit_price = field(&["price", "unitPrice"])
            .and_then(de::decimal_from_value)
            .or_else(|| product.as_ref().and_then(|p| p.price))
            .unwrap_or_default();

        let subtotal = match field(&["subtotal", "subTotal", "total", "amount"])
            .and_then(de::decimal_from_value)
        {
            Some(subtotal) => subtotal,
            None => unit_price
                .checked_mul(Decimal::from(quantity))
                .ok_or_else(|| "cart item subtotal is out of range".to_string())?,
        };

        Ok(Self {
            id,
            product_id,
            product,
            quantity,
            unit_price,
            subtotal,
        })
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Deserialize)]
struct RawCart {
    #[serde(default)]
    id: Option<CartId>,
    #[serde(default, rename = "userId", deserialize_with = "de::ref_id")]
    user_id: Option<UserId>,
    #[serde(default, deserialize_with = "de::ref_id")]
    user: Option<UserId>,
    #[serde(default)]
    items: Option<Vec<CartItem>>,
    #[serde(default)]
    summary: Option<SummaryFields>,
    #[serde(flatten)]
    flat: SummaryFields,
}

/// The customer's server-side cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCart")]
pub struct Cart {
    pub id: Option<CartId>,
    pub user_id: Option<UserId>,
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
}

impl TryFrom<RawCart> for Cart {
    type Error = String;

    fn try_from(raw: RawCart) -> Result<Self, Self::Error> {
        let items = raw.items.unwrap_or_default();

        let mut fields = match raw.summary {
            Some(nested) => nested.or(raw.flat),
            None => raw.flat,
        };
        if fields.subtotal().is_none() {
            let subtotal = items
                .iter()
                .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.subtotal))
                .ok_or_else(|| "cart subtotal is out of range".to_string())?;
            fields.subtotal = Some(subtotal);
        }
        if fields.item_count().is_none() {
            fields.item_count = Some(quantity_sum(&items));
        }

        Ok(Self {
            id: raw.id,
            user_id: raw.user_id.or(raw.user),
            summary: normalize_summary(&fields),
            items,
        })
    }
}

fn quantity_sum(items: &[CartItem]) -> u32 {
    items
        .iter()
        .fold(0u32, |acc, i| acc.saturating_add(i.quantity))
}

impl Cart {
    /// Sum of item quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        quantity_sum(&self.items)
    }

    /// Normalized total.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.summary.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Line for a given cart item ID.
    #[must_use]
    pub fn item(&self, id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Line holding a given product.
    #[must_use]
    pub fn item_for_product(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }
}

/// A cart line kept by a guest before signing in, sent to `POST /cart/merge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

// =============================================================================
// Checkout validation
// =============================================================================

#[derive(Deserialize)]
struct RawCheckoutValidation {
    #[serde(default)]
    valid: Option<bool>,
    #[serde(default, rename = "isValid")]
    is_valid: Option<bool>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
    #[serde(default)]
    issues: Option<Vec<Value>>,
    #[serde(default)]
    messages: Option<Vec<Value>>,
    #[serde(default)]
    cart: Option<Cart>,
}

/// Result of `POST /cart/checkout`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCheckoutValidation")]
pub struct CheckoutValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    /// Cart as re-validated by the server, when returned.
    pub cart: Option<Cart>,
}

impl From<RawCheckoutValidation> for CheckoutValidation {
    fn from(raw: RawCheckoutValidation) -> Self {
        let errors: Vec<String> = raw
            .errors
            .or(raw.issues)
            .or(raw.messages)
            .unwrap_or_default()
            .iter()
            .filter_map(|e| match e {
                Value::String(s) => Some(s.clone()),
                Value::Object(m) => m.get("message").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect();

        Self {
            valid: raw.valid.or(raw.is_valid).unwrap_or(errors.is_empty()),
            errors,
            cart: raw.cart,
        }
    }
}
