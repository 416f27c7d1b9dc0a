//! Product catalog types and filtering.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use autoparts_core::ProductId;

use super::de;

// =============================================================================
// Product
// =============================================================================

/// A part listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Units available; `None` when the backend does not track stock.
    pub stock: Option<u32>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    /// Vehicles the part fits, e.g. "Ford Fiesta 2012".
    pub compatible_vehicles: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether at least one unit is available (untracked stock counts as available).
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock.is_none_or(|s| s > 0)
    }
}

impl TryFrom<Value> for Product {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = value else {
            return Err("product must be a JSON object".to_string());
        };

        let field = |names: &[&str]| names.iter().find_map(|n| map.get(*n).filter(|v| !v.is_null()));

        let id = field(&["id", "_id", "productId"])
            .and_then(de::ref_id_from_value::<ProductId>)
            .ok_or_else(|| "product is missing an id".to_string())?;
        let name = field(&["name", "title"])
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default();
        let price = field(&["price", "unitPrice"])
            .and_then(de::decimal_from_value)
            .unwrap_or_default();
        let image_url = field(&["imageUrl", "image", "image_url", "thumbnail"])
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                field(&["images"])
                    .and_then(Value::as_array)
                    .and_then(|images| images.first())
                    .and_then(|first| {
                        first
                            .as_str()
                            .or_else(|| first.get("url").and_then(Value::as_str))
                    })
                    .map(str::to_string)
            });
        let compatible_vehicles = field(&["compatibleVehicles", "compatibility", "vehicles"])
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(vehicle_label).collect())
            .unwrap_or_default();

        Ok(Self {
            id,
            name,
            description: field(&["description"])
                .and_then(Value::as_str)
                .map(str::to_string),
            price,
            stock: field(&["stock", "quantity", "inventory"]).and_then(de::count_from_value),
            category: field(&["category", "categoryName"]).and_then(de::name_from_value),
            brand: field(&["brand", "manufacturer"]).and_then(de::name_from_value),
            image_url,
            compatible_vehicles,
            created_at: field(&["createdAt", "created_at"])
                .and_then(|v| DateTime::<Utc>::deserialize(v).ok()),
        })
    }
}

/// Render a compatibility entry, which is either free text or
/// `{make, model, year}` / `{make, model, yearFrom, yearTo}`.
fn vehicle_label(value: &Value) -> Option<String> {
    if let Some(text) = value.as_str() {
        return Some(text.to_string());
    }
    let text = |key: &str| {
        value.get(key).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    };
    let make = text("make").or_else(|| text("brand"))?;
    let mut label = make;
    if let Some(model) = text("model") {
        label.push(' ');
        label.push_str(&model);
    }
    match (text("year"), text("yearFrom"), text("yearTo")) {
        (Some(year), _, _) => {
            label.push(' ');
            label.push_str(&year);
        }
        (None, Some(from), Some(to)) => {
            label.push_str(&format!(" {from}-{to}"));
        }
        (None, Some(from), None) => {
            label.push_str(&format!(" {from}+"));
        }
        _ => {}
    }
    Some(label)
}

// =============================================================================
// Filtering
// =============================================================================

/// Catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Name,
    Newest,
}

impl ProductSort {
    /// Query-string value understood by the backend.
    #[must_use]
    pub const fn as_query(&self) -> Option<&'static str> {
        match self {
            Self::Relevance => None,
            Self::PriceAsc => Some("price_asc"),
            Self::PriceDesc => Some("price_desc"),
            Self::Name => Some("name"),
            Self::Newest => Some("newest"),
        }
    }
}

impl std::str::FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "" | "relevance" => Ok(Self::Relevance),
            "price_asc" | "price" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "name" => Ok(Self::Name),
            "newest" => Ok(Self::Newest),
            other => Err(format!("invalid sort: {other}")),
        }
    }
}

/// Criteria for browsing the catalog.
///
/// Sent to the backend as query parameters by `ApiClient::list_products`, and
/// also evaluated locally with [`ProductFilter::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Free-text search over name, description, brand, category and vehicles.
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    /// Inclusive lower bound.
    pub min_price: Option<Decimal>,
    /// Inclusive upper bound.
    pub max_price: Option<Decimal>,
    pub in_stock_only: bool,
    pub sort: ProductSort,
    /// 1-based page number.
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductFilter {
    /// Query parameters for `GET /products`, in a stable order.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        let non_blank = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        if let Some(search) = non_blank(&self.search) {
            query.push(("search", search));
        }
        if let Some(category) = non_blank(&self.category) {
            query.push(("category", category));
        }
        if let Some(brand) = non_blank(&self.brand) {
            query.push(("brand", brand));
        }
        if let Some(min) = self.min_price {
            query.push(("minPrice", min.to_string()));
        }
        if let Some(max) = self.max_price {
            query.push(("maxPrice", max.to_string()));
        }
        if self.in_stock_only {
            query.push(("inStock", "true".to_string()));
        }
        if let Some(sort) = self.sort.as_query() {
            query.push(("sort", sort.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }

    /// Whether a product satisfies every criterion (sorting and paging ignored).
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let eq_ci = |wanted: &Option<String>, actual: &Option<String>| match wanted
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
        {
            None => true,
            Some(w) => actual.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(w)),
        };

        if !eq_ci(&self.category, &product.category) || !eq_ci(&self.brand, &product.brand) {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min)
            || self.max_price.is_some_and(|max| product.price > max)
        {
            return false;
        }
        if self.in_stock_only && !product.in_stock() {
            return false;
        }

        let Some(search) = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
        else {
            return true;
        };

        let haystack = [
            Some(product.name.as_str()),
            product.description.as_deref(),
            product.brand.as_deref(),
            product.category.as_deref(),
        ]
        .into_iter()
        .flatten()
        .chain(product.compatible_vehicles.iter().map(String::as_str))
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

        // Every word must appear somewhere ("filtro fiesta" finds a Fiesta oil filter)
        search.split_whitespace().all(|word| haystack.contains(word))
    }

    /// Filter, sort and page a product list locally.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let mut result: Vec<Product> = products
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect();

        match self.sort {
            ProductSort::Relevance => {}
            ProductSort::PriceAsc => result.sort_by(|a, b| a.price.cmp(&b.price)),
            ProductSort::PriceDesc => result.sort_by(|a, b| b.price.cmp(&a.price)),
            ProductSort::Name => {
                result.sort_by_key(|p| p.name.to_lowercase());
            }
            ProductSort::Newest => result.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            let page = self.page.unwrap_or(1).max(1);
            let skip = (page - 1).saturating_mul(limit) as usize;
            result = result.into_iter().skip(skip).take(limit as usize).collect();
        }

        result
    }
}

/// Distinct values available for filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub categories: Vec<String>,
    pub brands: Vec<String>,
}

impl Facets {
    /// Collect sorted, de-duplicated categories and brands.
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        let categories: BTreeSet<&str> =
            products.iter().filter_map(|p| p.category.as_deref()).collect();
        let brands: BTreeSet<&str> = products.iter().filter_map(|p| p.brand.as_deref()).collect();
        Self {
            categories: categories.into_iter().map(str::to_string).collect(),
            brands: brands.into_iter().map(str::to_string).collect(),
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of catalog results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Total matching products across all pages.
    pub total: u32,
    pub page: u32,
    pub limit: Option<u32>,
}

impl ProductPage {
    /// Decode any of the list shapes the backend uses:
    /// a raw array, `{data: [...]}`, `{products: [...], total, page, limit}`
    /// or `{data: {products: [...], total}}`.
    ///
    /// # Errors
    ///
    /// Returns an error if no product list is found or a product is invalid.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(_) => {
                let products: Vec<Product> = serde_json::from_value(value)?;
                Ok(Self::single_page(products))
            }
            Value::Object(mut map) => {
                let list = ["products", "items", "results", "data"]
                    .iter()
                    .find_map(|key| map.remove(*key));

                let products: Vec<Product> = match list {
                    Some(nested @ Value::Object(_)) => {
                        let inner = Self::from_value(nested)?;
                        let total = meta_count(&map, &["total", "count", "totalItems"]);
                        return Ok(Self {
                            total: total.unwrap_or(inner.total),
                            ..inner
                        });
                    }
                    Some(list) => serde_json::from_value(list)?,
                    None => {
                        return Err(serde::de::Error::custom(
                            "response contains no product list",
                        ));
                    }
                };

                let total = meta_count(&map, &["total", "count", "totalItems"])
                    .or_else(|| u32::try_from(products.len()).ok())
                    .unwrap_or_default();
                Ok(Self {
                    total,
                    page: meta_count(&map, &["page", "currentPage"]).unwrap_or(1),
                    limit: meta_count(&map, &["limit", "pageSize", "perPage"]),
                    products,
                })
            }
            _ => Err(serde::de::Error::custom("product list must be an array or object")),
        }
    }

    fn single_page(products: Vec<Product>) -> Self {
        Self {
            total: u32::try_from(products.len()).unwrap_or(u32::MAX),
            page: 1,
            limit: None,
            products,
        }
    }

    /// Number of pages given `total` and `limit`.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        match self.limit {
            Some(limit) if limit > 0 => self.total.div_ceil(limit).max(1),
            _ => 1,
        }
    }

    /// Whether a further page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

fn meta_count(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<u32> {
    keys.iter()
        .find_map(|k| map.get(*k))
        .and_then(de::count_from_value)
}
