use super::{
    MAX_PRICE, MAX_STOCK, deserialize_optional_id, deserialize_some, filter_value, money, optional_text,
    restaurant::{RestaurantContact, RestaurantRef},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// --- Wine ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wine {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub wine_type: String,
    pub region: Option<String>,
    pub vintage: Option<i32>,
    pub grape_variety: Option<String>,
    pub price: Decimal,
    pub description: Option<String>,
    pub alcohol_content: Option<Decimal>,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWine {
    pub restaurant_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub wine_type: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub vintage: Option<i32>,
    #[serde(default)]
    pub grape_variety: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub alcohol_content: Option<Decimal>,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn check_price(price: Decimal) -> Result<Decimal, WineError> {
    if price < Decimal::ZERO {
        return Err(WineError::InvalidInput(format!(
            "Price must be non-negative, got {price}"
        )));
    }
    if price > MAX_PRICE {
        return Err(WineError::InvalidInput(format!(
            "Price exceeds maximum allowed ({MAX_PRICE}), got {price}"
        )));
    }
    Ok(money(price))
}

fn check_stock(stock: i32) -> Result<i32, WineError> {
    if stock < 0 {
        return Err(WineError::InvalidInput(format!(
            "Stock quantity must be non-negative, got {stock}"
        )));
    }
    if stock > MAX_STOCK {
        return Err(WineError::InvalidInput(format!(
            "Stock quantity exceeds maximum allowed ({MAX_STOCK}), got {stock}"
        )));
    }
    Ok(stock)
}

fn check_alcohol(alcohol: Option<Decimal>) -> Result<Option<Decimal>, WineError> {
    match alcohol {
        Some(a) if a < Decimal::ZERO || a > Decimal::ONE_HUNDRED => Err(WineError::InvalidInput(
            format!("Alcohol content must be between 0 and 100, got {a}"),
        )),
        // Stored as NUMERIC(5,2).
        other => Ok(other.map(|a| {
            let mut normalized = a.round_dp(2);
            normalized.rescale(2);
            normalized
        })),
    }
}

impl NewWine {
    /// Validates the input, trims text and normalizes the price to two decimals.
    pub fn validate(self) -> Result<Self, WineError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(WineError::InvalidInput("Wine name cannot be empty".into()));
        }
        let wine_type = self.wine_type.trim().to_string();
        if wine_type.is_empty() {
            return Err(WineError::InvalidInput("Wine type cannot be empty".into()));
        }
        Ok(Self {
            restaurant_id: self.restaurant_id,
            name,
            wine_type,
            region: optional_text(self.region),
            vintage: self.vintage,
            grape_variety: optional_text(self.grape_variety),
            price: check_price(self.price)?,
            description: optional_text(self.description),
            alcohol_content: check_alcohol(self.alcohol_content)?,
            stock_quantity: check_stock(self.stock_quantity)?,
            image_url: optional_text(self.image_url),
            is_available: self.is_available,
        })
    }

    /// Builds the stored record once the store has assigned an id.
    pub fn into_wine(self, id: i64, now: DateTime<Utc>) -> Wine {
        Wine {
            id,
            restaurant_id: self.restaurant_id,
            name: self.name,
            wine_type: self.wine_type,
            region: self.region,
            vintage: self.vintage,
            grape_variety: self.grape_variety,
            price: self.price,
            description: self.description,
            alcohol_content: self.alcohol_content,
            stock_quantity: self.stock_quantity,
            image_url: self.image_url,
            is_available: self.is_available,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; absent fields are left unchanged and an explicit `null`
/// clears an optional field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WineChanges {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub wine_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub region: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub vintage: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub grape_variety: Option<Option<String>>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub alcohol_content: Option<Option<Decimal>>,
    pub stock_quantity: Option<i32>,
    pub is_available: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub image_url: Option<Option<String>>,
}

impl WineChanges {
    pub fn validate(self) -> Result<Self, WineError> {
        let name = match self.name {
            Some(n) if n.trim().is_empty() => {
                return Err(WineError::InvalidInput("Wine name cannot be empty".into()));
            }
            other => other.map(|n| n.trim().to_string()),
        };
        let wine_type = match self.wine_type {
            Some(t) if t.trim().is_empty() => {
                return Err(WineError::InvalidInput("Wine type cannot be empty".into()));
            }
            other => other.map(|t| t.trim().to_string()),
        };
        Ok(Self {
            name,
            wine_type,
            region: self.region.map(optional_text),
            grape_variety: self.grape_variety.map(optional_text),
            price: self.price.map(check_price).transpose()?,
            description: self.description.map(optional_text),
            alcohol_content: self.alcohol_content.map(check_alcohol).transpose()?,
            stock_quantity: self.stock_quantity.map(check_stock).transpose()?,
            image_url: self.image_url.map(optional_text),
            ..self
        })
    }

    pub fn apply_to(self, wine: &mut Wine, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            wine.name = name;
        }
        if let Some(wine_type) = self.wine_type {
            wine.wine_type = wine_type;
        }
        if let Some(region) = self.region {
            wine.region = optional_text(region);
        }
        if let Some(vintage) = self.vintage {
            wine.vintage = vintage;
        }
        if let Some(grape_variety) = self.grape_variety {
            wine.grape_variety = optional_text(grape_variety);
        }
        if let Some(price) = self.price {
            wine.price = price;
        }
        if let Some(description) = self.description {
            wine.description = optional_text(description);
        }
        if let Some(alcohol_content) = self.alcohol_content {
            wine.alcohol_content = alcohol_content;
        }
        if let Some(stock_quantity) = self.stock_quantity {
            wine.stock_quantity = stock_quantity;
        }
        if let Some(is_available) = self.is_available {
            wine.is_available = is_available;
        }
        if let Some(image_url) = self.image_url {
            wine.image_url = optional_text(image_url);
        }
        wine.updated_at = now;
    }
}

/// Query filters for the wine listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WineFilter {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub restaurant_id: Option<i64>,
    #[serde(rename = "type")]
    pub wine_type: Option<String>,
    pub region: Option<String>,
    pub search: Option<String>,
    #[serde(skip)]
    pub available_only: bool,
}

impl WineFilter {
    pub fn for_menu(restaurant_id: i64) -> Self {
        Self {
            restaurant_id: Some(restaurant_id),
            available_only: true,
            ..Default::default()
        }
    }

    /// Drops blank and `all` values so adapters only see real constraints.
    pub fn normalized(self) -> Self {
        Self {
            restaurant_id: self.restaurant_id,
            wine_type: filter_value(self.wine_type),
            region: filter_value(self.region),
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            available_only: self.available_only,
        }
    }

    /// In-process evaluation of the filter. Expects a normalized filter.
    pub fn matches(&self, wine: &Wine) -> bool {
        if self.restaurant_id.is_some_and(|id| id != wine.restaurant_id) {
            return false;
        }
        if self.available_only && !wine.is_available {
            return false;
        }
        if let Some(wine_type) = &self.wine_type {
            if &wine.wine_type != wine_type {
                return false;
            }
        }
        if let Some(region) = &self.region {
            if !contains_ci(wine.region.as_deref(), region) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let hit = contains_ci(Some(&wine.name), search)
                || contains_ci(wine.region.as_deref(), search)
                || contains_ci(wine.grape_variety.as_deref(), search);
            if !hit {
                return false;
            }
        }
        true
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

/// Wine listing entry with its owning restaurant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WineListing {
    #[serde(flatten)]
    pub wine: Wine,
    pub restaurant: RestaurantRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WineDetail {
    #[serde(flatten)]
    pub wine: Wine,
    pub restaurant: RestaurantContact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WineRef {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub wine_type: String,
}

impl From<&Wine> for WineRef {
    fn from(w: &Wine) -> Self {
        Self {
            id: w.id,
            name: w.name.clone(),
            wine_type: w.wine_type.clone(),
        }
    }
}

// --- Errors ---

#[derive(thiserror::Error, Debug)]
pub enum WineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Wine {0} has recorded sales and cannot be deleted")]
    HasSales(i64),
}
