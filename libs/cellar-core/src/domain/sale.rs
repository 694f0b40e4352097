use super::{
    MAX_PRICE, MAX_SALE_QUANTITY, MAX_TOTAL, deserialize_end_bound, deserialize_optional_id,
    deserialize_start_bound, money,
    restaurant::RestaurantRef,
    wine::{Wine, WineRef},
};
use crate::Command;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// --- Sale ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    pub restaurant_id: i64,
    pub wine_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    /// Stored at creation; never recomputed on read.
    pub total_amount: Decimal,
    pub sale_date: DateTime<Utc>,
}

/// Command recording a sale. `unit_price` defaults to the wine's current price.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSale {
    pub restaurant_id: i64,
    pub wine_id: i64,
    pub quantity: i32,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub sale_date: Option<DateTime<Utc>>,
}

impl Command for RecordSale {}

/// Fully priced sale ready to be persisted together with the stock decrement.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub restaurant_id: i64,
    pub wine_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub sale_date: DateTime<Utc>,
}

impl SaleDraft {
    pub fn into_sale(self, id: i64) -> Sale {
        Sale {
            id,
            restaurant_id: self.restaurant_id,
            wine_id: self.wine_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_amount: self.total_amount,
            sale_date: self.sale_date,
        }
    }
}

/// `unit_price × quantity` at two decimals, or `None` on overflow.
pub fn line_total(unit_price: Decimal, quantity: i32) -> Option<Decimal> {
    unit_price.checked_mul(Decimal::from(quantity)).map(money)
}

impl RecordSale {
    /// Checks the fields that do not need the wine record.
    pub fn validate(&self) -> Result<(), SaleError> {
        if self.quantity <= 0 {
            return Err(SaleError::InvalidInput(format!(
                "Quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.quantity > MAX_SALE_QUANTITY {
            return Err(SaleError::InvalidInput(format!(
                "Quantity exceeds maximum allowed ({MAX_SALE_QUANTITY}), got {}",
                self.quantity
            )));
        }
        if let Some(price) = self.unit_price {
            if price < Decimal::ZERO {
                return Err(SaleError::InvalidInput(format!(
                    "Unit price must be non-negative, got {price}"
                )));
            }
            if price > MAX_PRICE {
                return Err(SaleError::InvalidInput(format!(
                    "Unit price exceeds maximum allowed ({MAX_PRICE}), got {price}"
                )));
            }
        }
        Ok(())
    }

    /// Prices the sale against the wine it refers to.
    pub fn price_against(self, wine: &Wine, now: DateTime<Utc>) -> Result<SaleDraft, SaleError> {
        self.validate()?;
        if wine.id != self.wine_id {
            return Err(SaleError::InvalidInput(format!(
                "Wine {} does not match sale wine {}",
                wine.id, self.wine_id
            )));
        }
        if wine.restaurant_id != self.restaurant_id {
            return Err(SaleError::WineNotInRestaurant {
                wine_id: wine.id,
                restaurant_id: self.restaurant_id,
            });
        }
        let unit_price = money(self.unit_price.unwrap_or(wine.price));
        let total_amount = line_total(unit_price, self.quantity)
            .filter(|total| *total <= MAX_TOTAL)
            .ok_or_else(|| {
                SaleError::InvalidInput(format!(
                    "Sale total exceeds maximum allowed ({MAX_TOTAL}) for {} x {unit_price}",
                    self.quantity
                ))
            })?;
        Ok(SaleDraft {
            restaurant_id: self.restaurant_id,
            wine_id: self.wine_id,
            quantity: self.quantity,
            unit_price,
            total_amount,
            sale_date: self.sale_date.unwrap_or(now),
        })
    }
}

/// Query filters for the sales listing. Date bounds are inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleFilter {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub restaurant_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_start_bound")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_end_bound")]
    pub end_date: Option<DateTime<Utc>>,
}

impl SaleFilter {
    pub fn matches(&self, sale: &Sale) -> bool {
        self.restaurant_id.is_none_or(|id| id == sale.restaurant_id)
            && self.start_date.is_none_or(|start| sale.sale_date >= start)
            && self.end_date.is_none_or(|end| sale.sale_date <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleListing {
    #[serde(flatten)]
    pub sale: Sale,
    pub wine: WineRef,
    pub restaurant: RestaurantRef,
}

// --- Errors ---

#[derive(thiserror::Error, Debug)]
pub enum SaleError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Wine {wine_id} does not belong to restaurant {restaurant_id}")]
    WineNotInRestaurant { wine_id: i64, restaurant_id: i64 },
}
