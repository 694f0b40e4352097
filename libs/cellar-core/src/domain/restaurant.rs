use super::{deserialize_some, optional_text};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

// --- Restaurant (tenant) ---

/// Subscription tier. Only used for grouping in platform reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Starter,
    Professional,
    Enterprise,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Starter => "starter",
            Plan::Professional => "professional",
            Plan::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = RestaurantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(Plan::Starter),
            "professional" => Ok(Plan::Professional),
            "enterprise" => Ok(Plan::Enterprise),
            other => Err(RestaurantError::UnknownPlan(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub business_type: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub plan: Option<Plan>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_plan() -> Option<Plan> {
    Some(Plan::Starter)
}

/// Input for creating a restaurant.
///
/// A missing `plan` defaults to starter; an explicit `null` stores no plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRestaurant {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_plan")]
    pub plan: Option<Plan>,
}

impl NewRestaurant {
    /// Validates required fields and returns the trimmed input.
    pub fn validate(self) -> Result<Self, RestaurantError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(RestaurantError::InvalidInput(
                "Restaurant name cannot be empty".into(),
            ));
        }
        let email = self.email.trim().to_ascii_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(RestaurantError::InvalidInput(format!(
                "Invalid email address: '{}'",
                self.email
            )));
        }
        Ok(Self {
            name,
            email,
            business_type: optional_text(self.business_type),
            address: optional_text(self.address),
            phone: optional_text(self.phone),
            plan: self.plan,
        })
    }
}

/// Partial update; absent fields are left unchanged and an explicit `null`
/// clears an optional field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantChanges {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub business_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub plan: Option<Option<Plan>>,
    pub is_active: Option<bool>,
}

impl RestaurantChanges {
    pub fn validate(self) -> Result<Self, RestaurantError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(RestaurantError::InvalidInput(
                    "Restaurant name cannot be empty".into(),
                ));
            }
        }
        Ok(Self {
            name: self.name.map(|n| n.trim().to_string()),
            business_type: self.business_type.map(optional_text),
            address: self.address.map(optional_text),
            phone: self.phone.map(optional_text),
            ..self
        })
    }

    /// Applies the changes in place and stamps `updated_at`.
    pub fn apply_to(self, restaurant: &mut Restaurant, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            restaurant.name = name;
        }
        if let Some(business_type) = self.business_type {
            restaurant.business_type = optional_text(business_type);
        }
        if let Some(address) = self.address {
            restaurant.address = optional_text(address);
        }
        if let Some(phone) = self.phone {
            restaurant.phone = optional_text(phone);
        }
        if let Some(plan) = self.plan {
            restaurant.plan = plan;
        }
        if let Some(is_active) = self.is_active {
            restaurant.is_active = is_active;
        }
        restaurant.updated_at = now;
    }
}

/// Row counts attached to restaurant listings and detail views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantCounts {
    pub wines: i64,
    pub sales: i64,
    pub menu_views: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSummary {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub wine_count: i64,
    pub sale_count: i64,
}

/// Minimal reference embedded in wine and sale listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRef {
    pub id: i64,
    pub name: String,
}

/// Contact card embedded in a wine detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantContact {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl From<&Restaurant> for RestaurantRef {
    fn from(r: &Restaurant) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
        }
    }
}

impl From<&Restaurant> for RestaurantContact {
    fn from(r: &Restaurant) -> Self {
        Self {
            id: r.id,
            name: r.name.clone(),
            address: r.address.clone(),
            phone: r.phone.clone(),
        }
    }
}

// --- Errors ---

#[derive(thiserror::Error, Debug)]
pub enum RestaurantError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),
}
