use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{error::Error as StdError, future::Future};

// Declare modules
pub mod adapters;
pub mod analytics;
pub mod domain;

use analytics::query::{
    Breakdown, GroupCount, GroupTotals, SaleGroup, SaleMeasure, SaleScope, SaleTotals, Tally,
};
use domain::{
    admin_user::{AdminUser, NewAdminUser},
    menu_view::MenuView,
    restaurant::{
        NewRestaurant, Restaurant, RestaurantChanges, RestaurantCounts, RestaurantSummary,
    },
    sale::{Sale, SaleDraft, SaleFilter, SaleListing},
    wine::{NewWine, Wine, WineChanges, WineDetail, WineFilter, WineListing},
};

// Common error type for the core library
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error(
        "Insufficient stock for wine {wine_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        wine_id: i64,
        requested: i32,
        available: i32,
    },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Infrastructure error: {0}")]
    Infrastructure(#[from] Box<dyn StdError + Send + Sync>),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn infrastructure<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        CoreError::Infrastructure(Box::new(err))
    }
}

// Conversions so '?' turns domain validation errors into CoreError in handlers
impl From<domain::restaurant::RestaurantError> for CoreError {
    fn from(err: domain::restaurant::RestaurantError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

impl From<domain::wine::WineError> for CoreError {
    fn from(err: domain::wine::WineError) -> Self {
        match err {
            domain::wine::WineError::InvalidInput(msg) => CoreError::Validation(msg),
            e @ domain::wine::WineError::HasSales(_) => CoreError::Conflict(e.to_string()),
        }
    }
}

impl From<domain::sale::SaleError> for CoreError {
    fn from(err: domain::sale::SaleError) -> Self {
        match err {
            domain::sale::SaleError::InvalidInput(msg) => CoreError::Validation(msg),
            e @ domain::sale::SaleError::WineNotInRestaurant { .. } => {
                CoreError::Validation(e.to_string())
            }
        }
    }
}

impl From<domain::admin_user::AdminUserError> for CoreError {
    fn from(err: domain::admin_user::AdminUserError) -> Self {
        match err {
            domain::admin_user::AdminUserError::InvalidInput(msg) => CoreError::Validation(msg),
        }
    }
}

// Marker trait for commands
pub trait Command: Send + Sync + 'static {}

// Port for handling commands
pub trait CommandHandler<C: Command>: Send + Sync {
    type Output: Send;

    fn handle(&self, command: C) -> impl Future<Output = Result<Self::Output, CoreError>> + Send;
}

// Port for restaurant (tenant) persistence
#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the email is taken.
    async fn create(&self, restaurant: NewRestaurant) -> Result<Restaurant, CoreError>;
    async fn get(&self, id: i64) -> Result<Option<Restaurant>, CoreError>;
    /// Newest first, with wine and sale counts.
    async fn list(&self) -> Result<Vec<RestaurantSummary>, CoreError>;
    async fn find_many(&self, ids: &[i64]) -> Result<Vec<Restaurant>, CoreError>;
    async fn counts(&self, id: i64) -> Result<RestaurantCounts, CoreError>;
    async fn update(&self, id: i64, changes: RestaurantChanges) -> Result<Restaurant, CoreError>;
    /// Removes the restaurant together with its wines, sales and menu views.
    async fn delete(&self, id: i64) -> Result<(), CoreError>;
}

// Port for wine catalog persistence
#[async_trait]
pub trait WineRepository: Send + Sync {
    /// Fails with `NotFound` when the owning restaurant does not exist.
    async fn create(&self, wine: NewWine) -> Result<Wine, CoreError>;
    async fn get(&self, id: i64) -> Result<Option<Wine>, CoreError>;
    async fn get_detail(&self, id: i64) -> Result<Option<WineDetail>, CoreError>;
    /// Ordered by name.
    async fn list(&self, filter: &WineFilter) -> Result<Vec<WineListing>, CoreError>;
    async fn find_many(&self, ids: &[i64]) -> Result<Vec<Wine>, CoreError>;
    async fn update(&self, id: i64, changes: WineChanges) -> Result<Wine, CoreError>;
    /// Fails with `Conflict` when the wine has recorded sales.
    async fn delete(&self, id: i64) -> Result<(), CoreError>;
}

// Port for sales persistence
#[async_trait]
pub trait SaleRepository: Send + Sync {
    /// Inserts the sale and decrements the wine's stock as one atomic unit.
    ///
    /// Fails with `NotFound` when the wine is gone, `Validation` when it belongs to
    /// another restaurant and `InsufficientStock` when the quantity exceeds the stock.
    /// Nothing is written on failure.
    async fn record(&self, draft: SaleDraft) -> Result<Sale, CoreError>;
    /// Newest first.
    async fn list(&self, filter: &SaleFilter) -> Result<Vec<SaleListing>, CoreError>;
}

// Port for the menu view log
#[async_trait]
pub trait MenuViewRepository: Send + Sync {
    async fn record(
        &self,
        restaurant_id: i64,
        viewed_at: DateTime<Utc>,
    ) -> Result<MenuView, CoreError>;
}

// Port for platform operator accounts
#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    async fn create(&self, admin: NewAdminUser) -> Result<AdminUser, CoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>, CoreError>;
}

// Port for grouped reads used by the aggregation service
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Quantity and amount totals over every sale in scope. Zero when there are none.
    async fn sum(&self, scope: &SaleScope) -> Result<SaleTotals, CoreError>;

    /// Totals per wine or per restaurant. Order is unspecified.
    async fn sum_by_group(
        &self,
        scope: &SaleScope,
        group: SaleGroup,
    ) -> Result<Vec<GroupTotals>, CoreError>;

    /// Largest groups by `measure`, ties broken by ascending key, groups with zero
    /// quantity dropped, at most `limit` entries.
    async fn top_n_by_group(
        &self,
        scope: &SaleScope,
        group: SaleGroup,
        measure: SaleMeasure,
        limit: usize,
    ) -> Result<Vec<GroupTotals>, CoreError> {
        let groups = self.sum_by_group(scope, group).await?;
        Ok(analytics::query::rank_groups(groups, measure, limit))
    }

    async fn count(&self, tally: &Tally) -> Result<i64, CoreError>;

    async fn count_by_group(&self, breakdown: &Breakdown) -> Result<Vec<GroupCount>, CoreError>;
}
