//! Read-only aggregation over sales, wines, restaurants and menu views.
//!
//! Every figure is computed through the [`AggregateStore`] port, so the service never
//! loads whole tables. Month windows are derived from an explicit instant via
//! [`month_start`] rather than the wall clock.

pub mod query;
mod window;

pub use window::{Window, average_per_restaurant, month_start};

use crate::{
    AggregateStore, CoreError, RestaurantRepository, WineRepository,
    domain::{
        money,
        restaurant::{Plan, Restaurant},
        wine::Wine,
    },
};
use chrono::{DateTime, Utc};
use query::{Breakdown, GroupCount, GroupTotals, SaleGroup, SaleMeasure, SaleScope, Tally};
use rust_decimal::Decimal;
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, warn};

pub const DASHBOARD_TOP_WINES: usize = 5;
pub const OVERVIEW_TOP_RESTAURANTS: usize = 10;
pub const OVERVIEW_TOP_WINES: usize = 10;

#[derive(thiserror::Error, Debug)]
pub enum AnalyticsError {
    #[error("Restaurant {0} not found")]
    RestaurantNotFound(i64),
    #[error("Aggregation failed: {0}")]
    AggregationFailed(#[from] CoreError),
}

// --- Report shapes ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformRevenue {
    pub total: Decimal,
    pub monthly: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopWine {
    #[serde(flatten)]
    pub wine: Wine,
    pub restaurant_name: String,
    pub sold_quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopRestaurant {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub wine_count: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanCount {
    pub plan: Option<Plan>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub wine_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_wines: i64,
    pub active_wines: i64,
    pub monthly_sales: Decimal,
    pub bottles_sold: i64,
    pub menu_views: i64,
}

/// Per-restaurant dashboard. Monthly figures cover the month of `as_of`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub top_wines: Vec<TopWine>,
    pub wines_by_type: Vec<TypeCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub total_revenue: Decimal,
    pub monthly_revenue: Decimal,
    pub total_restaurants: i64,
    pub active_restaurants: i64,
    pub total_wines: i64,
    pub new_signups: i64,
    pub average_revenue_per_restaurant: Decimal,
    pub average_wines_per_restaurant: Decimal,
}

/// Platform-wide report for operators. Rankings are all-time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub stats: OverviewStats,
    pub revenue_by_plan: Vec<PlanCount>,
    pub top_restaurants: Vec<TopRestaurant>,
    pub top_wines: Vec<TopWine>,
}

// --- Service ---

#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn AggregateStore>,
    restaurants: Arc<dyn RestaurantRepository>,
    wines: Arc<dyn WineRepository>,
}

impl AnalyticsService {
    pub fn new(
        store: Arc<dyn AggregateStore>,
        restaurants: Arc<dyn RestaurantRepository>,
        wines: Arc<dyn WineRepository>,
    ) -> Self {
        Self {
            store,
            restaurants,
            wines,
        }
    }

    /// Revenue of one restaurant during the month of `as_of`.
    pub async fn monthly_revenue(
        &self,
        restaurant_id: i64,
        as_of: DateTime<Utc>,
    ) -> Result<Decimal, AnalyticsError> {
        let scope = SaleScope::restaurant(restaurant_id).since(Some(month_start(as_of)));
        let totals = self.store.sum(&scope).await?;
        Ok(money(totals.revenue))
    }

    pub async fn platform_revenue(
        &self,
        as_of: DateTime<Utc>,
    ) -> Result<PlatformRevenue, AnalyticsError> {
        let total = self.store.sum(&SaleScope::all()).await?;
        let monthly = self
            .store
            .sum(&SaleScope::all().since(Some(month_start(as_of))))
            .await?;
        Ok(PlatformRevenue {
            total: money(total.revenue),
            monthly: money(monthly.revenue),
        })
    }

    /// Best sellers by bottles sold, optionally for one restaurant.
    pub async fn top_wines(
        &self,
        restaurant_id: Option<i64>,
        window: Window,
        limit: usize,
    ) -> Result<Vec<TopWine>, AnalyticsError> {
        let scope = SaleScope {
            restaurant_id,
            since: window.since(),
        };
        let ranked = self
            .store
            .top_n_by_group(&scope, SaleGroup::Wine, SaleMeasure::Quantity, limit)
            .await?;
        self.resolve_wines(ranked).await
    }

    /// Restaurants ranked by revenue.
    pub async fn top_restaurants(
        &self,
        window: Window,
        limit: usize,
    ) -> Result<Vec<TopRestaurant>, AnalyticsError> {
        let scope = SaleScope::all().since(window.since());
        let ranked = self
            .store
            .top_n_by_group(&scope, SaleGroup::Restaurant, SaleMeasure::Revenue, limit)
            .await?;
        self.resolve_restaurants(ranked).await
    }

    /// Restaurant counts per plan. Restaurants without a plan are grouped under `None`.
    pub async fn revenue_by_plan(&self) -> Result<Vec<PlanCount>, AnalyticsError> {
        let counts = self
            .store
            .count_by_group(&Breakdown::RestaurantsByPlan)
            .await?;
        query::order_group_counts(counts)
            .into_iter()
            .map(|GroupCount { key, count }| -> Result<PlanCount, AnalyticsError> {
                let plan = key
                    .map(|k| k.parse::<Plan>())
                    .transpose()
                    .map_err(CoreError::from)?;
                Ok(PlanCount { plan, count })
            })
            .collect()
    }

    pub async fn wines_by_type(&self, restaurant_id: i64) -> Result<Vec<TypeCount>, AnalyticsError> {
        let counts = self
            .store
            .count_by_group(&Breakdown::WinesByType { restaurant_id })
            .await?;
        Ok(query::order_group_counts(counts)
            .into_iter()
            .map(|c| TypeCount {
                wine_type: c.key.unwrap_or_default(),
                count: c.count,
            })
            .collect())
    }

    pub async fn dashboard(
        &self,
        restaurant_id: i64,
        as_of: DateTime<Utc>,
    ) -> Result<Dashboard, AnalyticsError> {
        debug!(restaurant_id, %as_of, "Building restaurant dashboard");
        if self.restaurants.get(restaurant_id).await?.is_none() {
            return Err(AnalyticsError::RestaurantNotFound(restaurant_id));
        }

        let since = Some(month_start(as_of));
        let month = SaleScope::restaurant(restaurant_id).since(since);

        let total_wines = self
            .store
            .count(&Tally::Wines {
                restaurant_id: Some(restaurant_id),
                available_only: false,
            })
            .await?;
        let active_wines = self
            .store
            .count(&Tally::Wines {
                restaurant_id: Some(restaurant_id),
                available_only: true,
            })
            .await?;
        let monthly = self.store.sum(&month).await?;
        let menu_views = self
            .store
            .count(&Tally::MenuViews {
                restaurant_id: Some(restaurant_id),
                since,
            })
            .await?;

        let top_wines = self
            .top_wines(
                Some(restaurant_id),
                Window::MonthOf(as_of),
                DASHBOARD_TOP_WINES,
            )
            .await?;
        let wines_by_type = self.wines_by_type(restaurant_id).await?;

        Ok(Dashboard {
            stats: DashboardStats {
                total_wines,
                active_wines,
                monthly_sales: money(monthly.revenue),
                bottles_sold: monthly.quantity,
                menu_views,
            },
            top_wines,
            wines_by_type,
        })
    }

    pub async fn admin_overview(&self, as_of: DateTime<Utc>) -> Result<AdminOverview, AnalyticsError> {
        debug!(%as_of, "Building platform overview");
        let since = Some(month_start(as_of));

        let revenue = self.platform_revenue(as_of).await?;
        let total_restaurants = self
            .store
            .count(&Tally::Restaurants {
                active_only: false,
                created_since: None,
            })
            .await?;
        let active_restaurants = self
            .store
            .count(&Tally::Restaurants {
                active_only: true,
                created_since: None,
            })
            .await?;
        let new_signups = self
            .store
            .count(&Tally::Restaurants {
                active_only: false,
                created_since: since,
            })
            .await?;
        let total_wines = self
            .store
            .count(&Tally::Wines {
                restaurant_id: None,
                available_only: false,
            })
            .await?;

        let revenue_by_plan = self.revenue_by_plan().await?;
        let top_restaurants = self
            .top_restaurants(Window::AllTime, OVERVIEW_TOP_RESTAURANTS)
            .await?;
        let top_wines = self
            .top_wines(None, Window::AllTime, OVERVIEW_TOP_WINES)
            .await?;

        Ok(AdminOverview {
            stats: OverviewStats {
                total_revenue: revenue.total,
                monthly_revenue: revenue.monthly,
                total_restaurants,
                active_restaurants,
                total_wines,
                new_signups,
                average_revenue_per_restaurant: average_per_restaurant(
                    revenue.total,
                    total_restaurants,
                ),
                average_wines_per_restaurant: average_per_restaurant(
                    Decimal::from(total_wines),
                    total_restaurants,
                ),
            },
            revenue_by_plan,
            top_restaurants,
            top_wines,
        })
    }

    async fn resolve_wines(&self, ranked: Vec<GroupTotals>) -> Result<Vec<TopWine>, AnalyticsError> {
        let ids: Vec<i64> = ranked.iter().map(|g| g.key).collect();
        let wines: HashMap<i64, Wine> = self
            .wines
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|w| (w.id, w))
            .collect();

        let mut restaurant_ids: Vec<i64> = wines.values().map(|w| w.restaurant_id).collect();
        restaurant_ids.sort_unstable();
        restaurant_ids.dedup();
        let names: HashMap<i64, String> = self
            .restaurants
            .find_many(&restaurant_ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r.name))
            .collect();

        let mut top = Vec::with_capacity(ranked.len());
        for group in ranked {
            let Some(wine) = wines.get(&group.key) else {
                warn!(wine_id = group.key, "Ranked wine has no catalog record");
                continue;
            };
            top.push(TopWine {
                restaurant_name: names.get(&wine.restaurant_id).cloned().unwrap_or_default(),
                wine: wine.clone(),
                sold_quantity: group.totals.quantity,
                revenue: group.totals.revenue,
            });
        }
        Ok(top)
    }

    async fn resolve_restaurants(
        &self,
        ranked: Vec<GroupTotals>,
    ) -> Result<Vec<TopRestaurant>, AnalyticsError> {
        let ids: Vec<i64> = ranked.iter().map(|g| g.key).collect();
        let restaurants: HashMap<i64, Restaurant> = self
            .restaurants
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let mut top = Vec::with_capacity(ranked.len());
        for group in ranked {
            let Some(restaurant) = restaurants.get(&group.key) else {
                warn!(restaurant_id = group.key, "Ranked restaurant no longer exists");
                continue;
            };
            let wine_count = self
                .store
                .count(&Tally::Wines {
                    restaurant_id: Some(group.key),
                    available_only: false,
                })
                .await?;
            top.push(TopRestaurant {
                restaurant: restaurant.clone(),
                wine_count,
                revenue: group.totals.revenue,
            });
        }
        Ok(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        RestaurantRepository, SaleRepository, WineRepository,
        adapters::in_memory_store::InMemoryStore,
        domain::{
            restaurant::NewRestaurant,
            sale::{RecordSale, SaleDraft},
            wine::NewWine,
        },
    };
    use chrono::TimeZone;
    use std::str::FromStr;

    fn service(store: &Arc<InMemoryStore>) -> AnalyticsService {
        AnalyticsService::new(store.clone(), store.clone(), store.clone())
    }

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    async fn restaurant(store: &InMemoryStore, name: &str, plan: Option<Plan>) -> Restaurant {
        RestaurantRepository::create(
            store,
            NewRestaurant {
                name: name.into(),
                email: format!("{}@demo.com", name.to_lowercase().replace(' ', "")),
                business_type: None,
                address: None,
                phone: None,
                plan,
            },
        )
        .await
        .unwrap()
    }

    async fn wine(store: &InMemoryStore, restaurant_id: i64, name: &str, kind: &str, price: &str) -> Wine {
        WineRepository::create(
            store,
            NewWine {
                restaurant_id,
                name: name.into(),
                wine_type: kind.into(),
                region: None,
                vintage: None,
                grape_variety: None,
                price: Decimal::from_str(price).unwrap(),
                description: None,
                alcohol_content: None,
                stock_quantity: 100,
                image_url: None,
                is_available: true,
            }
            .validate()
            .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn sell(store: &InMemoryStore, wine: &Wine, quantity: i32, at: DateTime<Utc>) {
        let draft: SaleDraft = RecordSale {
            restaurant_id: wine.restaurant_id,
            wine_id: wine.id,
            quantity,
            unit_price: None,
            sale_date: Some(at),
        }
        .price_against(wine, at)
        .unwrap();
        SaleRepository::record(store, draft).await.unwrap();
    }

    #[tokio::test]
    async fn test_monthly_revenue_is_zero_without_sales() {
        let store = Arc::new(InMemoryStore::new());
        let r = restaurant(&store, "Bella Vista", Some(Plan::Professional)).await;
        let revenue = service(&store).monthly_revenue(r.id, as_of()).await.unwrap();
        assert_eq!(revenue, Decimal::ZERO);
        assert_eq!(revenue.to_string(), "0.00");
    }

    #[tokio::test]
    async fn test_monthly_revenue_ignores_previous_month() {
        let store = Arc::new(InMemoryStore::new());
        let r = restaurant(&store, "Bella Vista", Some(Plan::Professional)).await;
        let w = wine(&store, r.id, "Sancerre", "White Wine", "65.00").await;

        sell(&store, &w, 2, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()).await;
        sell(&store, &w, 5, Utc.with_ymd_and_hms(2024, 5, 31, 23, 59, 59).unwrap()).await;

        let svc = service(&store);
        assert_eq!(
            svc.monthly_revenue(r.id, as_of()).await.unwrap().to_string(),
            "130.00"
        );
        let platform = svc.platform_revenue(as_of()).await.unwrap();
        assert_eq!(platform.total.to_string(), "455.00");
        assert_eq!(platform.monthly.to_string(), "130.00");
    }

    #[tokio::test]
    async fn test_top_wines_ranks_by_quantity_with_id_tie_break() {
        let store = Arc::new(InMemoryStore::new());
        let r = restaurant(&store, "Bella Vista", None).await;
        let a = wine(&store, r.id, "A", "Red Wine", "10").await;
        let b = wine(&store, r.id, "B", "Red Wine", "99").await;
        let c = wine(&store, r.id, "C", "Rosé", "5").await;
        let _unsold = wine(&store, r.id, "D", "Rosé", "5").await;

        let at = as_of();
        sell(&store, &b, 3, at).await;
        sell(&store, &a, 3, at).await;
        sell(&store, &c, 4, at).await;

        let top = service(&store)
            .top_wines(Some(r.id), Window::MonthOf(at), 5)
            .await
            .unwrap();
        let names: Vec<&str> = top.iter().map(|t| t.wine.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert_eq!(top[0].sold_quantity, 4);
        assert_eq!(top[2].revenue.to_string(), "297.00");
        assert_eq!(top[0].restaurant_name, "Bella Vista");

        let limited = service(&store)
            .top_wines(Some(r.id), Window::AllTime, 2)
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_revenue_by_plan_counts_missing_plan_separately() {
        let store = Arc::new(InMemoryStore::new());
        restaurant(&store, "One", Some(Plan::Starter)).await;
        restaurant(&store, "Two", Some(Plan::Starter)).await;
        restaurant(&store, "Three", None).await;

        let by_plan = service(&store).revenue_by_plan().await.unwrap();
        assert_eq!(
            by_plan,
            vec![
                PlanCount {
                    plan: Some(Plan::Starter),
                    count: 2
                },
                PlanCount {
                    plan: None,
                    count: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_dashboard_for_unknown_restaurant() {
        let store = Arc::new(InMemoryStore::new());
        let result = service(&store).dashboard(42, as_of()).await;
        assert!(matches!(result, Err(AnalyticsError::RestaurantNotFound(42))));
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let store = Arc::new(InMemoryStore::new());
        let r = restaurant(&store, "Bella Vista", Some(Plan::Professional)).await;
        let red = wine(&store, r.id, "Margaux", "Red Wine", "450.00").await;
        let white = wine(&store, r.id, "Sancerre", "White Wine", "65.00").await;
        let hidden = wine(&store, r.id, "Barolo", "Red Wine", "120.00").await;
        WineRepository::update(
            store.as_ref(),
            hidden.id,
            crate::domain::wine::WineChanges {
                is_available: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let at = as_of();
        sell(&store, &red, 1, at).await;
        sell(&store, &white, 3, at).await;
        crate::MenuViewRepository::record(store.as_ref(), r.id, at)
            .await
            .unwrap();

        let dashboard = service(&store).dashboard(r.id, at).await.unwrap();
        assert_eq!(dashboard.stats.total_wines, 3);
        assert_eq!(dashboard.stats.active_wines, 2);
        assert_eq!(dashboard.stats.monthly_sales.to_string(), "645.00");
        assert_eq!(dashboard.stats.bottles_sold, 4);
        assert_eq!(dashboard.stats.menu_views, 1);
        assert_eq!(dashboard.top_wines[0].wine.id, white.id);
        assert_eq!(
            dashboard.wines_by_type,
            vec![
                TypeCount {
                    wine_type: "Red Wine".into(),
                    count: 2
                },
                TypeCount {
                    wine_type: "White Wine".into(),
                    count: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_admin_overview() {
        let store = Arc::new(InMemoryStore::new());
        let bella = restaurant(&store, "Bella", Some(Plan::Professional)).await;
        let urban = restaurant(&store, "Urban", Some(Plan::Enterprise)).await;
        let _quiet = restaurant(&store, "Quiet", Some(Plan::Starter)).await;

        let margaux = wine(&store, bella.id, "Margaux", "Red Wine", "450.00").await;
        let cava = wine(&store, urban.id, "Cava", "Sparkling", "30.00").await;

        let at = as_of();
        sell(&store, &margaux, 1, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()).await;
        sell(&store, &cava, 10, at).await;

        let overview = service(&store).admin_overview(at).await.unwrap();
        assert_eq!(overview.stats.total_revenue.to_string(), "750.00");
        assert_eq!(overview.stats.monthly_revenue.to_string(), "300.00");
        assert_eq!(overview.stats.total_restaurants, 3);
        assert_eq!(overview.stats.active_restaurants, 3);
        assert_eq!(overview.stats.total_wines, 2);
        assert_eq!(
            overview.stats.average_revenue_per_restaurant.to_string(),
            "250.00"
        );
        assert_eq!(
            overview.stats.average_wines_per_restaurant.to_string(),
            "0.67"
        );

        let ranked: Vec<i64> = overview.top_restaurants.iter().map(|t| t.restaurant.id).collect();
        assert_eq!(ranked, vec![bella.id, urban.id]);
        assert_eq!(overview.top_restaurants[0].wine_count, 1);
        assert_eq!(overview.top_wines[0].wine.id, cava.id);
        assert_eq!(overview.revenue_by_plan.len(), 3);
    }

    #[tokio::test]
    async fn test_admin_overview_on_empty_platform() {
        let store = Arc::new(InMemoryStore::new());
        let overview = service(&store).admin_overview(as_of()).await.unwrap();
        assert_eq!(overview.stats.total_revenue, Decimal::ZERO);
        assert_eq!(overview.stats.average_revenue_per_restaurant, Decimal::ZERO);
        assert_eq!(overview.stats.average_wines_per_restaurant, Decimal::ZERO);
        assert!(overview.top_restaurants.is_empty());
        assert!(overview.revenue_by_plan.is_empty());
    }
}
