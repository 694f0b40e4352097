//! Query vocabulary shared by the aggregation service and the store adapters.

use crate::domain::{money, sale::Sale};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Which sales an aggregate covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaleScope {
    pub restaurant_id: Option<i64>,
    /// Inclusive lower bound on `sale_date`.
    pub since: Option<DateTime<Utc>>,
}

impl SaleScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn restaurant(restaurant_id: i64) -> Self {
        Self {
            restaurant_id: Some(restaurant_id),
            since: None,
        }
    }

    pub fn since(self, since: Option<DateTime<Utc>>) -> Self {
        Self { since, ..self }
    }

    pub fn matches(&self, sale: &Sale) -> bool {
        self.restaurant_id.is_none_or(|id| id == sale.restaurant_id)
            && self.since.is_none_or(|since| sale.sale_date >= since)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleGroup {
    Wine,
    Restaurant,
}

impl SaleGroup {
    pub fn key_of(&self, sale: &Sale) -> i64 {
        match self {
            SaleGroup::Wine => sale.wine_id,
            SaleGroup::Restaurant => sale.restaurant_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleMeasure {
    /// Bottles sold.
    Quantity,
    /// Summed `total_amount`.
    Revenue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaleTotals {
    pub quantity: i64,
    pub revenue: Decimal,
}

impl SaleTotals {
    pub fn add(&mut self, sale: &Sale) {
        self.quantity += i64::from(sale.quantity);
        self.revenue += sale.total_amount;
    }

    /// Revenue normalized to two decimals.
    pub fn normalized(self) -> Self {
        Self {
            quantity: self.quantity,
            revenue: money(self.revenue),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupTotals {
    pub key: i64,
    pub totals: SaleTotals,
}

/// Row counts the dashboards need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    Wines {
        restaurant_id: Option<i64>,
        available_only: bool,
    },
    Restaurants {
        active_only: bool,
        created_since: Option<DateTime<Utc>>,
    },
    MenuViews {
        restaurant_id: Option<i64>,
        since: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakdown {
    /// Restaurants per plan, including a `None` bucket.
    RestaurantsByPlan,
    /// Wines per type for one restaurant.
    WinesByType { restaurant_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub key: Option<String>,
    pub count: i64,
}

fn compare_measure(a: &GroupTotals, b: &GroupTotals, measure: SaleMeasure) -> Ordering {
    match measure {
        SaleMeasure::Quantity => b.totals.quantity.cmp(&a.totals.quantity),
        SaleMeasure::Revenue => b.totals.revenue.cmp(&a.totals.revenue),
    }
}

/// Orders groups by `measure` descending with the key ascending on ties, drops
/// groups that sold nothing and keeps at most `limit`.
pub fn rank_groups(
    mut groups: Vec<GroupTotals>,
    measure: SaleMeasure,
    limit: usize,
) -> Vec<GroupTotals> {
    groups.retain(|g| g.totals.quantity > 0);
    groups.sort_by(|a, b| compare_measure(a, b, measure).then(a.key.cmp(&b.key)));
    groups.truncate(limit);
    groups
        .into_iter()
        .map(|g| GroupTotals {
            key: g.key,
            totals: g.totals.normalized(),
        })
        .collect()
}

/// Orders grouped counts by count descending, then key, with the `None` bucket last.
pub fn order_group_counts(mut counts: Vec<GroupCount>) -> Vec<GroupCount> {
    counts.sort_by(|a, b| {
        b.count.cmp(&a.count).then_with(|| match (&a.key, &b.key) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
    });
    counts
}
