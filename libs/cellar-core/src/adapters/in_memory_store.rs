use crate::{
    AdminUserRepository, AggregateStore, CoreError, MenuViewRepository, RestaurantRepository,
    SaleRepository, WineRepository,
    analytics::query::{
        Breakdown, GroupCount, GroupTotals, SaleGroup, SaleScope, SaleTotals, Tally,
    },
    domain::{
        admin_user::{AdminUser, NewAdminUser},
        menu_view::MenuView,
        restaurant::{
            NewRestaurant, Restaurant, RestaurantChanges, RestaurantCounts, RestaurantRef,
            RestaurantSummary,
        },
        sale::{Sale, SaleDraft, SaleFilter, SaleListing},
        wine::{NewWine, Wine, WineChanges, WineDetail, WineFilter, WineListing, WineRef},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};
use tracing::debug;

#[derive(Debug, Default)]
struct IdSequence(AtomicI64);

impl IdSequence {
    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// In-memory implementation of every storage port, for tests and single-process runs.
///
/// Maps are locked in a fixed order (restaurants, wines, sales, menu views) and no
/// guard is held across an `.await`, so compound writes stay atomic without deadlocks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    restaurants: Arc<DashMap<i64, Restaurant>>,
    // Lower-cased email -> restaurant id, for uniqueness
    restaurant_emails: Arc<DashMap<String, i64>>,
    wines: Arc<DashMap<i64, Wine>>,
    sales: Arc<DashMap<i64, Sale>>,
    menu_views: Arc<DashMap<i64, MenuView>>,
    admin_users: Arc<DashMap<String, AdminUser>>,
    restaurant_ids: Arc<IdSequence>,
    wine_ids: Arc<IdSequence>,
    sale_ids: Arc<IdSequence>,
    menu_view_ids: Arc<IdSequence>,
    admin_user_ids: Arc<IdSequence>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn restaurant_ref(&self, id: i64) -> Option<RestaurantRef> {
        self.restaurants.get(&id).map(|r| RestaurantRef::from(r.value()))
    }

    fn wine_has_sales(&self, wine_id: i64) -> bool {
        self.sales.iter().any(|s| s.wine_id == wine_id)
    }
}

fn restaurant_not_found(id: i64) -> CoreError {
    CoreError::NotFound(format!("Restaurant {id}"))
}

fn wine_not_found(id: i64) -> CoreError {
    CoreError::NotFound(format!("Wine {id}"))
}

#[async_trait]
impl RestaurantRepository for InMemoryStore {
    async fn create(&self, restaurant: NewRestaurant) -> Result<Restaurant, CoreError> {
        let restaurant = restaurant.validate()?;
        match self.restaurant_emails.entry(restaurant.email.clone()) {
            Entry::Occupied(_) => Err(CoreError::AlreadyExists(format!(
                "Restaurant with email '{}'",
                restaurant.email
            ))),
            Entry::Vacant(slot) => {
                let id = self.restaurant_ids.next();
                let now = Utc::now();
                let stored = Restaurant {
                    id,
                    name: restaurant.name,
                    email: restaurant.email,
                    business_type: restaurant.business_type,
                    address: restaurant.address,
                    phone: restaurant.phone,
                    plan: restaurant.plan,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(id);
                self.restaurants.insert(id, stored.clone());
                debug!(restaurant_id = id, "Restaurant created");
                Ok(stored)
            }
        }
    }

    async fn get(&self, id: i64) -> Result<Option<Restaurant>, CoreError> {
        Ok(self.restaurants.get(&id).map(|r| r.value().clone()))
    }

    async fn list(&self) -> Result<Vec<RestaurantSummary>, CoreError> {
        let mut wine_counts: HashMap<i64, i64> = HashMap::new();
        for wine in self.wines.iter() {
            *wine_counts.entry(wine.restaurant_id).or_default() += 1;
        }
        let mut sale_counts: HashMap<i64, i64> = HashMap::new();
        for sale in self.sales.iter() {
            *sale_counts.entry(sale.restaurant_id).or_default() += 1;
        }

        let mut summaries: Vec<RestaurantSummary> = self
            .restaurants
            .iter()
            .map(|r| RestaurantSummary {
                wine_count: wine_counts.get(r.key()).copied().unwrap_or(0),
                sale_count: sale_counts.get(r.key()).copied().unwrap_or(0),
                restaurant: r.value().clone(),
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.restaurant
                .created_at
                .cmp(&a.restaurant.created_at)
                .then(b.restaurant.id.cmp(&a.restaurant.id))
        });
        Ok(summaries)
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<Restaurant>, CoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.restaurants.get(id).map(|r| r.value().clone()))
            .collect())
    }

    async fn counts(&self, id: i64) -> Result<RestaurantCounts, CoreError> {
        if !self.restaurants.contains_key(&id) {
            return Err(restaurant_not_found(id));
        }
        let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        Ok(RestaurantCounts {
            wines: count(self.wines.iter().filter(|w| w.restaurant_id == id).count()),
            sales: count(self.sales.iter().filter(|s| s.restaurant_id == id).count()),
            menu_views: count(
                self.menu_views
                    .iter()
                    .filter(|v| v.restaurant_id == id)
                    .count(),
            ),
        })
    }

    async fn update(&self, id: i64, changes: RestaurantChanges) -> Result<Restaurant, CoreError> {
        let changes = changes.validate()?;
        let mut entry = self
            .restaurants
            .get_mut(&id)
            .ok_or_else(|| restaurant_not_found(id))?;
        changes.apply_to(entry.value_mut(), Utc::now());
        Ok(entry.value().clone())
    }

    async fn delete(&self, id: i64) -> Result<(), CoreError> {
        let (_, removed) = self
            .restaurants
            .remove(&id)
            .ok_or_else(|| restaurant_not_found(id))?;
        self.restaurant_emails.remove(&removed.email);
        self.wines.retain(|_, w| w.restaurant_id != id);
        self.sales.retain(|_, s| s.restaurant_id != id);
        self.menu_views.retain(|_, v| v.restaurant_id != id);
        debug!(restaurant_id = id, "Restaurant deleted with dependents");
        Ok(())
    }
}

#[async_trait]
impl WineRepository for InMemoryStore {
    async fn create(&self, wine: NewWine) -> Result<Wine, CoreError> {
        let wine = wine.validate()?;
        // Holding the restaurant guard keeps a concurrent delete from orphaning the wine.
        let owner = self
            .restaurants
            .get(&wine.restaurant_id)
            .ok_or_else(|| restaurant_not_found(wine.restaurant_id))?;
        let id = self.wine_ids.next();
        let stored = wine.into_wine(id, Utc::now());
        self.wines.insert(id, stored.clone());
        drop(owner);
        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Option<Wine>, CoreError> {
        Ok(self.wines.get(&id).map(|w| w.value().clone()))
    }

    async fn get_detail(&self, id: i64) -> Result<Option<WineDetail>, CoreError> {
        let Some(wine) = WineRepository::get(self, id).await? else {
            return Ok(None);
        };
        let restaurant = self
            .restaurants
            .get(&wine.restaurant_id)
            .map(|r| r.value().into());
        Ok(restaurant.map(|restaurant| WineDetail { wine, restaurant }))
    }

    async fn list(&self, filter: &WineFilter) -> Result<Vec<WineListing>, CoreError> {
        let filter = filter.clone().normalized();
        let mut matching: Vec<Wine> = self
            .wines
            .iter()
            .filter(|w| filter.matches(w.value()))
            .map(|w| w.value().clone())
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(matching
            .into_iter()
            .filter_map(|wine| {
                self.restaurant_ref(wine.restaurant_id)
                    .map(|restaurant| WineListing { wine, restaurant })
            })
            .collect())
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<Wine>, CoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.wines.get(id).map(|w| w.value().clone()))
            .collect())
    }

    async fn update(&self, id: i64, changes: WineChanges) -> Result<Wine, CoreError> {
        let changes = changes.validate()?;
        let mut entry = self.wines.get_mut(&id).ok_or_else(|| wine_not_found(id))?;
        changes.apply_to(entry.value_mut(), Utc::now());
        Ok(entry.value().clone())
    }

    async fn delete(&self, id: i64) -> Result<(), CoreError> {
        // The sales check runs under the wine's shard lock, so no sale can slip in between.
        if self
            .wines
            .remove_if(&id, |_, _| !self.wine_has_sales(id))
            .is_some()
        {
            return Ok(());
        }
        if self.wines.contains_key(&id) {
            Err(crate::domain::wine::WineError::HasSales(id).into())
        } else {
            Err(wine_not_found(id))
        }
    }
}

#[async_trait]
impl SaleRepository for InMemoryStore {
    async fn record(&self, draft: SaleDraft) -> Result<Sale, CoreError> {
        let mut wine = self
            .wines
            .get_mut(&draft.wine_id)
            .ok_or_else(|| wine_not_found(draft.wine_id))?;
        if wine.restaurant_id != draft.restaurant_id {
            return Err(CoreError::Validation(format!(
                "Wine {} does not belong to restaurant {}",
                draft.wine_id, draft.restaurant_id
            )));
        }
        if wine.stock_quantity < draft.quantity {
            return Err(CoreError::InsufficientStock {
                wine_id: draft.wine_id,
                requested: draft.quantity,
                available: wine.stock_quantity,
            });
        }
        wine.stock_quantity -= draft.quantity;
        wine.updated_at = Utc::now();

        let sale = draft.into_sale(self.sale_ids.next());
        self.sales.insert(sale.id, sale.clone());
        drop(wine);
        Ok(sale)
    }

    async fn list(&self, filter: &SaleFilter) -> Result<Vec<SaleListing>, CoreError> {
        let mut matching: Vec<Sale> = self
            .sales
            .iter()
            .filter(|s| filter.matches(s.value()))
            .map(|s| s.value().clone())
            .collect();
        matching.sort_by(|a, b| b.sale_date.cmp(&a.sale_date).then(b.id.cmp(&a.id)));

        Ok(matching
            .into_iter()
            .filter_map(|sale| {
                let wine = self.wines.get(&sale.wine_id).map(|w| WineRef::from(w.value()))?;
                let restaurant = self.restaurant_ref(sale.restaurant_id)?;
                Some(SaleListing {
                    sale,
                    wine,
                    restaurant,
                })
            })
            .collect())
    }
}

#[async_trait]
impl MenuViewRepository for InMemoryStore {
    async fn record(
        &self,
        restaurant_id: i64,
        viewed_at: DateTime<Utc>,
    ) -> Result<MenuView, CoreError> {
        let owner = self
            .restaurants
            .get(&restaurant_id)
            .ok_or_else(|| restaurant_not_found(restaurant_id))?;
        let view = MenuView {
            id: self.menu_view_ids.next(),
            restaurant_id,
            view_date: viewed_at,
        };
        self.menu_views.insert(view.id, view.clone());
        drop(owner);
        Ok(view)
    }
}

#[async_trait]
impl AdminUserRepository for InMemoryStore {
    async fn create(&self, admin: NewAdminUser) -> Result<AdminUser, CoreError> {
        let admin = admin.validate()?;
        match self.admin_users.entry(admin.email.clone()) {
            Entry::Occupied(_) => Err(CoreError::AlreadyExists(format!(
                "Admin user '{}'",
                admin.email
            ))),
            Entry::Vacant(slot) => {
                let stored = admin.into_admin_user(self.admin_user_ids.next());
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>, CoreError> {
        Ok(self
            .admin_users
            .get(&email.trim().to_ascii_lowercase())
            .map(|a| a.value().clone()))
    }
}

#[async_trait]
impl AggregateStore for InMemoryStore {
    async fn sum(&self, scope: &SaleScope) -> Result<SaleTotals, CoreError> {
        let mut totals = SaleTotals::default();
        for sale in self.sales.iter().filter(|s| scope.matches(s.value())) {
            totals.add(sale.value());
        }
        Ok(totals.normalized())
    }

    async fn sum_by_group(
        &self,
        scope: &SaleScope,
        group: SaleGroup,
    ) -> Result<Vec<GroupTotals>, CoreError> {
        let mut groups: HashMap<i64, SaleTotals> = HashMap::new();
        for sale in self.sales.iter().filter(|s| scope.matches(s.value())) {
            groups
                .entry(group.key_of(sale.value()))
                .or_default()
                .add(sale.value());
        }
        Ok(groups
            .into_iter()
            .map(|(key, totals)| GroupTotals {
                key,
                totals: totals.normalized(),
            })
            .collect())
    }

    async fn count(&self, tally: &Tally) -> Result<i64, CoreError> {
        let n = match *tally {
            Tally::Wines {
                restaurant_id,
                available_only,
            } => self
                .wines
                .iter()
                .filter(|w| restaurant_id.is_none_or(|id| id == w.restaurant_id))
                .filter(|w| !available_only || w.is_available)
                .count(),
            Tally::Restaurants {
                active_only,
                created_since,
            } => self
                .restaurants
                .iter()
                .filter(|r| !active_only || r.is_active)
                .filter(|r| created_since.is_none_or(|since| r.created_at >= since))
                .count(),
            Tally::MenuViews {
                restaurant_id,
                since,
            } => self
                .menu_views
                .iter()
                .filter(|v| restaurant_id.is_none_or(|id| id == v.restaurant_id))
                .filter(|v| since.is_none_or(|since| v.view_date >= since))
                .count(),
        };
        i64::try_from(n).map_err(|e| CoreError::Internal(e.to_string()))
    }

    async fn count_by_group(&self, breakdown: &Breakdown) -> Result<Vec<GroupCount>, CoreError> {
        let mut counts: HashMap<Option<String>, i64> = HashMap::new();
        match *breakdown {
            Breakdown::RestaurantsByPlan => {
                for r in self.restaurants.iter() {
                    *counts
                        .entry(r.plan.map(|p| p.as_str().to_string()))
                        .or_default() += 1;
                }
            }
            Breakdown::WinesByType { restaurant_id } => {
                for w in self.wines.iter().filter(|w| w.restaurant_id == restaurant_id) {
                    *counts.entry(Some(w.wine_type.clone())).or_default() += 1;
                }
            }
        }
        Ok(counts
            .into_iter()
            .map(|(key, count)| GroupCount { key, count })
            .collect())
    }
}
