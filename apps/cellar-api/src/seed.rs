//! Demo data for local runs: five restaurants, a small wine list, a week of sales,
//! a few menu views and one platform admin.

use crate::{AppState, application::commands::RecordSaleHandler};
use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use cellar_core::{
    CommandHandler, CoreError,
    domain::{
        admin_user::NewAdminUser,
        restaurant::{NewRestaurant, Plan, Restaurant, RestaurantChanges},
        sale::RecordSale,
        wine::{NewWine, Wine},
    },
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::info;

pub const DEMO_ADMIN_EMAIL: &str = "admin@headofwine.com";
pub const DEMO_PASSWORD: &str = "password";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub restaurants: usize,
    pub wines: usize,
    pub sales: usize,
    pub menu_views: usize,
}

struct DemoWine {
    name: &'static str,
    wine_type: &'static str,
    region: &'static str,
    vintage: Option<i32>,
    grape_variety: &'static str,
    price: i64,
    description: &'static str,
    alcohol_tenths: i64,
    stock: i32,
    available: bool,
}

impl DemoWine {
    fn into_new_wine(self, restaurant_id: i64) -> NewWine {
        NewWine {
            restaurant_id,
            name: self.name.into(),
            wine_type: self.wine_type.into(),
            region: Some(self.region.into()),
            vintage: self.vintage,
            grape_variety: Some(self.grape_variety.into()),
            price: Decimal::from(self.price),
            description: Some(self.description.into()),
            alcohol_content: Some(Decimal::new(self.alcohol_tenths, 1)),
            stock_quantity: self.stock,
            image_url: None,
            is_available: self.available,
        }
    }
}

fn hash_password(password: &str) -> Result<String, CoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CoreError::Internal(format!("Failed to hash demo password: {e}")))
}

fn restaurant(
    name: &str,
    email: &str,
    business_type: &str,
    address: &str,
    phone: &str,
    plan: Plan,
) -> NewRestaurant {
    NewRestaurant {
        name: name.into(),
        email: email.into(),
        business_type: Some(business_type.into()),
        address: Some(address.into()),
        phone: Some(phone.into()),
        plan: Some(plan),
    }
}

/// Loads the demo data set. Does nothing when the demo admin already exists.
pub async fn seed_demo(state: &AppState) -> Result<SeedReport, CoreError> {
    if state
        .admin_users
        .find_by_email(DEMO_ADMIN_EMAIL)
        .await?
        .is_some()
    {
        info!("Demo data already present, skipping seed");
        return Ok(SeedReport::default());
    }
    info!("Seeding demo data...");
    let mut report = SeedReport::default();

    let mut created: Vec<Restaurant> = Vec::new();
    for new in [
        restaurant(
            "Bella Vista Restaurant",
            "restaurant@demo.com",
            "restaurant",
            "123 Main Street, Downtown",
            "(555) 123-4567",
            Plan::Professional,
        ),
        restaurant(
            "The Wine Cellar",
            "winecellar@demo.com",
            "wine-bar",
            "456 Oak Avenue, Midtown",
            "(555) 234-5678",
            Plan::Starter,
        ),
        restaurant(
            "Château Bistro",
            "chateau@demo.com",
            "restaurant",
            "789 Pine Street, Uptown",
            "(555) 345-6789",
            Plan::Professional,
        ),
        restaurant(
            "Urban Wine Bar",
            "urban@demo.com",
            "bar",
            "321 Elm Street, Downtown",
            "(555) 456-7890",
            Plan::Enterprise,
        ),
        restaurant(
            "Vintage Lounge",
            "vintage@demo.com",
            "bar",
            "654 Maple Avenue, Suburbs",
            "(555) 567-8901",
            Plan::Starter,
        ),
    ] {
        created.push(state.restaurants.create(new).await?);
    }
    report.restaurants = created.len();

    let [bella, cellar, bistro, urban, lounge] = created.as_slice() else {
        return Err(CoreError::Internal("Unexpected demo restaurant count".into()));
    };
    state
        .restaurants
        .update(
            lounge.id,
            RestaurantChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await?;

    let bella_wines = [
        DemoWine {
            name: "Château Margaux 2015",
            wine_type: "Red Wine",
            region: "Bordeaux, France",
            vintage: Some(2015),
            grape_variety: "Cabernet Sauvignon, Merlot",
            price: 450,
            description: "A legendary Bordeaux with notes of blackcurrant, violet and subtle oak.",
            alcohol_tenths: 135,
            stock: 14,
            available: true,
        },
        DemoWine {
            name: "Dom Pérignon 2012",
            wine_type: "Champagne",
            region: "Champagne, France",
            vintage: Some(2012),
            grape_variety: "Chardonnay, Pinot Noir",
            price: 280,
            description: "Crisp and refined with notes of citrus, brioche and minerals.",
            alcohol_tenths: 125,
            stock: 9,
            available: true,
        },
        DemoWine {
            name: "Sancerre Loire Valley",
            wine_type: "White Wine",
            region: "Loire Valley, France",
            vintage: Some(2021),
            grape_variety: "Sauvignon Blanc",
            price: 65,
            description: "Mineral Sauvignon Blanc with gooseberry, citrus and a flinty finish.",
            alcohol_tenths: 128,
            stock: 29,
            available: true,
        },
        DemoWine {
            name: "Barolo Brunate 2018",
            wine_type: "Red Wine",
            region: "Piedmont, Italy",
            vintage: Some(2018),
            grape_variety: "Nebbiolo",
            price: 120,
            description: "Powerful Nebbiolo with aromas of rose, tar and red fruits.",
            alcohol_tenths: 142,
            stock: 1,
            available: false,
        },
    ];
    let mut sold: Vec<Wine> = Vec::new();
    for demo in bella_wines {
        sold.push(state.wines.create(demo.into_new_wine(bella.id)).await?);
    }
    report.wines += sold.len();

    let other_wines = [
        (
            cellar.id,
            DemoWine {
                name: "Caymus Cabernet Sauvignon",
                wine_type: "Red Wine",
                region: "Napa Valley, USA",
                vintage: Some(2020),
                grape_variety: "Cabernet Sauvignon",
                price: 85,
                description: "Rich and full-bodied with dark fruit and smooth tannins.",
                alcohol_tenths: 145,
                stock: 18,
                available: true,
            },
        ),
        (
            cellar.id,
            DemoWine {
                name: "Whispering Angel Rosé",
                wine_type: "Rosé",
                region: "Provence, France",
                vintage: Some(2022),
                grape_variety: "Grenache, Cinsault",
                price: 25,
                description: "Pale pink with fresh strawberry and citrus notes.",
                alcohol_tenths: 130,
                stock: 30,
                available: true,
            },
        ),
        (
            bistro.id,
            DemoWine {
                name: "Opus One 2018",
                wine_type: "Red Wine",
                region: "Napa Valley, USA",
                vintage: Some(2018),
                grape_variety: "Cabernet Sauvignon, Merlot",
                price: 380,
                description: "A Bordeaux-style blend from a celebrated Napa estate.",
                alcohol_tenths: 145,
                stock: 8,
                available: true,
            },
        ),
        (
            urban.id,
            DemoWine {
                name: "Krug Grande Cuvée",
                wine_type: "Champagne",
                region: "Champagne, France",
                vintage: None,
                grape_variety: "Chardonnay, Pinot Noir, Pinot Meunier",
                price: 180,
                description: "A multi-vintage champagne of great complexity and depth.",
                alcohol_tenths: 120,
                stock: 15,
                available: true,
            },
        ),
    ];
    for (restaurant_id, demo) in other_wines {
        state.wines.create(demo.into_new_wine(restaurant_id)).await?;
        report.wines += 1;
    }

    // Through the command handler so stock is decremented.
    let now = Utc::now();
    let handler = RecordSaleHandler::new(state.wines.clone(), state.sales.clone());
    let sales = [
        (&sold[0], 2, 5),
        (&sold[1], 3, 3),
        (&sold[2], 5, 2),
        (&sold[3], 1, 7),
    ];
    for (wine, quantity, days_ago) in sales {
        handler
            .handle(RecordSale {
                restaurant_id: bella.id,
                wine_id: wine.id,
                quantity,
                unit_price: None,
                sale_date: Some(now - Duration::days(days_ago)),
            })
            .await?;
        report.sales += 1;
    }

    for (restaurant_id, hours_ago) in [(bella.id, 1), (bella.id, 2), (cellar.id, 1)] {
        state
            .menu_views
            .record(restaurant_id, now - Duration::hours(hours_ago))
            .await?;
        report.menu_views += 1;
    }

    state
        .admin_users
        .create(NewAdminUser::new(
            DEMO_ADMIN_EMAIL,
            hash_password(DEMO_PASSWORD)?,
        ))
        .await?;

    info!(
        restaurants = report.restaurants,
        wines = report.wines,
        sales = report.sales,
        menu_views = report.menu_views,
        "Seed completed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};
    use cellar_core::domain::wine::WineFilter;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let state = AppState::in_memory();
        let first = seed_demo(&state).await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                restaurants: 5,
                wines: 8,
                sales: 4,
                menu_views: 3
            }
        );
        let second = seed_demo(&state).await.unwrap();
        assert_eq!(second, SeedReport::default());
        assert_eq!(state.restaurants.list().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_seed_sales_decrement_stock() {
        let state = AppState::in_memory();
        seed_demo(&state).await.unwrap();

        let wines = state.wines.list(&WineFilter::default()).await.unwrap();
        let margaux = wines
            .iter()
            .find(|l| l.wine.name == "Château Margaux 2015")
            .unwrap();
        assert_eq!(margaux.wine.stock_quantity, 12);
        let barolo = wines
            .iter()
            .find(|l| l.wine.name == "Barolo Brunate 2018")
            .unwrap();
        assert_eq!(barolo.wine.stock_quantity, 0);
    }

    #[tokio::test]
    async fn test_seed_admin_password_verifies() {
        let state = AppState::in_memory();
        seed_demo(&state).await.unwrap();

        let admin = state
            .admin_users
            .find_by_email(DEMO_ADMIN_EMAIL)
            .await
            .unwrap()
            .unwrap();
        let parsed = PasswordHash::new(&admin.password_hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(DEMO_PASSWORD.as_bytes(), &parsed)
                .is_ok()
        );
    }
}
