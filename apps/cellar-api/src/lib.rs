use axum::{
    Json, Router,
    routing::{get, post},
};
use cellar_core::{
    AdminUserRepository, AggregateStore, MenuViewRepository, RestaurantRepository,
    SaleRepository, WineRepository, adapters::InMemoryStore, analytics::AnalyticsService,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

// Re-export or declare modules needed by public items
pub mod application;
pub mod config;
pub mod seed;

pub use application::{ApiError, map_core_error};
use application::{
    analytics::{handle_admin_overview, handle_dashboard},
    commands::record_sale::handle_record_sale_request,
    menu::{handle_public_menu, handle_record_menu_view},
    restaurants::{
        handle_create_restaurant, handle_delete_restaurant, handle_get_restaurant,
        handle_list_restaurants, handle_update_restaurant,
    },
    sales::handle_list_sales,
    wines::{
        handle_create_wine, handle_delete_wine, handle_get_wine, handle_list_wines,
        handle_update_wine,
    },
};

// Holds shared dependencies
#[derive(Clone)]
pub struct AppState {
    pub restaurants: Arc<dyn RestaurantRepository>,
    pub wines: Arc<dyn WineRepository>,
    pub sales: Arc<dyn SaleRepository>,
    pub menu_views: Arc<dyn MenuViewRepository>,
    pub admin_users: Arc<dyn AdminUserRepository>,
    pub analytics: AnalyticsService,
}

impl AppState {
    /// Wires every port to one store implementing all of them.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: RestaurantRepository
            + WineRepository
            + SaleRepository
            + MenuViewRepository
            + AdminUserRepository
            + AggregateStore
            + 'static,
    {
        Self {
            restaurants: store.clone(),
            wines: store.clone(),
            sales: store.clone(),
            menu_views: store.clone(),
            admin_users: store.clone(),
            analytics: AnalyticsService::new(store.clone(), store.clone(), store),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()))
    }
}

// Function to create the main Axum router with state
pub fn create_app(app_state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/restaurants",
            get(handle_list_restaurants).post(handle_create_restaurant),
        )
        .route(
            "/restaurants/{id}",
            get(handle_get_restaurant)
                .put(handle_update_restaurant)
                .delete(handle_delete_restaurant),
        )
        .route("/wines", get(handle_list_wines).post(handle_create_wine))
        .route(
            "/wines/{id}",
            get(handle_get_wine)
                .put(handle_update_wine)
                .delete(handle_delete_wine),
        )
        .route(
            "/sales",
            get(handle_list_sales).post(handle_record_sale_request),
        )
        .route("/menu/{restaurant_id}", get(handle_public_menu))
        .route("/menu-views", post(handle_record_menu_view))
        .route("/analytics/dashboard", get(handle_dashboard))
        .route("/analytics/admin", get(handle_admin_overview));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
