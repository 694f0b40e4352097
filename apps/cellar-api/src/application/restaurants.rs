use super::{ApiError, ApiJson, ApiPath, Message};
use crate::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use cellar_core::{
    CoreError,
    domain::{
        restaurant::{NewRestaurant, Restaurant, RestaurantChanges, RestaurantCounts},
        wine::{Wine, WineFilter},
    },
};
use serde::Serialize;
use tracing::info;

/// Restaurant with its available wines and row counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDetail {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub wines: Vec<Wine>,
    #[serde(rename = "_count")]
    pub counts: RestaurantCounts,
}

// GET /api/restaurants
pub async fn handle_list_restaurants(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let restaurants = state.restaurants.list().await?;
    Ok(Json(restaurants))
}

// POST /api/restaurants
pub async fn handle_create_restaurant(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewRestaurant>,
) -> Result<impl IntoResponse, ApiError> {
    let restaurant = state
        .restaurants
        .create(payload.validate().map_err(CoreError::from)?)
        .await?;
    info!(restaurant_id = restaurant.id, "Restaurant created");
    Ok((StatusCode::CREATED, Json(restaurant)))
}

// GET /api/restaurants/{id}
pub async fn handle_get_restaurant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let restaurant = state
        .restaurants
        .get(id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Restaurant {id}")))?;
    let wines = state
        .wines
        .list(&WineFilter::for_menu(id))
        .await?
        .into_iter()
        .map(|listing| listing.wine)
        .collect();
    let counts = state.restaurants.counts(id).await?;
    Ok(Json(RestaurantDetail {
        restaurant,
        wines,
        counts,
    }))
}

// PUT /api/restaurants/{id}
pub async fn handle_update_restaurant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<RestaurantChanges>,
) -> Result<impl IntoResponse, ApiError> {
    let restaurant = state.restaurants.update(id, changes).await?;
    Ok(Json(restaurant))
}

// DELETE /api/restaurants/{id}
pub async fn handle_delete_restaurant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.restaurants.delete(id).await?;
    info!(restaurant_id = id, "Restaurant deleted");
    Ok(Message::new("Restaurant deleted successfully"))
}
