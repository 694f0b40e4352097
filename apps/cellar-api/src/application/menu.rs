use super::{ApiError, ApiJson, ApiPath};
use crate::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use cellar_core::{
    CoreError,
    domain::{
        menu_view::NewMenuView,
        restaurant::Restaurant,
        wine::{Wine, WineFilter},
    },
};
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicMenu {
    pub restaurant: Restaurant,
    pub wines: Vec<Wine>,
}

// GET /api/menu/{restaurant_id}
// Public menu of an active restaurant. Each fetch is logged as a menu view.
pub async fn handle_public_menu(
    State(state): State<AppState>,
    ApiPath(restaurant_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let restaurant = state
        .restaurants
        .get(restaurant_id)
        .await?
        .filter(|r| r.is_active)
        .ok_or_else(|| CoreError::NotFound(format!("Restaurant {restaurant_id}")))?;

    let wines = state
        .wines
        .list(&WineFilter::for_menu(restaurant_id))
        .await?
        .into_iter()
        .map(|listing| listing.wine)
        .collect();

    state.menu_views.record(restaurant_id, Utc::now()).await?;
    debug!(restaurant_id, "Menu view recorded");

    Ok(Json(PublicMenu { restaurant, wines }))
}

// POST /api/menu-views
pub async fn handle_record_menu_view(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewMenuView>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .menu_views
        .record(payload.restaurant_id, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}
