use super::{ApiError, ApiJson, ApiPath, ApiQuery, Message};
use crate::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use cellar_core::{
    CoreError,
    domain::wine::{NewWine, WineChanges, WineFilter},
};
use tracing::info;

// GET /api/wines?restaurantId=&type=&region=&search=
pub async fn handle_list_wines(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<WineFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let wines = state.wines.list(&filter.normalized()).await?;
    Ok(Json(wines))
}

// POST /api/wines
pub async fn handle_create_wine(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewWine>,
) -> Result<impl IntoResponse, ApiError> {
    let wine = state
        .wines
        .create(payload.validate().map_err(CoreError::from)?)
        .await?;
    info!(
        wine_id = wine.id,
        restaurant_id = wine.restaurant_id,
        "Wine created"
    );
    Ok((StatusCode::CREATED, Json(wine)))
}

// GET /api/wines/{id}
pub async fn handle_get_wine(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let wine = state
        .wines
        .get_detail(id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Wine {id}")))?;
    Ok(Json(wine))
}

// PUT /api/wines/{id}
pub async fn handle_update_wine(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<WineChanges>,
) -> Result<impl IntoResponse, ApiError> {
    let wine = state.wines.update(id, changes).await?;
    Ok(Json(wine))
}

// DELETE /api/wines/{id}
pub async fn handle_delete_wine(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.wines.delete(id).await?;
    info!(wine_id = id, "Wine deleted");
    Ok(Message::new("Wine deleted successfully"))
}
