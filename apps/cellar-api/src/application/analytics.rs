use super::{ApiError, ApiQuery};
use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use cellar_core::domain::deserialize_optional_id;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub restaurant_id: Option<i64>,
    /// Pins the month window; defaults to now.
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewQuery {
    pub as_of: Option<DateTime<Utc>>,
}

// GET /api/analytics/dashboard?restaurantId=&asOf=
pub async fn handle_dashboard(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let restaurant_id = query
        .restaurant_id
        .ok_or_else(|| ApiError::BadRequest("Restaurant ID is required".into()))?;
    let as_of = query.as_of.unwrap_or_else(Utc::now);
    let dashboard = state.analytics.dashboard(restaurant_id, as_of).await?;
    Ok(Json(dashboard))
}

// GET /api/analytics/admin?asOf=
pub async fn handle_admin_overview(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OverviewQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let as_of = query.as_of.unwrap_or_else(Utc::now);
    let overview = state.analytics.admin_overview(as_of).await?;
    Ok(Json(overview))
}
