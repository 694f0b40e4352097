use super::{ApiError, ApiQuery};
use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use cellar_core::domain::sale::SaleFilter;

// GET /api/sales?restaurantId=&startDate=&endDate=
pub async fn handle_list_sales(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<SaleFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = state.sales.list(&filter).await?;
    Ok(Json(sales))
}
