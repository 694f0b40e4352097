use crate::{
    AppState,
    application::{ApiError, ApiJson},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use cellar_core::{
    CommandHandler, CoreError, SaleRepository, WineRepository,
    domain::sale::{RecordSale, Sale},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Prices a sale against the wine's current record and persists it with the stock decrement.
pub struct RecordSaleHandler {
    wines: Arc<dyn WineRepository>,
    sales: Arc<dyn SaleRepository>,
}

impl RecordSaleHandler {
    pub fn new(wines: Arc<dyn WineRepository>, sales: Arc<dyn SaleRepository>) -> Self {
        Self { wines, sales }
    }
}

impl CommandHandler<RecordSale> for RecordSaleHandler {
    type Output = Sale;

    async fn handle(&self, command: RecordSale) -> Result<Sale, CoreError> {
        // 1. Reject malformed input before touching the store
        command.validate()?;

        // 2. Load the wine being sold
        let wine = self
            .wines
            .get(command.wine_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Wine {}", command.wine_id)))?;

        // 3. Price it (ownership check, default unit price, total)
        let draft = command.price_against(&wine, Utc::now())?;

        // 4. Insert and decrement stock atomically; the store re-checks stock under its lock
        match self.sales.record(draft).await {
            Ok(sale) => Ok(sale),
            Err(err @ CoreError::InsufficientStock { .. }) => {
                warn!(wine_id = wine.id, "Sale rejected: {}", err);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

// --- Axum Route Handler ---

// POST /api/sales
pub async fn handle_record_sale_request(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<RecordSale>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = RecordSaleHandler::new(state.wines.clone(), state.sales.clone());
    let sale = handler.handle(command).await?;
    info!(
        sale_id = sale.id,
        wine_id = sale.wine_id,
        quantity = sale.quantity,
        "Sale recorded"
    );
    Ok((StatusCode::CREATED, Json(sale)))
}
