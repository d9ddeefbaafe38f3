//! Stock receipt routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{AppState, response::error_response};
use comptoir_db::repositories::stock::{CreateStockEntryInput, StockRepository};

/// Creates the stock routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/stock-entries", post(record_entry))
}

/// Request body for recording a stock receipt.
#[derive(Debug, Deserialize)]
pub struct CreateStockEntryRequest {
    /// Product received.
    pub product_id: i64,
    /// Receipt date; defaults to the current date.
    pub date: Option<NaiveDate>,
    /// Quantity received.
    pub quantity: i32,
}

/// POST `/stock-entries` - Record a stock receipt.
async fn record_entry(
    State(state): State<AppState>,
    Json(payload): Json<CreateStockEntryRequest>,
) -> impl IntoResponse {
    let repo = StockRepository::new((*state.db).clone());

    let input = CreateStockEntryInput {
        product_id: payload.product_id,
        date: payload
            .date
            .unwrap_or_else(|| chrono::Utc::now().date_naive()),
        quantity: payload.quantity,
    };

    match repo.record(input).await {
        Ok(entry) => {
            info!(
                entry_id = entry.id,
                product_id = entry.product_id,
                quantity = entry.quantity,
                "Stock entry recorded"
            );
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": entry.id,
                    "product_id": entry.product_id,
                    "date": entry.date.to_string(),
                    "quantity": entry.quantity,
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}
