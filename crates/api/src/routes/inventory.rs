//! Inventory report routes.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use crate::{AppState, export, response::error_response};
use comptoir_db::repositories::inventory::{InventoryReport, InventoryRepository};

/// Creates the inventory routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(inventory_report))
        .route("/inventory/export.csv", get(export_inventory))
}

fn report_json(report: &InventoryReport) -> serde_json::Value {
    let rows: Vec<_> = report
        .rows
        .iter()
        .map(|row| {
            json!({
                "product_id": row.product_id,
                "reference": row.reference,
                "name": row.name,
                "quantity_received": row.quantity_received,
                "purchase_price": row.purchase_price.to_string(),
                "total_purchase": row.total_purchase.to_string(),
                "standard_price": row.standard_price.to_string(),
                "quantity_sold": row.quantity_sold,
                "total_sales": row.total_sales.to_string(),
                "stock": row.quantity_available,
            })
        })
        .collect();

    json!({
        "rows": rows,
        "total_purchase": report.total_purchase.to_string(),
        "total_sales": report.total_sales.to_string(),
        "total_profit": report.total_profit.to_string(),
    })
}

/// GET `/inventory` - Per-product quantities, valuations, and profit.
async fn inventory_report(State(state): State<AppState>) -> impl IntoResponse {
    let repo = InventoryRepository::new((*state.db).clone());

    match repo.report().await {
        Ok(report) => (StatusCode::OK, Json(report_json(&report))).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET `/inventory/export.csv` - Download the inventory report as CSV.
async fn export_inventory(State(state): State<AppState>) -> impl IntoResponse {
    let repo = InventoryRepository::new((*state.db).clone());

    match repo.report().await {
        Ok(report) => match export::inventory_csv(&report) {
            Ok(csv) => (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"inventory.csv\"",
                    ),
                ],
                csv,
            )
                .into_response(),
            Err(e) => error_response(e),
        },
        Err(e) => error_response(e),
    }
}
