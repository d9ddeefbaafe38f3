//! Invoice management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{AppState, middleware::AuthAdmin, response::error_response};
use comptoir_core::billing::InvoiceTotals;
use comptoir_db::repositories::invoice::{
    AddLineInput, AddReturnInput, CreateInvoiceInput, InvoiceDetail, InvoiceError,
    InvoiceRepository, InvoiceStanding, UpdateInvoiceInput,
};

/// Creates the invoice routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices))
        .route("/invoices", post(create_invoice))
        .route("/invoices/{invoice_id}", get(get_invoice))
        .route("/invoices/{invoice_id}", put(update_invoice))
        .route("/invoices/{invoice_id}", delete(delete_invoice))
        .route("/invoices/{invoice_id}/finalize", post(finalize_invoice))
        .route(
            "/invoices/{invoice_id}/toggle-finalized",
            post(toggle_finalized),
        )
        .route("/invoices/{invoice_id}/lines", post(add_line))
        .route("/invoices/{invoice_id}/returns", post(add_return))
        .route("/invoices/{invoice_id}/receipt", get(invoice_receipt))
}

/// Request body for creating an invoice.
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Invoice number (globally unique).
    pub number: String,
    /// Sale date; defaults to the current date.
    pub sale_date: Option<NaiveDate>,
    /// Invoiced client.
    pub client_id: i64,
    /// Number of packages shipped.
    pub package_count: Option<i32>,
}

/// Request body for updating an invoice; absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceRequest {
    /// Invoice number.
    pub number: Option<String>,
    /// Sale date.
    pub sale_date: Option<NaiveDate>,
    /// Invoiced client.
    pub client_id: Option<i64>,
    /// Number of packages shipped.
    pub package_count: Option<i32>,
}

/// Request body for adding a line item.
#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    /// Product sold.
    pub product_id: i64,
    /// Unit sale price.
    pub unit_price: Decimal,
    /// Quantity sold.
    pub quantity: i32,
}

/// Request body for recording a return.
#[derive(Debug, Deserialize)]
pub struct AddReturnRequest {
    /// Product returned.
    pub product_id: i64,
    /// Unit price credited.
    pub unit_price: Decimal,
    /// Quantity returned.
    pub quantity: i32,
    /// Return date; defaults to the current date.
    pub date: Option<NaiveDate>,
}

fn totals_json(totals: &InvoiceTotals) -> Value {
    json!({
        "total_ht": totals.total_ht.to_string(),
        "total_tva": totals.total_tva.to_string(),
        "total_ttc": totals.total_ttc.to_string(),
    })
}

fn standing_json(standing: &InvoiceStanding) -> Value {
    json!({
        "id": standing.invoice.id,
        "number": standing.invoice.number,
        "sale_date": standing.invoice.sale_date.to_string(),
        "client_id": standing.invoice.client_id,
        "package_count": standing.invoice.package_count,
        "finalized": standing.invoice.finalized,
        "totals": totals_json(&standing.totals),
        "paid": standing.applied.to_string(),
        "remaining": standing.remaining.to_string(),
    })
}

fn detail_json(detail: &InvoiceDetail) -> Value {
    let lines: Vec<_> = detail
        .lines
        .iter()
        .map(|l| {
            json!({
                "id": l.id,
                "product_id": l.product_id,
                "product_reference": l.product_reference,
                "product_name": l.product_name,
                "unit_price": l.unit_price.to_string(),
                "quantity": l.quantity,
                "total": l.total().to_string(),
            })
        })
        .collect();

    let returns: Vec<_> = detail
        .returns
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "product_id": r.product_id,
                "product_reference": r.product_reference,
                "product_name": r.product_name,
                "unit_price": r.unit_price.to_string(),
                "quantity": r.quantity,
                "date": r.date.to_string(),
                "total": r.total().to_string(),
            })
        })
        .collect();

    json!({
        "id": detail.invoice.id,
        "number": detail.invoice.number,
        "sale_date": detail.invoice.sale_date.to_string(),
        "package_count": detail.invoice.package_count,
        "finalized": detail.invoice.finalized,
        "client": {
            "id": detail.client.id,
            "name": detail.client.name,
            "phone": detail.client.phone,
            "address": detail.client.address,
            "city": detail.client.city,
        },
        "lines": lines,
        "returns": returns,
        "totals": totals_json(&detail.totals),
        "paid": detail.applied.to_string(),
        "remaining": detail.remaining.to_string(),
    })
}

/// GET `/invoices` - List invoices, newest first, with their standings.
async fn list_invoices(State(state): State<AppState>) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    match repo.list_with_standing(state.tax_rate).await {
        Ok(standings) => {
            let invoices: Vec<_> = standings.iter().map(standing_json).collect();
            (StatusCode::OK, Json(json!({ "invoices": invoices }))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST `/invoices` - Create a draft invoice.
async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    let input = CreateInvoiceInput {
        number: payload.number.trim().to_string(),
        sale_date: payload
            .sale_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive()),
        client_id: payload.client_id,
        package_count: payload.package_count.unwrap_or(0),
    };

    match repo.create(input).await {
        Ok(invoice) => {
            info!(invoice_id = invoice.id, number = %invoice.number, "Invoice created");
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": invoice.id,
                    "number": invoice.number,
                    "sale_date": invoice.sale_date.to_string(),
                    "client_id": invoice.client_id,
                    "package_count": invoice.package_count,
                    "finalized": invoice.finalized,
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET `/invoices/{invoice_id}` - Fetch one invoice with lines, returns, and totals.
async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    match repo.find_detail(invoice_id, state.tax_rate).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(detail_json(&detail))).into_response(),
        Ok(None) => error_response(InvoiceError::NotFound(invoice_id)),
        Err(e) => error_response(e),
    }
}

/// PUT `/invoices/{invoice_id}` - Update an invoice; absent fields keep their value.
async fn update_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    let input = UpdateInvoiceInput {
        number: payload.number.map(|n| n.trim().to_string()),
        sale_date: payload.sale_date,
        client_id: payload.client_id,
        package_count: payload.package_count,
    };

    match repo.update(invoice_id, input).await {
        Ok(invoice) => {
            info!(invoice_id = invoice.id, "Invoice updated");
            (
                StatusCode::OK,
                Json(json!({
                    "id": invoice.id,
                    "number": invoice.number,
                    "sale_date": invoice.sale_date.to_string(),
                    "client_id": invoice.client_id,
                    "package_count": invoice.package_count,
                    "finalized": invoice.finalized,
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// DELETE `/invoices/{invoice_id}` - Delete an invoice (lines and returns cascade).
async fn delete_invoice(
    State(state): State<AppState>,
    auth: AuthAdmin,
    Path(invoice_id): Path<i64>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    match repo.delete(invoice_id).await {
        Ok(()) => {
            info!(invoice_id, by = %auth.0.sub, "Invoice deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST `/invoices/{invoice_id}/finalize` - Mark an invoice as finalized.
async fn finalize_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    match repo.set_finalized(invoice_id, true).await {
        Ok(invoice) => {
            info!(invoice_id = invoice.id, "Invoice finalized");
            (
                StatusCode::OK,
                Json(json!({ "id": invoice.id, "finalized": invoice.finalized })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST `/invoices/{invoice_id}/toggle-finalized` - Toggle draft/finalized.
async fn toggle_finalized(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    match repo.toggle_finalized(invoice_id).await {
        Ok(invoice) => {
            info!(
                invoice_id = invoice.id,
                finalized = invoice.finalized,
                "Invoice finalization toggled"
            );
            (
                StatusCode::OK,
                Json(json!({ "id": invoice.id, "finalized": invoice.finalized })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST `/invoices/{invoice_id}/lines` - Add a line item.
async fn add_line(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
    Json(payload): Json<AddLineRequest>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    let input = AddLineInput {
        product_id: payload.product_id,
        unit_price: payload.unit_price,
        quantity: payload.quantity,
    };

    match repo.add_line(invoice_id, input).await {
        Ok(line) => {
            info!(invoice_id, line_id = line.id, "Invoice line added");
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": line.id,
                    "invoice_id": line.invoice_id,
                    "product_id": line.product_id,
                    "unit_price": line.unit_price.to_string(),
                    "quantity": line.quantity,
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST `/invoices/{invoice_id}/returns` - Record a return.
async fn add_return(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
    Json(payload): Json<AddReturnRequest>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    let input = AddReturnInput {
        product_id: payload.product_id,
        unit_price: payload.unit_price,
        quantity: payload.quantity,
        date: payload
            .date
            .unwrap_or_else(|| chrono::Utc::now().date_naive()),
    };

    match repo.add_return(invoice_id, input).await {
        Ok(ret) => {
            info!(invoice_id, return_id = ret.id, "Return recorded");
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": ret.id,
                    "invoice_id": ret.invoice_id,
                    "product_id": ret.product_id,
                    "unit_price": ret.unit_price.to_string(),
                    "quantity": ret.quantity,
                    "date": ret.date.to_string(),
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET `/invoices/{invoice_id}/receipt` - Printable invoice document payload.
///
/// The payload carries everything a renderer needs; styling and PDF
/// generation happen downstream.
async fn invoice_receipt(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    match repo.find_detail(invoice_id, state.tax_rate).await {
        Ok(Some(detail)) => (
            StatusCode::OK,
            Json(json!({
                "document": "invoice_receipt",
                "invoice": detail_json(&detail),
            })),
        )
            .into_response(),
        Ok(None) => error_response(InvoiceError::NotFound(invoice_id)),
        Err(e) => error_response(e),
    }
}
