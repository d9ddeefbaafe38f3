//! Payment management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
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
use comptoir_db::entities::payments;
use comptoir_db::repositories::client::ClientRepository;
use comptoir_shared::AppError;
use comptoir_db::repositories::payment::{
    ApplyPaymentInput, CreatePaymentInput, PaymentDetail, PaymentError, PaymentRepository,
    UpdatePaymentInput,
};

/// Creates the payment routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments))
        .route("/payments", post(create_payment))
        .route("/payments/{payment_id}", get(get_payment))
        .route("/payments/{payment_id}", put(update_payment))
        .route("/payments/{payment_id}", delete(delete_payment))
        .route("/payments/{payment_id}/applications", post(apply_payment))
        .route("/payments/{payment_id}/receipt", get(payment_receipt))
}

/// Query parameters for listing payments.
#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    /// Restrict to one client.
    pub client_id: Option<i64>,
}

/// Request body for creating a payment.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Payment number (globally unique).
    pub number: String,
    /// Paying client.
    pub client_id: i64,
    /// Payment date; defaults to the current date.
    pub date: Option<NaiveDate>,
    /// Amount received.
    pub amount: Decimal,
    /// Bank name.
    pub bank: Option<String>,
    /// Due date for deferred instruments.
    pub due_date: Option<NaiveDate>,
}

/// Request body for updating a payment; absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    /// Payment number.
    pub number: Option<String>,
    /// Payment date.
    pub date: Option<NaiveDate>,
    /// Amount received.
    pub amount: Option<Decimal>,
    /// Bank name.
    pub bank: Option<String>,
    /// Due date.
    pub due_date: Option<NaiveDate>,
}

/// Request body for applying part of a payment to an invoice.
#[derive(Debug, Deserialize)]
pub struct ApplyPaymentRequest {
    /// Target invoice.
    pub invoice_id: i64,
    /// Amount applied.
    pub amount: Decimal,
}

fn payment_json(payment: &payments::Model) -> Value {
    json!({
        "id": payment.id,
        "number": payment.number,
        "client_id": payment.client_id,
        "date": payment.date.to_string(),
        "amount": payment.amount.to_string(),
        "bank": payment.bank,
        "due_date": payment.due_date.map(|d| d.to_string()),
    })
}

fn detail_json(detail: &PaymentDetail) -> Value {
    let applications: Vec<_> = detail
        .applications
        .iter()
        .map(|a| {
            json!({
                "id": a.id,
                "invoice_id": a.invoice_id,
                "invoice_number": a.invoice_number,
                "amount": a.amount.to_string(),
            })
        })
        .collect();

    json!({
        "payment": payment_json(&detail.payment),
        "applications": applications,
        "applied": detail.applied.to_string(),
        "remaining": detail.remaining.to_string(),
    })
}

/// GET `/payments` - List payments, newest first, optionally for one client.
async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<ListPaymentsQuery>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    let result = match query.client_id {
        Some(client_id) => repo.list_for_client(client_id).await,
        None => repo.list().await,
    };

    match result {
        Ok(payments) => {
            let payments: Vec<_> = payments.iter().map(payment_json).collect();
            (StatusCode::OK, Json(json!({ "payments": payments }))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST `/payments` - Record a payment.
async fn create_payment(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentRequest>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    let input = CreatePaymentInput {
        number: payload.number.trim().to_string(),
        client_id: payload.client_id,
        date: payload
            .date
            .unwrap_or_else(|| chrono::Utc::now().date_naive()),
        amount: payload.amount,
        bank: payload.bank,
        due_date: payload.due_date,
    };

    match repo.create(input).await {
        Ok(payment) => {
            info!(payment_id = payment.id, number = %payment.number, "Payment recorded");
            (StatusCode::CREATED, Json(payment_json(&payment))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET `/payments/{payment_id}` - Fetch one payment with its applications.
async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    match repo.find_detail(payment_id).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(detail_json(&detail))).into_response(),
        Ok(None) => error_response(PaymentError::NotFound(payment_id)),
        Err(e) => error_response(e),
    }
}

/// PUT `/payments/{payment_id}` - Update a payment; absent fields keep their value.
async fn update_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    let input = UpdatePaymentInput {
        number: payload.number.map(|n| n.trim().to_string()),
        date: payload.date,
        amount: payload.amount,
        bank: payload.bank,
        due_date: payload.due_date,
    };

    match repo.update(payment_id, input).await {
        Ok(payment) => {
            info!(payment_id = payment.id, "Payment updated");
            (StatusCode::OK, Json(payment_json(&payment))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// DELETE `/payments/{payment_id}` - Delete a payment; applications cascade.
async fn delete_payment(
    State(state): State<AppState>,
    auth: AuthAdmin,
    Path(payment_id): Path<i64>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    match repo.delete(payment_id).await {
        Ok(()) => {
            info!(payment_id, by = %auth.0.sub, "Payment deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST `/payments/{payment_id}/applications` - Apply part of a payment to an invoice.
async fn apply_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
    Json(payload): Json<ApplyPaymentRequest>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    let input = ApplyPaymentInput {
        invoice_id: payload.invoice_id,
        amount: payload.amount,
    };

    match repo.apply(payment_id, input).await {
        Ok(application) => {
            info!(
                payment_id,
                invoice_id = application.invoice_id,
                amount = %application.amount,
                "Payment applied to invoice"
            );
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": application.id,
                    "payment_id": application.payment_id,
                    "invoice_id": application.invoice_id,
                    "amount": application.amount.to_string(),
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET `/payments/{payment_id}/receipt` - Printable payment document payload.
///
/// Carries the payment, its applications, and the client's remaining balance
/// after all applications; rendering happens downstream.
async fn payment_receipt(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
) -> impl IntoResponse {
    let repo = PaymentRepository::new((*state.db).clone());

    let detail = match repo.find_detail(payment_id).await {
        Ok(Some(detail)) => detail,
        Ok(None) => return error_response(PaymentError::NotFound(payment_id)),
        Err(e) => return error_response(e),
    };

    let client_repo = ClientRepository::new((*state.db).clone());
    let client_id = detail.payment.client_id;

    let client = match client_repo.find_by_id(client_id).await {
        Ok(Some(client)) => client,
        Ok(None) => {
            return error_response(AppError::Internal(format!(
                "payment {payment_id} references missing client {client_id}"
            )));
        }
        Err(e) => return error_response(e),
    };

    match client_repo.balance(client_id, state.tax_rate).await {
        Ok(balance) => (
            StatusCode::OK,
            Json(json!({
                "document": "payment_receipt",
                "payment": detail_json(&detail),
                "client": {
                    "id": client.id,
                    "name": client.name,
                    "phone": client.phone,
                    "address": client.address,
                    "city": client.city,
                },
                "client_balance": balance.balance.to_string(),
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
