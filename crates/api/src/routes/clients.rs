//! Client management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{AppState, export, middleware::AuthAdmin, response::error_response};
use comptoir_core::billing::ClientBalance;
use comptoir_db::entities::clients;
use comptoir_db::repositories::client::{
    ClientError, ClientRepository, CreateClientInput, UpdateClientInput,
};

/// Creates the client routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients))
        .route("/clients", post(create_client))
        .route("/clients/export.csv", get(export_clients))
        .route("/clients/{client_id}", get(get_client))
        .route("/clients/{client_id}", put(update_client))
        .route("/clients/{client_id}", delete(delete_client))
        .route("/clients/{client_id}/history", get(client_history))
}

/// Request body for creating a client.
#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    /// Client name.
    pub name: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
}

/// Request body for updating a client; absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateClientRequest {
    /// Client name.
    pub name: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
}

/// Response for a client record.
#[derive(Debug, Serialize)]
pub struct ClientResponse {
    /// Client id.
    pub id: i64,
    /// Client name.
    pub name: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
}

impl From<clients::Model> for ClientResponse {
    fn from(client: clients::Model) -> Self {
        Self {
            id: client.id,
            name: client.name,
            phone: client.phone,
            address: client.address,
            city: client.city,
        }
    }
}

/// Balance figures serialized as decimal strings.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// TTC total of the client's finalized invoices.
    pub invoiced_ttc: String,
    /// Total applied to the client's invoices.
    pub applied: String,
    /// Outstanding balance.
    pub balance: String,
}

impl From<ClientBalance> for BalanceResponse {
    fn from(balance: ClientBalance) -> Self {
        Self {
            invoiced_ttc: balance.invoiced_ttc.to_string(),
            applied: balance.applied.to_string(),
            balance: balance.balance.to_string(),
        }
    }
}

/// GET `/clients` - List clients with their outstanding balances.
async fn list_clients(State(state): State<AppState>) -> impl IntoResponse {
    let repo = ClientRepository::new((*state.db).clone());

    match repo.list_with_balances(state.tax_rate).await {
        Ok(rows) => {
            let clients: Vec<_> = rows
                .into_iter()
                .map(|row| {
                    json!({
                        "client": ClientResponse::from(row.client),
                        "balance": BalanceResponse::from(row.balance),
                    })
                })
                .collect();

            (StatusCode::OK, Json(json!({ "clients": clients }))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST `/clients` - Create a client.
async fn create_client(
    State(state): State<AppState>,
    Json(payload): Json<CreateClientRequest>,
) -> impl IntoResponse {
    let repo = ClientRepository::new((*state.db).clone());

    let input = CreateClientInput {
        name: payload.name,
        phone: payload.phone,
        address: payload.address,
        city: payload.city,
    };

    match repo.create(input).await {
        Ok(client) => {
            info!(client_id = client.id, name = %client.name, "Client created");
            (StatusCode::CREATED, Json(ClientResponse::from(client))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET `/clients/{client_id}` - Fetch one client with its balance.
async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
) -> impl IntoResponse {
    let repo = ClientRepository::new((*state.db).clone());

    match repo.find_by_id(client_id).await {
        Ok(Some(client)) => match repo.balance(client_id, state.tax_rate).await {
            Ok(balance) => (
                StatusCode::OK,
                Json(json!({
                    "client": ClientResponse::from(client),
                    "balance": BalanceResponse::from(balance),
                })),
            )
                .into_response(),
            Err(e) => error_response(e),
        },
        Ok(None) => error_response(ClientError::NotFound(client_id)),
        Err(e) => error_response(e),
    }
}

/// PUT `/clients/{client_id}` - Update a client; absent fields keep their value.
async fn update_client(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
    Json(payload): Json<UpdateClientRequest>,
) -> impl IntoResponse {
    let repo = ClientRepository::new((*state.db).clone());

    let input = UpdateClientInput {
        name: payload.name,
        phone: payload.phone,
        address: payload.address,
        city: payload.city,
    };

    match repo.update(client_id, input).await {
        Ok(client) => {
            info!(client_id = client.id, "Client updated");
            (StatusCode::OK, Json(ClientResponse::from(client))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// DELETE `/clients/{client_id}` - Delete a client if nothing references it.
async fn delete_client(
    State(state): State<AppState>,
    auth: AuthAdmin,
    Path(client_id): Path<i64>,
) -> impl IntoResponse {
    let repo = ClientRepository::new((*state.db).clone());

    match repo.delete(client_id).await {
        Ok(()) => {
            info!(client_id, by = %auth.0.sub, "Client deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET `/clients/{client_id}/history` - Finalized invoices, payments, and balance.
async fn client_history(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
) -> impl IntoResponse {
    let repo = ClientRepository::new((*state.db).clone());

    match repo.history(client_id, state.tax_rate).await {
        Ok(history) => {
            let invoices: Vec<_> = history
                .invoices
                .iter()
                .map(|s| {
                    json!({
                        "id": s.invoice.id,
                        "number": s.invoice.number,
                        "sale_date": s.invoice.sale_date.to_string(),
                        "package_count": s.invoice.package_count,
                        "total_ttc": s.totals.total_ttc.to_string(),
                        "paid": s.applied.to_string(),
                        "remaining": s.remaining.to_string(),
                    })
                })
                .collect();

            let payments: Vec<_> = history
                .payments
                .iter()
                .map(|p| {
                    json!({
                        "id": p.id,
                        "number": p.number,
                        "date": p.date.to_string(),
                        "amount": p.amount.to_string(),
                        "bank": p.bank,
                        "due_date": p.due_date.map(|d| d.to_string()),
                    })
                })
                .collect();

            (
                StatusCode::OK,
                Json(json!({
                    "client": ClientResponse::from(history.client),
                    "invoices": invoices,
                    "payments": payments,
                    "balance": BalanceResponse::from(history.balance),
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET `/clients/export.csv` - Download the client list as CSV.
async fn export_clients(State(state): State<AppState>) -> impl IntoResponse {
    let repo = ClientRepository::new((*state.db).clone());

    match repo.list().await {
        Ok(clients) => match export::clients_csv(&clients) {
            Ok(csv) => (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"clients.csv\"",
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
