//! Product catalog routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{AppState, middleware::AuthAdmin, response::error_response};
use comptoir_db::entities::products;
use comptoir_db::repositories::product::{
    CreateProductInput, OpeningStockInput, ProductError, ProductRepository, UpdateProductInput,
};
use comptoir_db::repositories::stock::StockRepository;

/// Creates the product routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products", post(create_product))
        .route("/products/{product_id}", get(get_product))
        .route("/products/{product_id}", put(update_product))
        .route("/products/{product_id}", delete(delete_product))
        .route("/products/{product_id}/stock", get(get_stock_summary))
        .route("/products/{product_id}/stock-entries", get(list_stock_entries))
}

/// Request body for creating a product.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    /// Reference code (globally unique).
    pub reference: String,
    /// Product name.
    pub name: String,
    /// Purchase price.
    pub purchase_price: Decimal,
    /// Standard sale price.
    pub standard_price: Decimal,
    /// Opening stock quantity; recorded only when positive.
    pub opening_quantity: Option<i32>,
    /// Opening stock date; defaults to the current date.
    pub opening_date: Option<NaiveDate>,
}

/// Request body for updating a product; absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    /// Reference code.
    pub reference: Option<String>,
    /// Product name.
    pub name: Option<String>,
    /// Purchase price.
    pub purchase_price: Option<Decimal>,
    /// Standard sale price.
    pub standard_price: Option<Decimal>,
}

/// Response for a product record.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    /// Product id.
    pub id: i64,
    /// Reference code.
    pub reference: String,
    /// Product name.
    pub name: String,
    /// Purchase price.
    pub purchase_price: String,
    /// Standard sale price.
    pub standard_price: String,
}

impl From<products::Model> for ProductResponse {
    fn from(product: products::Model) -> Self {
        Self {
            id: product.id,
            reference: product.reference,
            name: product.name,
            purchase_price: product.purchase_price.to_string(),
            standard_price: product.standard_price.to_string(),
        }
    }
}

/// GET `/products` - List products with their received quantities.
async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    let repo = ProductRepository::new((*state.db).clone());

    match repo.list_with_received().await {
        Ok(rows) => {
            let products: Vec<_> = rows
                .into_iter()
                .map(|row| {
                    json!({
                        "product": ProductResponse::from(row.product),
                        "quantity_received": row.quantity_received,
                    })
                })
                .collect();

            (StatusCode::OK, Json(json!({ "products": products }))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST `/products` - Create a product, optionally with opening stock.
async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> impl IntoResponse {
    let repo = ProductRepository::new((*state.db).clone());

    let opening_stock = payload.opening_quantity.map(|quantity| OpeningStockInput {
        date: payload
            .opening_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive()),
        quantity,
    });

    let input = CreateProductInput {
        reference: payload.reference.trim().to_string(),
        name: payload.name.trim().to_string(),
        purchase_price: payload.purchase_price,
        standard_price: payload.standard_price,
        opening_stock,
    };

    match repo.create(input).await {
        Ok(product) => {
            info!(
                product_id = product.id,
                reference = %product.reference,
                "Product created"
            );
            (StatusCode::CREATED, Json(ProductResponse::from(product))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET `/products/{product_id}` - Fetch one product.
async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> impl IntoResponse {
    let repo = ProductRepository::new((*state.db).clone());

    match repo.find_by_id(product_id).await {
        Ok(Some(product)) => {
            (StatusCode::OK, Json(ProductResponse::from(product))).into_response()
        }
        Ok(None) => error_response(ProductError::NotFound(product_id)),
        Err(e) => error_response(e),
    }
}

/// PUT `/products/{product_id}` - Update a product; absent fields keep their value.
async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Json(payload): Json<UpdateProductRequest>,
) -> impl IntoResponse {
    let repo = ProductRepository::new((*state.db).clone());

    let input = UpdateProductInput {
        reference: payload.reference.map(|r| r.trim().to_string()),
        name: payload.name,
        purchase_price: payload.purchase_price,
        standard_price: payload.standard_price,
    };

    match repo.update(product_id, input).await {
        Ok(product) => {
            info!(product_id = product.id, "Product updated");
            (StatusCode::OK, Json(ProductResponse::from(product))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// DELETE `/products/{product_id}` - Delete a product if nothing references it.
async fn delete_product(
    State(state): State<AppState>,
    auth: AuthAdmin,
    Path(product_id): Path<i64>,
) -> impl IntoResponse {
    let repo = ProductRepository::new((*state.db).clone());

    match repo.delete(product_id).await {
        Ok(()) => {
            info!(product_id, by = %auth.0.sub, "Product deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET `/products/{product_id}/stock` - Stock position from the three ledgers.
async fn get_stock_summary(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> impl IntoResponse {
    let repo = ProductRepository::new((*state.db).clone());

    match repo.stock_summary(product_id).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "product_id": product_id,
                "quantity_received": summary.quantity_received,
                "quantity_sold": summary.quantity_sold,
                "quantity_available": summary.quantity_available,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET `/products/{product_id}/stock-entries` - Receipts for one product.
async fn list_stock_entries(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> impl IntoResponse {
    let repo = StockRepository::new((*state.db).clone());

    match repo.list_for_product(product_id).await {
        Ok(entries) => {
            let entries: Vec<_> = entries
                .into_iter()
                .map(|entry| {
                    json!({
                        "id": entry.id,
                        "product_id": entry.product_id,
                        "date": entry.date.to_string(),
                        "quantity": entry.quantity,
                    })
                })
                .collect();

            (StatusCode::OK, Json(json!({ "entries": entries }))).into_response()
        }
        Err(e) => error_response(e),
    }
}
