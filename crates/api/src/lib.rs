//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for clients, products, stock, invoices, and payments
//! - Reporting endpoints backed by the reconciliation calculators
//! - CSV export and printable document payloads
//! - Bearer-token authentication middleware

pub mod export;
pub mod middleware;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use comptoir_core::auth::AdminCredentials;
use comptoir_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for session tokens.
    pub jwt: Arc<JwtService>,
    /// The shared admin credential.
    pub admin: Arc<AdminCredentials>,
    /// VAT rate applied by the calculators; a configuration value, never
    /// ambient state.
    pub tax_rate: Decimal,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
