//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod auth;
pub mod clients;
pub mod health;
pub mod inventory;
pub mod invoices;
pub mod payments;
pub mod products;
pub mod stock;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Everything except login and the health probe requires a session token
    let protected_routes = Router::new()
        .merge(clients::routes())
        .merge(products::routes())
        .merge(stock::routes())
        .merge(invoices::routes())
        .merge(payments::routes())
        .merge(inventory::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
