//! Login route for the shared admin credential.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::AppState;
use comptoir_core::auth::CredentialError;
use comptoir_shared::LoginRequest;

/// Creates the auth routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Response for a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Session token.
    pub access_token: String,
    /// Token type, always `bearer`.
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// POST `/auth/login` - Verify the admin credential and issue a session token.
async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> impl IntoResponse {
    match state.admin.verify(&payload.username, &payload.password) {
        Ok(()) => match state.jwt.generate_token(&payload.username) {
            Ok(token) => {
                info!(username = %payload.username, "Admin logged in");
                (
                    StatusCode::OK,
                    Json(TokenResponse {
                        access_token: token,
                        token_type: "bearer",
                        expires_in: state.jwt.expires_in_secs(),
                    }),
                )
                    .into_response()
            }
            Err(e) => {
                warn!(error = %e, "Failed to issue session token");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "internal_error",
                        "message": "An error occurred"
                    })),
                )
                    .into_response()
            }
        },
        Err(CredentialError::InvalidHash) => {
            warn!("Configured admin password hash is malformed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "invalid_credentials",
                "message": "Invalid username or password"
            })),
        )
            .into_response(),
    }
}
