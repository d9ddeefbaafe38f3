//! Shared response helpers for route handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use comptoir_shared::AppError;

/// Renders an error as a JSON body using the shared taxonomy.
///
/// Storage-level failures are logged here and reported without detail; every
/// other class carries its message to the caller.
pub fn error_response(e: impl Into<AppError>) -> Response {
    let e = e.into();

    if matches!(e, AppError::Database(_) | AppError::Internal(_)) {
        error!(error = %e, "Request failed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": e.error_code(),
                "message": "An error occurred"
            })),
        )
            .into_response();
    }

    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string()
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let resp = error_response(AppError::NotFound("client 7".into()));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_guard_maps_to_422() {
        let resp = error_response(AppError::Guard("still referenced".into()));
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let resp = error_response(AppError::Conflict("duplicate".into()));
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_database_hides_detail() {
        let resp = error_response(AppError::Database("connection refused".into()));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
