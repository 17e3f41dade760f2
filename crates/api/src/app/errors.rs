use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use assetbook_auth::AuthzError;
use assetbook_infra::{RecorderError, RunError, StoreError};

use crate::app::dto;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    match err {
        AuthzError::Unauthenticated(e) => json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string()),
        AuthzError::TenantMismatch => json_error(StatusCode::FORBIDDEN, "tenant_mismatch", err.to_string()),
        AuthzError::Forbidden(_) => json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string()),
    }
}

pub fn run_error_to_response(err: RunError) -> axum::response::Response {
    match err {
        RunError::Authorization(e) => authz_error_to_response(e),
        RunError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        // Non-fatal: 200 with the committed counts and per-asset warnings.
        RunError::PartialFailure(report) => (
            StatusCode::OK,
            axum::Json(dto::CommittedRunResponse::from(*report)),
        )
            .into_response(),
        RunError::Internal(msg) => {
            tracing::error!(error = %msg, "depreciation run failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
        }
    }
}

pub fn recorder_error_to_response(err: RecorderError) -> axum::response::Response {
    match err {
        RecorderError::Authorization(e) => authz_error_to_response(e),
        RecorderError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        RecorderError::NotFound(id) => json_error(StatusCode::NOT_FOUND, "not_found", format!("asset {id} not found")),
        RecorderError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        RecorderError::Internal(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::TenantIsolation(msg) => json_error(StatusCode::FORBIDDEN, "tenant_isolation", msg),
        other => {
            tracing::error!(error = %other, "store query failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", other.to_string())
        }
    }
}
