use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use assetbook_auth::Permission;
use assetbook_infra::{RunLogStore, RunRequest};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/runs", post(run_depreciation).get(list_runs))
}

pub async fn run_depreciation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::RunDepreciationRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text());
        }
    };

    let request = RunRequest {
        tenant_id: body.tenant_id,
        dry_run: body.dry_run,
        period_start: body.period_start,
    };

    match services.runner.run(principal.claims(), request).await {
        Ok(report) if report.dry_run => (StatusCode::OK, Json(dto::PreviewRunResponse::from(report))).into_response(),
        Ok(report) => match report.into_result() {
            Ok(report) => (StatusCode::OK, Json(dto::CommittedRunResponse::from(report))).into_response(),
            Err(e) => errors::run_error_to_response(e),
        },
        Err(e) => errors::run_error_to_response(e),
    }
}

pub async fn list_runs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ListRunsQuery>,
) -> axum::response::Response {
    let tenant_id = match crate::authz::authorize_read(
        services.resolver.as_ref(),
        &principal,
        &Permission::PREVIEW_DEPRECIATION,
    ) {
        Ok(t) => t,
        Err(e) => return errors::authz_error_to_response(e),
    };

    match services.runs.list_runs(tenant_id, query.effective_limit()).await {
        Ok(runs) => (StatusCode::OK, Json(runs)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
