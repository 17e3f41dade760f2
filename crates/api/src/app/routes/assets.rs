use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use assetbook_auth::Permission;
use assetbook_core::{AssetId, TenantId};
use assetbook_infra::AssetLedgerStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/:id/entries", get(list_entries))
        .route("/:id/events", get(list_events))
        .route("/:id/status", post(change_status))
}

fn parse_asset_id(raw: &str) -> Result<AssetId, axum::response::Response> {
    AssetId::from_str(raw)
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("'{raw}' is not an asset id")))
}

/// Authorize a history read and make sure the asset exists in the caller's tenant.
async fn readable_asset(
    services: &AppServices,
    principal: &PrincipalContext,
    raw_id: &str,
) -> Result<(TenantId, AssetId), axum::response::Response> {
    let asset_id = parse_asset_id(raw_id)?;
    let tenant_id = crate::authz::authorize_read(
        services.resolver.as_ref(),
        principal,
        &Permission::PREVIEW_DEPRECIATION,
    )
    .map_err(errors::authz_error_to_response)?;

    match services.assets.get_asset(tenant_id, asset_id).await {
        Ok(Some(_)) => Ok((tenant_id, asset_id)),
        Ok(None) => Err(errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("asset {asset_id} not found"),
        )),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}

pub async fn list_entries(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let (tenant_id, asset_id) = match readable_asset(&services, &principal, &id).await {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };

    match services.assets.list_entries(tenant_id, asset_id).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_events(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let (tenant_id, asset_id) = match readable_asset(&services, &principal, &id).await {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };

    match services.assets.list_events(tenant_id, asset_id).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn change_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::ChangeStatusRequest>, JsonRejection>,
) -> axum::response::Response {
    let asset_id = match parse_asset_id(&id) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text());
        }
    };

    match services
        .recorder
        .transition(
            principal.claims(),
            tenant.tenant_id(),
            asset_id,
            body.status,
            body.note.as_deref(),
        )
        .await
    {
        Ok(event) => (StatusCode::CREATED, Json(event)).into_response(),
        Err(e) => errors::recorder_error_to_response(e),
    }
}
