use axum::{routing::get, Router};

pub mod assets;
pub mod depreciation;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/depreciation", depreciation::router())
        .nest("/assets", assets::router())
}
