//! Asset lifecycle transitions with their audit event.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument};

use assetbook_auth::{authorize, ensure_scope, AuthzError, JwtClaims, Permission, TenantResolver};
use assetbook_core::{AssetId, ExpectedVersion, TenantId};
use assetbook_depreciation::{AssetEvent, AssetStatus, TransitionError};

use crate::store::{AssetLedgerStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("authorization failed: {0}")]
    Authorization(#[from] AuthzError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("asset {0} not found")]
    NotFound(AssetId),

    /// The asset changed between read and write; nothing was recorded.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TransitionError> for RecorderError {
    fn from(value: TransitionError) -> Self {
        RecorderError::Validation(value.to_string())
    }
}

impl From<StoreError> for RecorderError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => RecorderError::Conflict(msg),
            other => RecorderError::Internal(other.to_string()),
        }
    }
}

/// Sole writer of `Asset::status`.
#[derive(Clone)]
pub struct StatusRecorder {
    store: Arc<dyn AssetLedgerStore>,
    resolver: Arc<dyn TenantResolver>,
}

impl StatusRecorder {
    pub fn new(store: Arc<dyn AssetLedgerStore>, resolver: Arc<dyn TenantResolver>) -> Self {
        Self { store, resolver }
    }

    pub async fn transition(
        &self,
        caller: &JwtClaims,
        tenant_id: TenantId,
        asset_id: AssetId,
        new_status: AssetStatus,
        note: Option<&str>,
    ) -> Result<AssetEvent, RecorderError> {
        self.transition_at(caller, tenant_id, asset_id, new_status, note, Utc::now())
            .await
    }

    #[instrument(
        skip(self, caller, note),
        fields(tenant_id = %tenant_id, asset_id = %asset_id, to = %new_status),
        err
    )]
    pub async fn transition_at(
        &self,
        caller: &JwtClaims,
        tenant_id: TenantId,
        asset_id: AssetId,
        new_status: AssetStatus,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AssetEvent, RecorderError> {
        let principal = self.resolver.resolve(caller, now)?;
        let tenant_id = ensure_scope(&principal, tenant_id)?;
        authorize(&principal, &Permission::WRITE_ASSET_STATUS)?;

        let asset = self
            .store
            .get_asset(tenant_id, asset_id)
            .await?
            .filter(|a| !a.is_deleted)
            .ok_or(RecorderError::NotFound(asset_id))?;

        let event = AssetEvent::status_changed(
            tenant_id,
            asset_id,
            asset.status,
            new_status,
            note,
            principal.principal_id.as_user(),
            now,
        )?;

        self.store
            .record_status_change(event.clone(), ExpectedVersion::Exact(asset.version))
            .await?;

        info!(from = %event.from_status, "asset status changed");
        Ok(event)
    }
}
