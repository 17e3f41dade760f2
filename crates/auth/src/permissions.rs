use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "depreciation.run"). The wildcard
/// `"*"` grants everything within the principal's tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));
    /// Commit a depreciation run.
    pub const RUN_DEPRECIATION: Permission = Permission(Cow::Borrowed("depreciation.run"));
    /// Dry-run preview and history reads.
    pub const PREVIEW_DEPRECIATION: Permission = Permission(Cow::Borrowed("depreciation.preview"));
    /// Record asset lifecycle transitions.
    pub const WRITE_ASSET_STATUS: Permission = Permission(Cow::Borrowed("assets.status.write"));

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
