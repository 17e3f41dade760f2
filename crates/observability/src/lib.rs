//! Tracing and logging setup shared by the service binaries.

/// Initialize process-wide tracing with the configuration taken from the
/// environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_with(&ObservabilityConfig::from_env());
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use tracing::{init_with, LogFormat, ObservabilityConfig};
