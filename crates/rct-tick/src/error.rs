//! Tick error types.

use std::time::Duration;

use rct_spatial::RegionId;
use thiserror::Error;

/// Tick error type.
///
/// Lookup misses and entities outside every region are not errors: the
/// former are skipped, the latter go to the unassigned bucket.
#[derive(Debug, Error)]
pub enum TickError {
    /// A region task panicked; its chunks fall back to the sequential pass.
    #[error("region {region} task panicked: {message}")]
    RegionTaskPanicked { region: RegionId, message: String },

    /// The region worker pool could not be built.
    #[error("failed to build region executor: {0}")]
    ExecutorBuild(#[from] rayon::ThreadPoolBuildError),

    /// Workers were still alive when the shutdown timeout elapsed.
    #[error("region executor did not terminate within {timeout:?} ({remaining} worker(s) still running)")]
    ShutdownTimeout { timeout: Duration, remaining: usize },

    /// The deferred task joined after region ticking panicked.
    #[error("deferred task panicked: {0}")]
    DeferredTaskPanicked(String),
}

/// Result type for tick operations.
pub type TickResult<T> = Result<T, TickError>;

/// Extract a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
