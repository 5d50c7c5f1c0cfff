use thiserror::Error;

use dva_frf::FrfError;

/// Run-level and individual-level failures of the GA engine (C6-C12).
///
/// Individual-level variants (the `FrfError` wrapper) are caught at the
/// fitness boundary and turned into `f64::INFINITY` — they never
/// propagate past [`crate::fitness::Fitness::evaluate`]. Only the
/// run-level variants below that propagate with `?` terminate the worker.
#[derive(Debug, Error)]
pub enum GaError {
    #[error(transparent)]
    Frf(#[from] FrfError),

    #[error("configuration rejected: {0}")]
    ConfigurationInvalid(String),

    #[error("abort requested")]
    AbortRequested,

    #[error("watchdog deadline expired")]
    WatchdogExpired,
}
