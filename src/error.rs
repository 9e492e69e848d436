use std::fmt;

use thiserror::Error;

/// Error taxonomy for the resolution pipeline.
///
/// `Validation` is raised before any network call and is never retried.
/// `Provider` covers non-2xx and transport failures from any collaborator;
/// batch sweeps log it, skip the current item, and continue — retrying is an
/// operational concern of whoever re-runs the batch.
/// `AmbiguousClassification` means a place's type tags fit neither the
/// address-only nor the POI set; the record is left untouched.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{service} request failed: {message}")]
    Provider {
        service: &'static str,
        message: String,
    },

    #[error("place type tags are ambiguous (neither address-only nor POI)")]
    AmbiguousClassification,
}

impl RegistryError {
    pub fn provider(service: &'static str, err: impl fmt::Display) -> Self {
        RegistryError::Provider {
            service,
            message: err.to_string(),
        }
    }

    /// Transient errors are safe to resolve by re-running the batch later.
    pub fn is_transient(&self) -> bool {
        matches!(self, RegistryError::Provider { .. })
    }
}

/// Outcome counters for a batch sweep. A sweep never aborts on a single
/// failure: failed items are counted here and reported in the final summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub processed: usize,
    pub changed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SweepStats {
    pub fn record_failure(&mut self, context: &str, err: &RegistryError) {
        if err.is_transient() {
            tracing::warn!(error = %err, context, "sweep item failed; continuing");
        } else {
            tracing::error!(error = %err, context, "sweep item rejected; continuing");
        }
        self.failed += 1;
    }
}

impl fmt::Display for SweepStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} changed={} skipped={} failed={}",
            self.processed, self.changed, self.skipped, self.failed
        )
    }
}
