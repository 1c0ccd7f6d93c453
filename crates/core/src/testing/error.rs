use thiserror::Error;

use crate::adapter::AdapterError;

/// Result type for conformance checks.
pub type Result<T> = std::result::Result<T, ConformanceError>;

/// A failed conformance check.
#[derive(Debug, Error)]
pub enum ConformanceError {
    #[error("{step}: adapter returned an error: {source}")]
    Adapter {
        step: &'static str,
        #[source]
        source: AdapterError,
    },

    #[error("{step}: expected {expected}, got {actual}")]
    Mismatch {
        step: &'static str,
        expected: String,
        actual: String,
    },
}

/// Attaches the name of the running step to adapter errors.
pub(crate) trait StepExt<T> {
    fn step(self, step: &'static str) -> Result<T>;
}

impl<T> StepExt<T> for std::result::Result<T, AdapterError> {
    fn step(self, step: &'static str) -> Result<T> {
        self.map_err(|source| ConformanceError::Adapter { step, source })
    }
}
