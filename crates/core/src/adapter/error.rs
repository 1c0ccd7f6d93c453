use thiserror::Error;

/// Boxed error produced by the backing store's client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during adapter operations.
///
/// A missing record is never an error: lookups return `None` and updates of a
/// missing record are no-ops.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The database client failed. The client's error is kept intact as the source.
    #[error("{operation} failed: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl AdapterError {
    /// Wraps a database client error for the given operation.
    pub fn database(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Database {
            operation,
            source: source.into(),
        }
    }

    /// Returns the name of the failed database operation, if any.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Database { operation, .. } => Some(*operation),
            Self::InvalidData(_) => None,
        }
    }
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
