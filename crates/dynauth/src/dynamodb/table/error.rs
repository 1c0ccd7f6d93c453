//! Error types for table bootstrap operations.

use thiserror::Error;

/// Result type alias for the table module.
pub type Result<T> = std::result::Result<T, TableError>;

/// Errors that can occur while inspecting or changing the table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("AWS SDK error: {0}")]
    Sdk(#[from] aws_sdk_dynamodb::Error),

    #[error("Invalid table definition: {0}")]
    Build(#[from] aws_sdk_dynamodb::error::BuildError),

    #[error("DescribeTable returned no table description for '{table_name}'")]
    MissingDescription { table_name: String },

    #[error("Timeout waiting for table '{table_name}' to become active")]
    ActivationTimeout { table_name: String },
}
