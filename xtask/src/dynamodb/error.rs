//! Error types for DynamoDB commands.

use dynauth::dynamodb::table::TableError;
use thiserror::Error;

/// Result type alias for dynamodb module.
pub type Result<T> = std::result::Result<T, DynamodbError>;

/// Errors that can occur during DynamoDB commands.
#[derive(Error, Debug)]
pub enum DynamodbError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Operation cancelled by user")]
    UserCancelled,
}
