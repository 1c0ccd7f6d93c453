//! Storage adapters for dynauth.
//!
//! Backends are selected with cargo features:
//!
//! - `dynamodb` (default): [`dynamodb::DynamoDbAdapter`], a single-table
//!   DynamoDB adapter, plus the table bootstrap in [`dynamodb::table`].
//! - `inmemory` (default): [`inmemory::InMemoryAdapter`], for tests.

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub mod inmemory;

pub use dynauth_core::adapter::{
    is_reserved_attribute, Adapter, AdapterError, Attributes, DatabaseSession, DatabaseUser,
    Result, SessionAdapter, UserAdapter, RESERVED_ATTRIBUTES,
};
