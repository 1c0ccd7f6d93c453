//! DynamoDB storage for users and sessions.
//!
//! Everything lives in a single table keyed by `Pk`/`Sk`, with two global
//! secondary indexes: `Gs1` lists a user's sessions and `Gs2` orders all
//! sessions by expiration.

mod adapter;
mod client;
mod config;
mod conversions;
mod error;
pub mod keys;
pub mod table;

pub use adapter::DynamoDbAdapter;
pub use client::{create_client, ClientConfig, StaticCredentials, DEFAULT_REGION};
pub use config::{
    DynamoDbAdapterConfig, DEFAULT_EXPIRATION_INDEX, DEFAULT_TABLE_NAME,
    DEFAULT_USER_SESSIONS_INDEX,
};
