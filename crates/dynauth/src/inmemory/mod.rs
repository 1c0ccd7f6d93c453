//! In-memory storage backend for testing.
//!
//! Implements the same storage traits as the DynamoDB adapter over HashMaps
//! wrapped in `Arc<RwLock<_>>`. Useful for tests of code built on top of the
//! adapter traits, where persistence is not required.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynauth::inmemory::InMemoryAdapter;
//!
//! let adapter = InMemoryAdapter::new().with_extra_user_attributes(["HashedPassword"]);
//! ```

mod adapter;

pub use adapter::InMemoryAdapter;
