//! Core types for dynauth.
//!
//! This crate holds the records and storage interface shared by every
//! adapter backend, with no I/O of its own.

pub mod adapter;

#[cfg(feature = "testing")]
pub mod testing;
