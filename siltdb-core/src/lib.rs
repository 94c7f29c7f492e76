//! Core types and traits for siltdb
//!
//! This crate contains the fundamental types and error handling used throughout
//! the siltdb project. It provides:
//!
//! - Common error types with [`Error`] and [`Result`]
//! - Basic data types like [`Key`], [`Value`], [`TxnId`], and [`Entry`]
//!
//! # Example
//!
//! ```
//! use siltdb_core::{Entry, Key, Value};
//!
//! let key: Key = b"user:123".to_vec();
//! let value: Value = b"John Doe".to_vec();
//! let entry = Entry::new(key, value, 1);
//! assert!(!entry.is_tombstone());
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
