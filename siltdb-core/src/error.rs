//! Error types for siltdb
//!
//! This module defines the error types used throughout siltdb.

use thiserror::Error;

/// The main error type for siltdb operations
#[derive(Error, Debug)]
pub enum Error {
    /// An I/O error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An iterator was dereferenced past its end
    #[error("iterator out of range")]
    IteratorOutOfRange,

    /// A sorted-table builder failed to produce its artifact
    #[error("table build error: {0}")]
    TableBuild(String),
}

/// A specialized Result type for siltdb operations
pub type Result<T> = std::result::Result<T, Error>;
