//! Core types used throughout siltdb
//!
//! This module contains the fundamental data types that form the basis
//! of siltdb's data model.

use serde::{Deserialize, Serialize};

/// A key in the database, represented as a byte vector
///
/// The empty key is reserved for skip-list head sentinels and must never
/// be written by callers.
pub type Key = Vec<u8>;

/// A value in the database, represented as a byte vector
///
/// An empty value marks a tombstone at the memtable layer.
pub type Value = Vec<u8>;

/// A transaction id, reserved for future visibility checks
///
/// Carried on every entry end to end; `0` means "transactions disabled"
/// when used as an upper bound on merge iterators.
pub type TxnId = u64;

/// A single logical entry: key, value, and the transaction id that wrote it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// The key
    pub key: Key,
    /// The value (empty for tombstones)
    pub value: Value,
    /// The transaction id that produced this entry
    pub txn_id: TxnId,
}

impl Entry {
    /// Creates a new entry
    pub fn new(key: Key, value: Value, txn_id: TxnId) -> Self {
        Self { key, value, txn_id }
    }

    /// Whether this entry marks a logical deletion
    pub fn is_tombstone(&self) -> bool {
        self.value.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tombstone_detection() {
        let live = Entry::new(b"k".to_vec(), b"v".to_vec(), 1);
        let dead = Entry::new(b"k".to_vec(), Vec::new(), 2);

        assert!(!live.is_tombstone());
        assert!(dead.is_tombstone());
    }
}
