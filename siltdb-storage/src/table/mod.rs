//! The seam between the memtable and on-disk sorted tables
//!
//! Flushing drains the oldest frozen skip list through a [`TableBuilder`].
//! The builder's internals — block layout, file format, caching — live in
//! the crates that consume the flushed data; the memtable only promises to
//! deliver entries in strictly ascending key order and to forward the
//! block-cache handle untouched.

use std::path::Path;
use std::sync::Arc;

use siltdb_core::{Result, TxnId};

/// Consumes a flushed generation and produces a sorted-table artifact
///
/// [`MemTable::flush_last`] calls [`add`](Self::add) once per entry, in
/// strictly ascending key order, then [`build`](Self::build) exactly once.
/// Tombstones (empty values) are delivered like any other entry so that
/// deletions shadow older on-disk data.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use std::sync::Arc;
/// use siltdb_core::{Result, TxnId};
/// use siltdb_storage::TableBuilder;
///
/// /// Collects entries in memory; stands in for a real SST builder.
/// #[derive(Default)]
/// struct VecBuilder {
///     entries: Vec<(Vec<u8>, Vec<u8>, TxnId)>,
/// }
///
/// impl TableBuilder for VecBuilder {
///     type Table = Vec<(Vec<u8>, Vec<u8>, TxnId)>;
///     type Cache = ();
///
///     fn add(&mut self, key: &[u8], value: &[u8], txn_id: TxnId) {
///         self.entries.push((key.to_vec(), value.to_vec(), txn_id));
///     }
///
///     fn build(&mut self, _table_id: u64, _path: &Path, _cache: Arc<()>) -> Result<Self::Table> {
///         Ok(std::mem::take(&mut self.entries))
///     }
/// }
/// ```
///
/// [`MemTable::flush_last`]: crate::MemTable::flush_last
pub trait TableBuilder {
    /// The finished sorted-table artifact
    type Table;

    /// Opaque block-cache handle, forwarded through [`build`](Self::build)
    type Cache;

    /// Appends one entry; keys arrive in strictly ascending order
    fn add(&mut self, key: &[u8], value: &[u8], txn_id: TxnId);

    /// Finalises the table under the given id and path
    ///
    /// # Errors
    ///
    /// Builder failures propagate unchanged to the flush caller.
    fn build(&mut self, table_id: u64, path: &Path, cache: Arc<Self::Cache>) -> Result<Self::Table>;
}
