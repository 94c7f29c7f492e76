//! In-memory write buffer staged across skip-list generations
//!
//! Writes land in a single mutable *active* skip list. When the active
//! list outgrows its configured byte budget it is frozen — moved, intact,
//! to the front of an immutable generation list — and a fresh empty list
//! takes its place. Reads consult the active list first, then each frozen
//! generation from newest to oldest, so the newest write for a key always
//! wins. The oldest frozen generation is eventually drained to an external
//! sorted-table builder by [`MemTable::flush_last`].
//!
//! # Example
//!
//! ```
//! use siltdb_storage::memtable::MemTable;
//!
//! let memtable = MemTable::new(4 * 1024 * 1024); // 4MB freeze threshold
//!
//! memtable.put(b"key1".to_vec(), b"value1".to_vec(), 100);
//! memtable.remove(b"key2".to_vec(), 101);
//!
//! if let Some(entry) = memtable.get(b"key1") {
//!     assert_eq!(entry.value, b"value1");
//! }
//! // A removed key reads back as a tombstone, not as absence.
//! assert!(memtable.get(b"key2").unwrap().is_tombstone());
//! ```

mod memtable;
pub mod skip_list;

pub use memtable::MemTable;
pub use skip_list::{SkipList, SkipListIterator, MAX_HEIGHT};
