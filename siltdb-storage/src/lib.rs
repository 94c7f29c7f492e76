//! In-memory write path for the siltdb storage engine
//!
//! This crate implements the memtable core of an LSM-tree storage engine:
//!
//! - **Skip list**: ordered in-memory index, the unit of write buffering
//! - **MemTable**: a staged pair of (active, frozen) skip-list generations
//!   with a size-triggered freeze discipline
//! - **Heap merge**: k-way ordered merge presenting one logical view across
//!   all generations, with newest-wins shadowing and tombstone suppression
//! - **Flush seam**: the [`TableBuilder`] trait through which the oldest
//!   frozen generation is drained into an external sorted-table builder
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! put/remove → active skip list → (size limit reached) → frozen list → flush
//!
//! Read Path:
//! get → active skip list → frozen skip lists (newest → oldest)
//!
//! Scan Path:
//! iter/prefix/predicate → per-generation cursors → HeapIterator (k-way merge)
//! ```
//!
//! Durability (WAL), on-disk tables, and compaction are the responsibility
//! of collaborators that consume the flushed data.
//!
//! # Example
//!
//! ```
//! use siltdb_storage::{MemTable, StorageConfig};
//!
//! let config = StorageConfig::default();
//! let memtable = MemTable::from_config(&config);
//!
//! memtable.put(b"key".to_vec(), b"value".to_vec(), 1);
//! let entry = memtable.get(b"key").unwrap();
//! assert_eq!(entry.value, b"value");
//! ```

pub mod config;
pub mod iterator;
pub mod memtable;
pub mod table;

pub use config::StorageConfig;
pub use iterator::{HeapIterator, SearchItem};
pub use memtable::MemTable;
pub use table::TableBuilder;
