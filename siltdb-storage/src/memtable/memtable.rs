use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, trace};
use parking_lot::RwLock;

use siltdb_core::{Entry, Key, Result, TxnId, Value};

use super::skip_list::SkipList;
use crate::config::StorageConfig;
use crate::iterator::{HeapIterator, SearchItem};
use crate::table::TableBuilder;

/// The frozen generations, newest at the front, plus the cached total of
/// their byte sizes. Bundled so both live under the same lock.
struct FrozenTables {
    tables: VecDeque<SkipList>,
    bytes: usize,
}

/// Two-tier in-memory table: one mutable active skip list in front of a
/// queue of immutable frozen generations
///
/// # Thread Safety
///
/// Two readers-writer locks guard the two tiers independently: the active
/// lock covers the active skip list, the frozen lock covers the generation
/// queue and its byte counter. Frozen content is immutable once installed,
/// so shared access suffices to traverse it. Whenever both locks are held,
/// the active lock is acquired first; a write holds the active lock across
/// its freeze so no reader can catch the moved list in neither tier.
///
/// # Example
///
/// ```
/// use siltdb_storage::memtable::MemTable;
///
/// let memtable = MemTable::new(4 * 1024 * 1024);
/// memtable.put(b"k".to_vec(), b"v".to_vec(), 1);
/// assert_eq!(memtable.get(b"k").unwrap().value, b"v");
/// ```
pub struct MemTable {
    active: RwLock<SkipList>,
    frozen: RwLock<FrozenTables>,
    size_limit: usize,
}

impl MemTable {
    /// Creates a memtable that freezes its active list at `size_limit`
    /// bytes
    pub fn new(size_limit: usize) -> Self {
        Self {
            active: RwLock::new(SkipList::new()),
            frozen: RwLock::new(FrozenTables {
                tables: VecDeque::new(),
                bytes: 0,
            }),
            size_limit,
        }
    }

    /// Creates a memtable from a [`StorageConfig`]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.memtable_size)
    }

    /// Inserts or updates a key-value pair
    ///
    /// Freezes the active list in the same critical section when the put
    /// pushes it past the size limit.
    pub fn put(&self, key: Key, value: Value, txn_id: TxnId) {
        trace!(
            "memtable put: key={:?} txn_id={}",
            String::from_utf8_lossy(&key),
            txn_id
        );
        let mut active = self.active.write();
        active.put(key, value, txn_id);
        self.maybe_freeze(&mut active);
    }

    /// Applies every pair in input order under one lock acquisition
    ///
    /// The freeze check runs once, after the last pair.
    pub fn put_batch(&self, pairs: Vec<(Key, Value)>, txn_id: TxnId) {
        trace!("memtable put_batch: {} pairs txn_id={}", pairs.len(), txn_id);
        let mut active = self.active.write();
        for (key, value) in pairs {
            active.put(key, value, txn_id);
        }
        self.maybe_freeze(&mut active);
    }

    /// Logically deletes a key by writing a tombstone
    pub fn remove(&self, key: Key, txn_id: TxnId) {
        trace!(
            "memtable remove: key={:?} txn_id={}",
            String::from_utf8_lossy(&key),
            txn_id
        );
        let mut active = self.active.write();
        active.put(key, Value::new(), txn_id);
    }

    /// Writes a tombstone for every key under one lock acquisition
    ///
    /// Like [`put_batch`](Self::put_batch), the freeze check runs once at
    /// the end.
    pub fn remove_batch(&self, keys: Vec<Key>, txn_id: TxnId) {
        trace!("memtable remove_batch: {} keys txn_id={}", keys.len(), txn_id);
        let mut active = self.active.write();
        for key in keys {
            active.put(key, Value::new(), txn_id);
        }
        self.maybe_freeze(&mut active);
    }

    /// Looks up a key across all generations, newest first
    ///
    /// Returns the entry from the newest generation containing the key.
    /// A tombstone is a hit — the returned entry has an empty value and
    /// the caller interprets it; `None` means no generation knows the key.
    pub fn get(&self, key: &[u8]) -> Option<Entry> {
        trace!("memtable get: key={:?}", String::from_utf8_lossy(key));
        {
            let active = self.active.read();
            if let Some(entry) = active.get(key).entry() {
                return Some(entry);
            }
        }

        let frozen = self.frozen.read();
        for table in &frozen.tables {
            if let Some(entry) = table.get(key).entry() {
                return Some(entry);
            }
        }
        trace!(
            "memtable get: key={:?} not found in any generation",
            String::from_utf8_lossy(key)
        );
        None
    }

    /// Looks up many keys with one pass per tier
    ///
    /// The active list is searched first under its shared lock; only keys
    /// it did not resolve are then looked up across the frozen
    /// generations, newest first. Each slot carries the value and
    /// transaction id from the newest generation holding the key — an
    /// empty value is a tombstone handed back to the caller — or `None`
    /// when no generation does.
    pub fn get_batch(&self, keys: &[Key]) -> Vec<(Key, Option<(Value, TxnId)>)> {
        trace!("memtable get_batch: {} keys", keys.len());

        let mut results: Vec<(Key, Option<(Value, TxnId)>)> = Vec::with_capacity(keys.len());
        {
            let active = self.active.read();
            for key in keys {
                let found = active.get(key).entry().map(|e| (e.value, e.txn_id));
                results.push((key.clone(), found));
            }
        }

        if results.iter().all(|(_, slot)| slot.is_some()) {
            return results;
        }

        let frozen = self.frozen.read();
        for (key, slot) in results.iter_mut() {
            if slot.is_some() {
                continue;
            }
            for table in &frozen.tables {
                if let Some(entry) = table.get(key).entry() {
                    *slot = Some((entry.value, entry.txn_id));
                    break;
                }
            }
        }
        results
    }

    /// Freezes the active skip list regardless of its size
    pub fn freeze(&self) {
        // Lock order: active before frozen.
        let mut active = self.active.write();
        let mut frozen = self.frozen.write();
        info!(
            "memtable freeze: active table at {} bytes moved to frozen tier",
            active.size_bytes()
        );
        Self::freeze_in_place(&mut active, &mut frozen);
    }

    /// Drops every entry in every generation
    pub fn clear(&self) {
        info!("memtable clear: dropping all generations");
        let mut active = self.active.write();
        let mut frozen = self.frozen.write();
        frozen.tables.clear();
        frozen.bytes = 0;
        active.clear();
    }

    /// Drains the oldest frozen generation into `builder` and returns the
    /// built artifact
    ///
    /// When no frozen generation exists, a non-empty active list is frozen
    /// on the spot so there is always something to pop; when the active
    /// list is empty too, `Ok(None)` signals that nothing was flushed.
    /// Entries reach the builder in strictly ascending key order, and the
    /// block-cache handle is forwarded untouched.
    ///
    /// # Errors
    ///
    /// Builder failures propagate unchanged.
    pub fn flush_last<B: TableBuilder>(
        &self,
        builder: &mut B,
        path: impl AsRef<Path>,
        table_id: u64,
        cache: Arc<B::Cache>,
    ) -> Result<Option<B::Table>> {
        debug!("memtable flush_last: draining oldest generation into table {}", table_id);

        // Lock order: active before frozen. The active lock is only needed
        // for the freeze-on-demand below, and is released before the drain.
        let mut active = self.active.write();
        let mut frozen = self.frozen.write();
        if frozen.tables.is_empty() {
            if active.is_empty() {
                debug!("memtable flush_last: nothing to flush");
                return Ok(None);
            }
            Self::freeze_in_place(&mut active, &mut frozen);
        }
        drop(active);

        let Some(table) = frozen.tables.pop_back() else {
            return Ok(None);
        };
        frozen.bytes -= table.size_bytes();

        let mut min_txn_id = TxnId::MAX;
        let mut max_txn_id = TxnId::MIN;
        let entries = table.flush();
        for entry in &entries {
            min_txn_id = min_txn_id.min(entry.txn_id);
            max_txn_id = max_txn_id.max(entry.txn_id);
            builder.add(&entry.key, &entry.value, entry.txn_id);
        }
        let artifact = builder.build(table_id, path.as_ref(), cache)?;

        info!(
            "memtable flush_last: table {} built with {} entries, txn ids {}..={}",
            table_id,
            entries.len(),
            min_txn_id,
            max_txn_id
        );
        Ok(Some(artifact))
    }

    /// Merged view over every generation
    ///
    /// Snapshots each generation under its shared lock — active first as
    /// source 0, then the frozen generations newest to oldest — and merges
    /// them with newest-wins and tombstone suppression.
    pub fn iter(&self, max_txn_id: TxnId) -> HeapIterator {
        let mut items = Vec::new();
        let active = self.active.read();
        for entry in active.iter() {
            items.push(SearchItem::new(entry.key, entry.value, 0, 0, entry.txn_id));
        }
        let frozen = self.frozen.read();
        for (idx, table) in frozen.tables.iter().enumerate() {
            for entry in table.iter() {
                items.push(SearchItem::new(entry.key, entry.value, idx + 1, 0, entry.txn_id));
            }
        }
        HeapIterator::new(items, max_txn_id)
    }

    /// Merged view over the keys starting with `prefix`
    pub fn prefix_scan(&self, prefix: &[u8], max_txn_id: TxnId) -> HeapIterator {
        let mut items = Vec::new();
        let active = self.active.read();
        Self::collect_prefix(&active, prefix, 0, &mut items);
        let frozen = self.frozen.read();
        for (idx, table) in frozen.tables.iter().enumerate() {
            Self::collect_prefix(table, prefix, idx + 1, &mut items);
        }
        HeapIterator::new(items, max_txn_id)
    }

    /// Merged view over the contiguous range accepted by a monotone
    /// predicate
    ///
    /// The predicate contract is that of
    /// [`SkipList::monotone_range`](super::SkipList::monotone_range).
    /// Returns `None` when no generation produced a single entry.
    pub fn monotone_scan<F>(&self, max_txn_id: TxnId, pred: F) -> Option<HeapIterator>
    where
        F: Fn(&[u8]) -> Ordering,
    {
        let mut items = Vec::new();
        let active = self.active.read();
        let frozen = self.frozen.read();
        Self::collect_monotone(&active, &pred, 0, &mut items);
        for (idx, table) in frozen.tables.iter().enumerate() {
            Self::collect_monotone(table, &pred, idx + 1, &mut items);
        }
        if items.is_empty() {
            return None;
        }
        Some(HeapIterator::new(items, max_txn_id))
    }

    /// Byte size of the active skip list
    pub fn active_size(&self) -> usize {
        self.active.read().size_bytes()
    }

    /// Cached total byte size of the frozen generations
    pub fn frozen_size(&self) -> usize {
        self.frozen.read().bytes
    }

    /// Byte size across every generation
    pub fn total_size(&self) -> usize {
        // Lock order: active before frozen.
        let active = self.active.read();
        let frozen = self.frozen.read();
        active.size_bytes() + frozen.bytes
    }

    /// Moves the active list to the front of the frozen queue and installs
    /// a fresh one. Callers hold both write locks, active first.
    fn freeze_in_place(active: &mut SkipList, frozen: &mut FrozenTables) {
        let full = std::mem::take(active);
        frozen.bytes += full.size_bytes();
        frozen.tables.push_front(full);
    }

    fn maybe_freeze(&self, active: &mut SkipList) {
        if active.size_bytes() < self.size_limit {
            return;
        }
        info!(
            "memtable: active table reached {} bytes (limit {}), freezing",
            active.size_bytes(),
            self.size_limit
        );
        let mut frozen = self.frozen.write();
        Self::freeze_in_place(active, &mut frozen);
    }

    fn collect_prefix(table: &SkipList, prefix: &[u8], source: usize, items: &mut Vec<SearchItem>) {
        let mut it = table.prefix_begin(prefix);
        let end = table.prefix_end(prefix);
        while it != end {
            if let Some(entry) = it.entry() {
                items.push(SearchItem::new(entry.key, entry.value, source, 0, entry.txn_id));
            }
            it.advance();
        }
    }

    fn collect_monotone<F>(table: &SkipList, pred: F, source: usize, items: &mut Vec<SearchItem>)
    where
        F: Fn(&[u8]) -> Ordering,
    {
        let Some((mut it, end)) = table.monotone_range(pred) else {
            return;
        };
        while it != end {
            if let Some(entry) = it.entry() {
                items.push(SearchItem::new(entry.key, entry.value, source, 0, entry.txn_id));
            }
            it.advance();
        }
    }
}

impl fmt::Debug for MemTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Lock order: active before frozen.
        let active = self.active.read();
        let frozen = self.frozen.read();
        writeln!(f, "== active ({} bytes) ==", active.size_bytes())?;
        write!(f, "{:?}", *active)?;
        for (idx, table) in frozen.tables.iter().enumerate() {
            writeln!(f, "== frozen[{}] ({} bytes) ==", idx, table.size_bytes())?;
            write!(f, "{:?}", table)?;
        }
        Ok(())
    }
}
