//! k-way ordered merge across memtable generations
//!
//! Range scans over a memtable see several skip lists at once: the active
//! one and every frozen generation. [`HeapIterator`] merges one forward
//! traversal of each source into a single ascending stream with two rules:
//!
//! - **Newest wins**: when several sources hold the same key, only the
//!   entry from the newest source (smallest source index) is emitted.
//! - **Tombstones shadow**: a deletion marker (empty value) suppresses the
//!   key entirely, across all sources.
//!
//! Items are snapshot-copied at construction, so the iterator owns its
//! data and never reaches back into the source skip lists.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;

use siltdb_core::{Entry, Error, Key, Result, TxnId, Value};

/// One candidate entry inside a merge, tagged with its source
///
/// Source index 0 is the active skip list, 1 the newest frozen generation,
/// and so on — smaller index means logically newer write. The level tag is
/// reserved for on-disk sources that are themselves arranged in levels.
#[derive(Debug, Clone)]
pub struct SearchItem {
    /// The key
    pub key: Key,
    /// The value (empty for tombstones)
    pub value: Value,
    /// Which source produced this item; smaller = newer
    pub source: usize,
    /// Level tag of the source, reserved for on-disk tables
    pub level: usize,
    /// Transaction id carried from the entry
    pub txn_id: TxnId,
}

impl SearchItem {
    /// Creates a new search item
    pub fn new(key: Key, value: Value, source: usize, level: usize, txn_id: TxnId) -> Self {
        Self {
            key,
            value,
            source,
            level,
            txn_id,
        }
    }
}

// Ordering is lexicographic on key ascending, ties broken by source index
// ascending, which is what newest-wins relies on. Equality deliberately
// ignores value, level, and txn id so it stays consistent with `Ord`.
impl PartialEq for SearchItem {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.source == other.source
    }
}

impl Eq for SearchItem {}

impl PartialOrd for SearchItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.source.cmp(&other.source))
    }
}

/// Merges many sorted sources into one ascending, newest-wins stream
///
/// Built from the search items of every participating source plus a
/// `max_txn_id` bound (`0` means transactions are disabled). While the
/// transaction visibility predicate remains a stub, a non-zero bound
/// accepts every item.
///
/// The iterator is at its end exactly when the heap is empty.
pub struct HeapIterator {
    heap: BinaryHeap<Reverse<SearchItem>>,
    max_txn_id: TxnId,
}

impl HeapIterator {
    /// Builds the merge and normalises it so the first item is legal
    pub fn new(items: Vec<SearchItem>, max_txn_id: TxnId) -> Self {
        let mut iter = Self {
            heap: items.into_iter().map(Reverse).collect(),
            max_txn_id,
        };
        iter.normalize();
        iter
    }

    /// Whether the merge is exhausted
    pub fn is_end(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether the merge still has an item to yield
    pub fn is_valid(&self) -> bool {
        !self.heap.is_empty()
    }

    /// The transaction-id bound this merge was built with
    pub fn max_txn_id(&self) -> TxnId {
        self.max_txn_id
    }

    /// Key and value of the current item, `None` at the end
    pub fn peek(&self) -> Option<(&[u8], &[u8])> {
        self.heap
            .peek()
            .map(|Reverse(item)| (item.key.as_slice(), item.value.as_slice()))
    }

    /// Key and value of the current item
    ///
    /// # Errors
    ///
    /// Returns [`Error::IteratorOutOfRange`] when the merge is exhausted.
    pub fn current(&self) -> Result<(&[u8], &[u8])> {
        self.peek().ok_or(Error::IteratorOutOfRange)
    }

    /// Whether the current top may be yielded as-is
    ///
    /// An empty heap is legal. With transactions disabled the top must not
    /// be a tombstone. With transactions enabled the visibility predicate
    /// is reserved and accepts everything for now.
    fn top_is_legal(&self) -> bool {
        let Some(Reverse(top)) = self.heap.peek() else {
            return true;
        };
        if self.max_txn_id == 0 {
            return !top.value.is_empty();
        }
        self.top_is_visible()
    }

    /// Visibility check against `max_txn_id`, reserved
    fn top_is_visible(&self) -> bool {
        true
    }

    /// Skips items written by transactions newer than the bound, reserved
    fn skip_by_txn_id(&mut self) {
        if self.max_txn_id == 0 {
            return;
        }
        // Filtering lands together with the visibility predicate.
    }

    /// Pops until the top is legal: a tombstone top drags down its whole
    /// equal-key run, shadowing every older write of that key.
    fn normalize(&mut self) {
        while !self.top_is_legal() {
            self.skip_by_txn_id();
            while let Some(Reverse(top)) = self.heap.peek() {
                if !top.value.is_empty() {
                    break;
                }
                let deleted = top.key.clone();
                while let Some(Reverse(item)) = self.heap.peek() {
                    if item.key == deleted {
                        self.heap.pop();
                    } else {
                        break;
                    }
                }
            }
        }
    }

    /// Steps past the current key: pops the top and every older item with
    /// the same key, then re-normalises.
    fn advance(&mut self) {
        let Some(Reverse(top)) = self.heap.pop() else {
            return;
        };
        let old_key = top.key;
        while let Some(Reverse(item)) = self.heap.peek() {
            if item.key == old_key {
                self.heap.pop();
            } else {
                break;
            }
        }
        self.normalize();
    }
}

impl fmt::Debug for HeapIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peek() {
            Some((key, value)) => write!(
                f,
                "HeapIterator({:?}={:?}, {} items)",
                String::from_utf8_lossy(key),
                String::from_utf8_lossy(value),
                self.heap.len()
            ),
            None => write!(f, "HeapIterator(end)"),
        }
    }
}

// Two merges compare equal when both are exhausted, or when their current
// items agree on key and value; the identity of the underlying sources is
// deliberately not part of equality.
impl PartialEq for HeapIterator {
    fn eq(&self, other: &Self) -> bool {
        match (self.heap.peek(), other.heap.peek()) {
            (None, None) => true,
            (Some(Reverse(a)), Some(Reverse(b))) => a.key == b.key && a.value == b.value,
            _ => false,
        }
    }
}

impl Eq for HeapIterator {}

impl Default for HeapIterator {
    /// An exhausted merge, the terminal position of every scan
    fn default() -> Self {
        Self::new(Vec::new(), 0)
    }
}

impl Iterator for HeapIterator {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        let Reverse(top) = self.heap.peek()?;
        let entry = Entry::new(top.key.clone(), top.value.clone(), top.txn_id);
        self.advance();
        Some(entry)
    }
}
