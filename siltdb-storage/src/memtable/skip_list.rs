//! Ordered in-memory index backed by a skip list
//!
//! The skip list is the unit of write buffering: every node carries a key,
//! a value, a transaction id, and per-level forward/backward links.
//! Nodes live in an arena (`Vec<Node>` plus a free list) so forward links
//! own their successors through the arena while backward links are plain
//! non-owning indices — no reference cycles, no interior mutability.
//!
//! The list performs no internal synchronisation. It is a single-writer
//! structure: mutation requires `&mut self`, and the multi-reader /
//! single-writer discipline is enforced by the [`MemTable`] locks that
//! wrap it.
//!
//! ```text
//! Level 3:  HEAD ──────────────────────────────► 50 ──────────► NIL
//! Level 2:  HEAD ──────────► 20 ────────────────► 50 ──────────► NIL
//! Level 1:  HEAD ──► 10 ──► 20 ────► 35 ────────► 50 ──► 60 ──► NIL
//! Level 0:  HEAD ──► 10 ──► 20 ──► 25 ──► 35 ──► 50 ──► 60 ──► 70 ► NIL
//! ```
//!
//! [`MemTable`]: super::MemTable

use std::cmp::Ordering;
use std::fmt;

use log::{debug, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};

use siltdb_core::{Entry, Key, TxnId, Value};

/// Maximum height of the skip list. LevelDB uses 12.
pub const MAX_HEIGHT: usize = 12;

/// Arena index of the head sentinel.
const HEAD: usize = 0;

/// A single node in the skip list
///
/// `forward` and `backward` both have length equal to the node's height.
/// The head sentinel is the only node with an empty key in a well-formed
/// list; backward links exist solely for the leftward walk in
/// [`SkipList::monotone_range`].
struct Node {
    key: Key,
    value: Value,
    txn_id: TxnId,
    forward: Vec<Option<usize>>,
    backward: Vec<Option<usize>>,
}

impl Node {
    fn new(key: Key, value: Value, txn_id: TxnId, height: usize) -> Self {
        Self {
            key,
            value,
            txn_id,
            forward: vec![None; height],
            backward: vec![None; height],
        }
    }

    fn height(&self) -> usize {
        self.forward.len()
    }

    /// Byte charge of one entry: 8 bytes for the txn id plus key and value.
    fn charge(&self) -> usize {
        8 + self.key.len() + self.value.len()
    }
}

/// A probabilistic sorted container with O(log n) expected search depth
///
/// Keys along every level's forward chain are strictly ascending, and no
/// two nodes share a key: `put` with an existing key overwrites the value
/// in place. An empty value is the tombstone marker at the layer above;
/// the skip list itself stores it like any other value.
pub struct SkipList {
    nodes: Vec<Node>,
    free: Vec<usize>,
    max_height: usize,
    /// Highest occupied level, clamped to at least 1.
    height: usize,
    len: usize,
    size_bytes: usize,
    rng: StdRng,
}

impl SkipList {
    /// Creates an empty skip list with the default maximum height
    pub fn new() -> Self {
        Self::with_max_height(MAX_HEIGHT)
    }

    /// Creates an empty skip list with a custom maximum height
    pub fn with_max_height(max_height: usize) -> Self {
        let max_height = max_height.max(1);
        Self {
            nodes: vec![Node::new(Key::new(), Value::new(), 0, max_height)],
            free: Vec::new(),
            max_height,
            height: 1,
            len: 0,
            size_bytes: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Generates a random height for a new node
    ///
    /// Coin-flip per level: height h with probability 2^-h, capped at the
    /// configured maximum.
    fn random_height(&mut self) -> usize {
        let mut height = 1;
        while height < self.max_height && self.rng.gen_bool(0.5) {
            height += 1;
        }
        height
    }

    fn alloc(&mut self, node: Node) -> usize {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = node;
            idx
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    /// Inserts a key-value pair, overwriting the value in place if the key
    /// already exists
    ///
    /// An in-place overwrite keeps the transaction id already stored on the
    /// node; only the value (and the byte-size accounting) changes.
    /// The empty key is reserved for the head sentinel and must not be
    /// inserted.
    pub fn put(&mut self, key: Key, value: Value, txn_id: TxnId) {
        trace!(
            "skiplist put: key={:?} value_len={} txn_id={}",
            String::from_utf8_lossy(&key),
            value.len(),
            txn_id
        );
        debug_assert!(!key.is_empty(), "the empty key is reserved for the head sentinel");

        let mut preds = vec![HEAD; self.max_height];
        let mut cur = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[cur].forward[level] {
                if self.nodes[next].key < key {
                    cur = next;
                } else {
                    break;
                }
            }
            preds[level] = cur;
        }

        if let Some(next) = self.nodes[cur].forward[0] {
            if self.nodes[next].key == key {
                self.size_bytes += value.len();
                self.size_bytes -= self.nodes[next].value.len();
                self.nodes[next].value = value;
                return;
            }
        }

        let height = self.random_height();
        if height > self.height {
            // Predecessors at the new levels are already the head.
            self.height = height;
        }

        let idx = self.alloc(Node::new(key, value, txn_id, height));
        for (level, &pred) in preds.iter().enumerate().take(height) {
            let succ = self.nodes[pred].forward[level];
            self.nodes[idx].forward[level] = succ;
            self.nodes[idx].backward[level] = Some(pred);
            self.nodes[pred].forward[level] = Some(idx);
            if let Some(succ) = succ {
                self.nodes[succ].backward[level] = Some(idx);
            }
        }

        let charge = self.nodes[idx].charge();
        self.size_bytes += charge;
        self.len += 1;
    }

    /// Looks up a key, returning a cursor at the matching node
    ///
    /// The cursor is exhausted when the key is absent. A valid cursor with
    /// an empty value is a tombstone; the caller tells the two apart by
    /// inspecting the value.
    pub fn get(&self, key: &[u8]) -> SkipListIterator<'_> {
        trace!("skiplist get: key={:?}", String::from_utf8_lossy(key));

        let mut cur = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[cur].forward[level] {
                if self.nodes[next].key.as_slice() < key {
                    cur = next;
                } else {
                    break;
                }
            }
        }
        match self.nodes[cur].forward[0] {
            Some(next) if self.nodes[next].key == key => SkipListIterator {
                list: self,
                node: Some(next),
            },
            _ => self.end(),
        }
    }

    /// Physically unlinks a key from the list
    ///
    /// This is the skip list's true remove, kept for completeness and
    /// tests; the memtable above expresses deletion as a put with an empty
    /// value instead.
    pub fn remove(&mut self, key: &[u8]) {
        let mut preds = vec![HEAD; self.max_height];
        let mut cur = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[cur].forward[level] {
                if self.nodes[next].key.as_slice() < key {
                    cur = next;
                } else {
                    break;
                }
            }
            preds[level] = cur;
        }

        let victim = match self.nodes[cur].forward[0] {
            Some(next) if self.nodes[next].key == key => next,
            _ => {
                trace!("skiplist remove: key={:?} not found", String::from_utf8_lossy(key));
                return;
            }
        };

        for (level, &pred) in preds.iter().enumerate().take(self.height) {
            if self.nodes[pred].forward[level] != Some(victim) {
                break;
            }
            self.nodes[pred].forward[level] = self.nodes[victim].forward[level];
        }
        for level in 0..self.nodes[victim].height() {
            if let Some(succ) = self.nodes[victim].forward[level] {
                self.nodes[succ].backward[level] = Some(preds[level]);
            }
        }

        let charge = self.nodes[victim].charge();
        self.size_bytes -= charge;
        self.len -= 1;
        self.nodes[victim] = Node::new(Key::new(), Value::new(), 0, 0);
        self.free.push(victim);

        while self.height > 1 && self.nodes[HEAD].forward[self.height - 1].is_none() {
            self.height -= 1;
        }
    }

    /// Cursor at the first entry
    pub fn iter(&self) -> SkipListIterator<'_> {
        SkipListIterator {
            list: self,
            node: self.nodes[HEAD].forward[0],
        }
    }

    /// Exhausted cursor, the terminal position of every traversal
    pub fn end(&self) -> SkipListIterator<'_> {
        SkipListIterator { list: self, node: None }
    }

    /// Compares the leading bytes of `key` against `prefix`
    ///
    /// Mirrors the semantics of comparing `key[..prefix.len()]` with the
    /// prefix, treating a short key as less than any prefix it is a proper
    /// prefix of.
    fn prefix_cmp(key: &[u8], prefix: &[u8]) -> Ordering {
        let n = key.len().min(prefix.len());
        key[..n].cmp(prefix)
    }

    /// Cursor at the first key that has `prefix` as prefix, or exhausted
    /// when no such key exists
    ///
    /// `prefix_begin(b"")` is equivalent to [`iter`](Self::iter).
    pub fn prefix_begin(&self, prefix: &[u8]) -> SkipListIterator<'_> {
        let mut cur = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[cur].forward[level] {
                if Self::prefix_cmp(&self.nodes[next].key, prefix) == Ordering::Less {
                    cur = next;
                } else {
                    break;
                }
            }
        }
        match self.nodes[cur].forward[0] {
            Some(next) if self.nodes[next].key.starts_with(prefix) => SkipListIterator {
                list: self,
                node: Some(next),
            },
            _ => self.end(),
        }
    }

    /// Cursor just past the last key that has `prefix` as prefix
    ///
    /// `prefix_end(b"")` is equivalent to [`end`](Self::end). Iterating
    /// from [`prefix_begin`](Self::prefix_begin) to this cursor yields
    /// exactly the keys starting with `prefix`, ascending.
    pub fn prefix_end(&self, prefix: &[u8]) -> SkipListIterator<'_> {
        let mut cur = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[cur].forward[level] {
                if Self::prefix_cmp(&self.nodes[next].key, prefix) != Ordering::Greater {
                    cur = next;
                } else {
                    break;
                }
            }
        }
        SkipListIterator {
            list: self,
            node: self.nodes[cur].forward[0],
        }
    }

    /// Locates the contiguous key range satisfying a monotone predicate
    ///
    /// The predicate reports where a key stands relative to the range it
    /// accepts: `Less` means the key lies below the range (the scan must
    /// move right), `Equal` means inside, `Greater` means past it. The
    /// accepted set must be contiguous in key order — prefix matching is
    /// the canonical example.
    ///
    /// Returns the `(start, end)` cursor pair delimiting the range, or
    /// `None` when no key satisfies the predicate. This is the one caller
    /// of the backward links: after descending to any witness inside the
    /// range, the start is found by walking left.
    pub fn monotone_range<F>(&self, pred: F) -> Option<(SkipListIterator<'_>, SkipListIterator<'_>)>
    where
        F: Fn(&[u8]) -> Ordering,
    {
        let mut cur = HEAD;
        let mut witness = None;
        let mut found_level = 0;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[cur].forward[level] {
                if pred(&self.nodes[next].key) == Ordering::Less {
                    cur = next;
                } else {
                    break;
                }
            }
            if let Some(next) = self.nodes[cur].forward[level] {
                if pred(&self.nodes[next].key) == Ordering::Equal {
                    witness = Some(next);
                    found_level = level;
                    break;
                }
            }
        }
        let witness = witness?;

        // Right boundary: extend along decreasing levels while still inside.
        let mut last = witness;
        for level in (0..=found_level).rev() {
            while let Some(next) = self.nodes[last].forward[level] {
                if pred(&self.nodes[next].key) == Ordering::Equal {
                    last = next;
                } else {
                    break;
                }
            }
        }

        // Left boundary: walk backward links. Every node reached through
        // backward[level] participates at that level, and the sentinel's
        // empty key never counts as a witness.
        let mut first = witness;
        for level in (0..=found_level).rev() {
            while let Some(prev) = self.nodes[first].backward[level] {
                if !self.nodes[prev].key.is_empty() && pred(&self.nodes[prev].key) == Ordering::Equal {
                    first = prev;
                } else {
                    break;
                }
            }
        }

        Some((
            SkipListIterator { list: self, node: Some(first) },
            SkipListIterator { list: self, node: self.nodes[last].forward[0] },
        ))
    }

    /// Emits every entry in key order by walking level 0 once
    ///
    /// Does not mutate the list; this is the snapshot a flush feeds to the
    /// sorted-table builder.
    pub fn flush(&self) -> Vec<Entry> {
        debug!("skiplist flush: walking {} entries", self.len);

        let mut data = Vec::with_capacity(self.len);
        let mut node = self.nodes[HEAD].forward[0];
        while let Some(idx) = node {
            let n = &self.nodes[idx];
            data.push(Entry::new(n.key.clone(), n.value.clone(), n.txn_id));
            node = n.forward[0];
        }
        data
    }

    /// Drops every entry and resets the list to its empty state
    pub fn clear(&mut self) {
        let max_height = self.max_height;
        self.nodes.clear();
        self.nodes.push(Node::new(Key::new(), Value::new(), 0, max_height));
        self.free.clear();
        self.height = 1;
        self.len = 0;
        self.size_bytes = 0;
    }

    /// Number of entries in the skip list
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the skip list holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Tracked memory charge: `8 + |key| + |value|` summed over entries
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Highest occupied level, at least 1
    pub fn height(&self) -> usize {
        self.height
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SkipList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in (0..self.height).rev() {
            write!(f, "L{}:", level)?;
            let mut node = self.nodes[HEAD].forward[level];
            while let Some(idx) = node {
                let n = &self.nodes[idx];
                write!(
                    f,
                    " {}({})",
                    String::from_utf8_lossy(&n.key),
                    String::from_utf8_lossy(&n.value)
                )?;
                node = n.forward[level];
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Forward cursor over skip-list entries in key order
///
/// Advances along level-0 links; the only terminal state is a `None`
/// position. The cursor borrows its list and must not outlive it —
/// anything that crosses a lock boundary snapshots entries out instead.
#[derive(Clone, Copy)]
pub struct SkipListIterator<'a> {
    list: &'a SkipList,
    node: Option<usize>,
}

impl<'a> SkipListIterator<'a> {
    /// Whether the cursor points at a real entry (not exhausted, not the
    /// head sentinel)
    pub fn is_valid(&self) -> bool {
        self.node
            .map_or(false, |idx| !self.list.nodes[idx].key.is_empty())
    }

    /// Whether the cursor has reached the terminal position
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Key at the cursor, `None` past the end
    pub fn key(&self) -> Option<&'a [u8]> {
        self.node.map(|idx| self.list.nodes[idx].key.as_slice())
    }

    /// Value at the cursor, `None` past the end
    ///
    /// An empty value on a valid cursor is a tombstone.
    pub fn value(&self) -> Option<&'a [u8]> {
        self.node.map(|idx| self.list.nodes[idx].value.as_slice())
    }

    /// Transaction id at the cursor, `None` past the end
    pub fn txn_id(&self) -> Option<TxnId> {
        self.node.map(|idx| self.list.nodes[idx].txn_id)
    }

    /// Owned copy of the entry at the cursor, `None` when the cursor is
    /// not valid
    pub fn entry(&self) -> Option<Entry> {
        if !self.is_valid() {
            return None;
        }
        let idx = self.node?;
        let n = &self.list.nodes[idx];
        Some(Entry::new(n.key.clone(), n.value.clone(), n.txn_id))
    }

    /// Steps the cursor to its level-0 successor
    pub fn advance(&mut self) {
        if let Some(idx) = self.node {
            self.node = self.list.nodes[idx].forward[0];
        }
    }
}

impl fmt::Debug for SkipListIterator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key() {
            Some(key) => write!(f, "SkipListIterator({:?})", String::from_utf8_lossy(key)),
            None => write!(f, "SkipListIterator(end)"),
        }
    }
}

impl PartialEq for SkipListIterator<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.node, other.node) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::eq(self.list, other.list) && a == b,
            _ => false,
        }
    }
}

impl Eq for SkipListIterator<'_> {}

impl Iterator for SkipListIterator<'_> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        let entry = self.entry()?;
        self.advance();
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    /// Walks the whole structure and checks every structural invariant.
    fn check_invariants(list: &SkipList) {
        assert!(list.height >= 1);

        let mut live = Vec::new();
        let mut node = list.nodes[HEAD].forward[0];
        while let Some(idx) = node {
            live.push(idx);
            node = list.nodes[idx].forward[0];
        }

        assert_eq!(live.len(), list.len());

        let expected_bytes: usize = live.iter().map(|&idx| list.nodes[idx].charge()).sum();
        assert_eq!(list.size_bytes(), expected_bytes);

        let max_live_height = live
            .iter()
            .map(|&idx| list.nodes[idx].height())
            .max()
            .unwrap_or(1);
        assert_eq!(list.height, max_live_height.max(1));

        for level in 0..list.height {
            let mut node = list.nodes[HEAD].forward[level];
            let mut prev_key: Option<&[u8]> = None;
            while let Some(idx) = node {
                let n = &list.nodes[idx];
                assert!(n.height() > level);
                if let Some(prev) = prev_key {
                    assert!(prev < n.key.as_slice(), "keys not ascending at level {}", level);
                }
                // A higher-level successor never precedes the level-0 one.
                if level > 0 {
                    if let (Some(hi), Some(lo)) = (n.forward[level], n.forward[0]) {
                        assert!(list.nodes[hi].key >= list.nodes[lo].key);
                    }
                }
                prev_key = Some(n.key.as_slice());
                node = n.forward[level];
            }
        }
    }

    fn collect(list: &SkipList) -> Vec<(Key, Value)> {
        list.iter().map(|e| (e.key, e.value)).collect()
    }

    #[test]
    fn test_put_and_get() {
        let mut list = SkipList::new();
        list.put(b"key1".to_vec(), b"value1".to_vec(), 1);
        list.put(b"key2".to_vec(), b"value2".to_vec(), 2);
        list.put(b"key3".to_vec(), b"value3".to_vec(), 3);

        assert_eq!(list.len(), 3);
        let cursor = list.get(b"key2");
        assert!(cursor.is_valid());
        assert_eq!(cursor.value(), Some(b"value2".as_slice()));
        assert_eq!(cursor.txn_id(), Some(2));

        assert!(!list.get(b"missing").is_valid());
        assert!(list.get(b"missing").is_end());
        check_invariants(&list);
    }

    #[test]
    fn test_put_overwrites_in_place() {
        let mut list = SkipList::new();
        list.put(b"k".to_vec(), b"v1".to_vec(), 7);
        let before = list.size_bytes();

        list.put(b"k".to_vec(), b"longer".to_vec(), 99);

        assert_eq!(list.len(), 1);
        assert_eq!(list.size_bytes(), before - 2 + 6);
        let cursor = list.get(b"k");
        assert_eq!(cursor.value(), Some(b"longer".as_slice()));
        // Overwriting keeps the transaction id already stored on the node.
        assert_eq!(cursor.txn_id(), Some(7));
        check_invariants(&list);
    }

    #[test]
    fn test_put_idempotent() {
        let mut list = SkipList::new();
        list.put(b"k".to_vec(), b"v".to_vec(), 1);
        let bytes = list.size_bytes();
        list.put(b"k".to_vec(), b"v".to_vec(), 1);

        assert_eq!(list.len(), 1);
        assert_eq!(list.size_bytes(), bytes);
    }

    #[test]
    fn test_tombstone_is_a_valid_hit() {
        let mut list = SkipList::new();
        list.put(b"k".to_vec(), b"v".to_vec(), 1);
        list.put(b"k".to_vec(), Vec::new(), 2);

        let cursor = list.get(b"k");
        assert!(cursor.is_valid());
        assert_eq!(cursor.value(), Some(b"".as_slice()));
    }

    #[test]
    fn test_iteration_is_sorted() {
        let mut list = SkipList::new();
        for key in ["d", "a", "c", "b", "e"] {
            list.put(key.as_bytes().to_vec(), b"v".to_vec(), 0);
        }

        let keys: Vec<Key> = list.iter().map(|e| e.key).collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec(), b"e".to_vec()]);
        check_invariants(&list);
    }

    #[test]
    fn test_size_accounting() {
        let mut list = SkipList::new();
        assert_eq!(list.size_bytes(), 0);

        list.put(b"abc".to_vec(), b"xy".to_vec(), 1);
        assert_eq!(list.size_bytes(), 8 + 3 + 2);

        list.put(b"q".to_vec(), b"longvalue".to_vec(), 2);
        assert_eq!(list.size_bytes(), (8 + 3 + 2) + (8 + 1 + 9));

        list.remove(b"abc");
        assert_eq!(list.size_bytes(), 8 + 1 + 9);
        check_invariants(&list);
    }

    #[test]
    fn test_remove() {
        let mut list = SkipList::new();
        for key in ["a", "b", "c", "d"] {
            list.put(key.as_bytes().to_vec(), b"v".to_vec(), 0);
        }

        list.remove(b"b");
        list.remove(b"nope");

        assert_eq!(list.len(), 3);
        assert!(!list.get(b"b").is_valid());
        assert!(list.get(b"c").is_valid());
        check_invariants(&list);
    }

    #[test]
    fn test_remove_lowers_height() {
        let mut list = SkipList::new();
        for i in 0..64u32 {
            list.put(format!("key{:02}", i).into_bytes(), b"v".to_vec(), 0);
        }
        check_invariants(&list);

        for i in 0..64u32 {
            list.remove(format!("key{:02}", i).as_bytes());
        }

        assert!(list.is_empty());
        assert_eq!(list.height(), 1);
        assert_eq!(list.size_bytes(), 0);
        check_invariants(&list);
    }

    #[test]
    fn test_reinsert_after_remove() {
        let mut list = SkipList::new();
        list.put(b"k".to_vec(), b"v1".to_vec(), 1);
        list.remove(b"k");
        list.put(b"k".to_vec(), b"v2".to_vec(), 2);

        let cursor = list.get(b"k");
        assert_eq!(cursor.value(), Some(b"v2".as_slice()));
        assert_eq!(cursor.txn_id(), Some(2));
        check_invariants(&list);
    }

    #[test]
    fn test_prefix_range() {
        let mut list = SkipList::new();
        list.put(b"app".to_vec(), b"1".to_vec(), 0);
        list.put(b"apple".to_vec(), b"2".to_vec(), 0);
        list.put(b"apply".to_vec(), b"3".to_vec(), 0);
        list.put(b"banana".to_vec(), b"4".to_vec(), 0);

        let mut it = list.prefix_begin(b"app");
        let end = list.prefix_end(b"app");
        let mut found = Vec::new();
        while it != end {
            found.push((it.key().unwrap().to_vec(), it.value().unwrap().to_vec()));
            it.advance();
        }
        assert_eq!(
            found,
            vec![
                (b"app".to_vec(), b"1".to_vec()),
                (b"apple".to_vec(), b"2".to_vec()),
                (b"apply".to_vec(), b"3".to_vec()),
            ]
        );
    }

    #[test]
    fn test_prefix_range_absent() {
        let mut list = SkipList::new();
        list.put(b"banana".to_vec(), b"4".to_vec(), 0);

        assert!(list.prefix_begin(b"app").is_end());
        assert_eq!(list.prefix_begin(b"app"), list.end());
    }

    #[test]
    fn test_empty_prefix_spans_everything() {
        let mut list = SkipList::new();
        list.put(b"a".to_vec(), b"1".to_vec(), 0);
        list.put(b"b".to_vec(), b"2".to_vec(), 0);

        assert_eq!(list.prefix_begin(b""), list.iter());
        assert_eq!(list.prefix_end(b""), list.end());
    }

    #[test]
    fn test_monotone_range() {
        let mut list = SkipList::new();
        for key in ["aa", "ab", "ac", "ba", "bb"] {
            list.put(key.as_bytes().to_vec(), b"v".to_vec(), 0);
        }

        let range = list.monotone_range(|key| {
            if key.starts_with(b"a") {
                Ordering::Equal
            } else if key < b"a".as_slice() {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        });

        let (mut it, end) = range.expect("range with witnesses");
        let mut keys = Vec::new();
        while it != end {
            keys.push(it.key().unwrap().to_vec());
            it.advance();
        }
        assert_eq!(keys, vec![b"aa".to_vec(), b"ab".to_vec(), b"ac".to_vec()]);
    }

    #[test]
    fn test_monotone_range_empty_zero_set() {
        let mut list = SkipList::new();
        list.put(b"m".to_vec(), b"v".to_vec(), 0);

        let range = list.monotone_range(|key| {
            if key < b"x".as_slice() {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        });
        assert!(range.is_none());
    }

    #[test]
    fn test_monotone_range_in_middle() {
        let mut list = SkipList::new();
        for i in 0..100u32 {
            list.put(format!("k{:03}", i).into_bytes(), b"v".to_vec(), 0);
        }

        let (mut it, end) = list
            .monotone_range(|key| {
                if key < b"k040".as_slice() {
                    Ordering::Less
                } else if key <= b"k049".as_slice() {
                    Ordering::Equal
                } else {
                    Ordering::Greater
                }
            })
            .expect("decade of keys");

        let mut count = 0;
        let mut first = None;
        let mut last = None;
        while it != end {
            if first.is_none() {
                first = it.key().map(|k| k.to_vec());
            }
            last = it.key().map(|k| k.to_vec());
            count += 1;
            it.advance();
        }
        assert_eq!(count, 10);
        assert_eq!(first, Some(b"k040".to_vec()));
        assert_eq!(last, Some(b"k049".to_vec()));
    }

    #[test]
    fn test_flush_is_sorted_level0_walk() {
        let mut list = SkipList::new();
        list.put(b"c".to_vec(), b"3".to_vec(), 30);
        list.put(b"a".to_vec(), b"1".to_vec(), 10);
        list.put(b"b".to_vec(), b"2".to_vec(), 20);

        let data = list.flush();
        assert_eq!(
            data,
            vec![
                Entry::new(b"a".to_vec(), b"1".to_vec(), 10),
                Entry::new(b"b".to_vec(), b"2".to_vec(), 20),
                Entry::new(b"c".to_vec(), b"3".to_vec(), 30),
            ]
        );
        // Flushing does not mutate the list.
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut list = SkipList::new();
        for key in ["a", "b", "c"] {
            list.put(key.as_bytes().to_vec(), b"v".to_vec(), 0);
        }

        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.size_bytes(), 0);
        assert_eq!(list.height(), 1);
        assert!(list.iter().next().is_none());
        check_invariants(&list);
    }

    #[test]
    fn test_cursor_equality() {
        let mut list = SkipList::new();
        list.put(b"a".to_vec(), b"1".to_vec(), 0);

        assert_eq!(list.get(b"a"), list.iter());
        assert_ne!(list.get(b"a"), list.end());
        assert_eq!(list.get(b"missing"), list.end());
    }

    proptest! {
        #[test]
        fn prop_matches_btreemap_model(
            ops in prop::collection::vec(
                (
                    prop::sample::select(vec!["a", "ab", "abc", "b", "bc", "c", "ca", "d"]),
                    prop::collection::vec(any::<u8>(), 0..8),
                    any::<bool>(),
                ),
                0..120,
            )
        ) {
            let mut list = SkipList::new();
            let mut model: BTreeMap<Key, Value> = BTreeMap::new();

            for (key, value, is_remove) in ops {
                let key = key.as_bytes().to_vec();
                if is_remove {
                    list.remove(&key);
                    model.remove(&key);
                } else {
                    list.put(key.clone(), value.clone(), 0);
                    model.insert(key, value);
                }
            }

            check_invariants(&list);
            let expected: Vec<(Key, Value)> =
                model.into_iter().collect();
            prop_assert_eq!(collect(&list), expected);
        }
    }
}
