use crate::card::{Card, TreeStats};

/// Cardinality of a fully dense trie: every `i32`.
pub(crate) const FULL_LEN: u64 = 1 << 32;

/// The five-level bitmap trie together with its member count.
///
/// `len` always equals the number of values the iterator reaches; it is kept
/// as `u64` because a dense root holds `2^32` members.
#[derive(Clone, Debug, Default)]
pub(crate) struct Tree {
    pub(crate) root: Card,
    pub(crate) len: u64,
}

impl Tree {
    /// An empty trie: the root exists but holds no storage.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A trie whose root is dense, holding every `i32`.
    pub(crate) fn full() -> Self {
        Self {
            root: Card::Full,
            len: FULL_LEN,
        }
    }

    /// Insert `value`. Returns `true` if it was not yet a member.
    ///
    /// With `compact` unset no card ever collapses, trading memory for speed.
    pub(crate) fn add(&mut self, value: i32, compact: bool) -> bool {
        let added = self.root.insert(value, 0, compact).flipped();
        if added {
            self.len += 1;
        }
        added
    }

    /// Remove `value`. Returns `true` if it was a member.
    pub(crate) fn remove(&mut self, value: i32, compact: bool) -> bool {
        let removed = self.root.remove(value, 0, compact).flipped();
        if removed {
            debug_assert!(self.len > 0, "removed a member from an empty trie");
            self.len -= 1;
        }
        removed
    }

    pub(crate) fn contains(&self, value: i32) -> bool {
        self.root.contains(value)
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }

    /// Run one bottom-up compaction pass over the whole trie.
    pub(crate) fn compact(&mut self) {
        self.root.compact();
    }

    pub(crate) fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        self.root.collect_stats(0, &mut stats);
        stats
    }
}
