use std::cell::RefCell;
use std::iter::FusedIterator;
use std::rc::Rc;

use crate::card::{Card, FULL};
use crate::index::{BRANCH_WIDTH, LEAF_BYTES, LEAF_LEVEL, block_bounds, shift, slot_for_rank};
use crate::tree::Tree;

/// Order in which a traversal visits values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Ascending,
    Descending,
}

/// Snapshot of one leaf's members, restricted to a query window.
///
/// Bit `i` of the 256-bit mask stands for the value `prefix | i`. Words are
/// little-endian over the leaf bytes, so byte `k` bit `j` lands at `8k + j`.
#[derive(Clone, Copy, Debug, Default)]
struct LeafBits {
    prefix: u32,
    words: [u64; 4],
}

impl LeafBits {
    fn from_bytes(prefix: u32, bytes: &[u8; LEAF_BYTES]) -> Self {
        let mut words = [0u64; 4];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut le = [0u8; 8];
            le.copy_from_slice(chunk);
            *word = u64::from_le_bytes(le);
        }
        Self { prefix, words }
    }

    fn full(prefix: u32) -> Self {
        Self {
            prefix,
            words: [u64::MAX; 4],
        }
    }

    /// Drop the bits outside `[lo, hi]`. Returns `None` if nothing is left.
    fn clamped(mut self, lo: i32, hi: i32) -> Option<Self> {
        let (min, max) = block_bounds(self.prefix, LEAF_LEVEL);
        if hi < min || lo > max {
            return None;
        }

        let from = (i64::from(lo) - i64::from(min)).max(0) as u32;
        let to = (i64::from(hi) - i64::from(min)).min(255) as u32;

        for (w, word) in self.words.iter_mut().enumerate() {
            let base = 64 * w as u32;
            if to < base || from > base + 63 {
                *word = 0;
                continue;
            }
            let lo_bit = from.saturating_sub(base);
            let hi_bit = (to - base).min(63);
            *word &= (u64::MAX >> (63 - hi_bit)) & (u64::MAX << lo_bit);
        }

        (!self.is_empty()).then_some(self)
    }

    fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    #[inline]
    fn value(&self, offset: u32) -> i32 {
        (self.prefix | offset) as i32
    }

    /// Take the smallest remaining member.
    fn pop_min(&mut self) -> Option<i32> {
        for (w, word) in self.words.iter_mut().enumerate() {
            if *word != 0 {
                let bit = word.trailing_zeros();
                *word &= *word - 1;
                return Some(self.value(64 * w as u32 + bit));
            }
        }
        None
    }

    /// Take the largest remaining member.
    fn pop_max(&mut self) -> Option<i32> {
        for (w, word) in self.words.iter_mut().enumerate().rev() {
            if *word != 0 {
                let bit = 63 - word.leading_zeros();
                *word &= !(1u64 << bit);
                return Some(self.value(64 * w as u32 + bit));
            }
        }
        None
    }
}

/// Find the first leaf, in `direction`, below `card` that holds a member
/// inside `[lo, hi]`.
///
/// `card` sits at `level` and its decided bits are `prefix`. Children whose
/// block range misses the window are skipped; once a child lies past the
/// window in the walking direction no later sibling can intersect it, so the
/// scan stops. Dense cards are expanded on the fly through [`FULL`].
fn seek(
    card: &Card,
    level: usize,
    prefix: u32,
    lo: i32,
    hi: i32,
    direction: Direction,
) -> Option<LeafBits> {
    match card {
        Card::Empty => None,
        Card::Leaf(bytes) => LeafBits::from_bytes(prefix, bytes).clamped(lo, hi),
        Card::Full if level == LEAF_LEVEL => LeafBits::full(prefix).clamped(lo, hi),
        Card::Full | Card::Branch(_) => {
            let shift = shift(level);
            let ranks = (0..BRANCH_WIDTH).map(|rank| match direction {
                Direction::Ascending => rank,
                Direction::Descending => BRANCH_WIDTH - 1 - rank,
            });

            for rank in ranks {
                let slot = slot_for_rank(level, rank);
                let child_prefix = prefix | ((slot as u32) << shift);
                let (min, max) = block_bounds(child_prefix, level + 1);

                match direction {
                    Direction::Ascending => {
                        if min > hi {
                            break;
                        }
                        if max < lo {
                            continue;
                        }
                    }
                    Direction::Descending => {
                        if max < lo {
                            break;
                        }
                        if min > hi {
                            continue;
                        }
                    }
                }

                let child = match card {
                    Card::Branch(children) => &children[slot],
                    _ => &FULL,
                };
                if let Some(hit) = seek(child, level + 1, child_prefix, lo, hi, direction) {
                    return Some(hit);
                }
            }
            None
        }
    }
}

/// Lazy ordered iterator over the members of an [`IntSet`](crate::IntSet).
///
/// The iterator keeps a window `[lo, hi]` of values not yet visited and a
/// snapshot of at most two leaves (one per end). Each time a leaf runs dry
/// the trie is searched again from the root for the next leaf inside the
/// window, so the tree is only borrowed for the duration of that search.
/// Members added or removed beyond the current leaves are observed; the
/// leaves already taken are not re-read.
///
/// The iterator is double-ended: `next` walks in the iterator's own
/// direction and `next_back` walks against it.
pub struct Iter {
    tree: Rc<RefCell<Tree>>,
    window: Option<(i32, i32)>,
    /// Leaf consumed from its low end.
    low: LeafBits,
    /// Leaf consumed from its high end.
    high: LeafBits,
    direction: Direction,
}

impl Iter {
    pub(crate) fn new(tree: Rc<RefCell<Tree>>, lo: i32, hi: i32, direction: Direction) -> Self {
        Self {
            tree,
            window: (lo <= hi).then_some((lo, hi)),
            low: LeafBits::default(),
            high: LeafBits::default(),
            direction,
        }
    }

    fn seek(&self, direction: Direction) -> Option<LeafBits> {
        let (lo, hi) = self.window?;
        let tree = self.tree.borrow();
        seek(&tree.root, 0, 0, lo, hi, direction)
    }

    /// Next member in ascending order.
    fn next_up(&mut self) -> Option<i32> {
        loop {
            if let Some(value) = self.low.pop_min() {
                return Some(value);
            }

            let Some(leaf) = self.seek(Direction::Ascending) else {
                self.window = None;
                return self.high.pop_min();
            };

            let (_, max) = block_bounds(leaf.prefix, LEAF_LEVEL);
            self.window = self
                .window
                .and_then(|(_, hi)| max.checked_add(1).filter(|&lo| lo <= hi).map(|lo| (lo, hi)));
            self.low = leaf;
        }
    }

    /// Next member in descending order.
    fn next_down(&mut self) -> Option<i32> {
        loop {
            if let Some(value) = self.high.pop_max() {
                return Some(value);
            }

            let Some(leaf) = self.seek(Direction::Descending) else {
                self.window = None;
                return self.low.pop_max();
            };

            let (min, _) = block_bounds(leaf.prefix, LEAF_LEVEL);
            self.window = self
                .window
                .and_then(|(lo, _)| min.checked_sub(1).filter(|&hi| hi >= lo).map(|hi| (lo, hi)));
            self.high = leaf;
        }
    }
}

impl Iterator for Iter {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        match self.direction {
            Direction::Ascending => self.next_up(),
            Direction::Descending => self.next_down(),
        }
    }
}

impl DoubleEndedIterator for Iter {
    fn next_back(&mut self) -> Option<i32> {
        match self.direction {
            Direction::Ascending => self.next_down(),
            Direction::Descending => self.next_up(),
        }
    }
}

impl FusedIterator for Iter {}
