use std::fmt;
use std::mem;

use tracing::trace;

use crate::index::{
    BRANCH_WIDTH, LEAF_BYTES, LEAF_LEVEL, LEAF_SPAN, LEVELS, card_index, leaf_position,
};

/// A dense card, shared by traversals that need a child of a dense parent.
pub(crate) static FULL: Card = Card::Full;

/// An absent card, shared by traversals that need a child of an empty parent.
pub(crate) static EMPTY: Card = Card::Empty;

/// A trie node covering a contiguous sub-range of the `i32` domain.
///
/// Branch cards live at levels 0..=3 and own 64 child slots; leaf cards live
/// at level 4 and own a 256-bit bitmap. `Empty` and `Full` stand for a whole
/// sub-range being absent or present without materializing anything below.
#[derive(Clone, Debug, Default)]
pub(crate) enum Card {
    #[default]
    Empty,
    Full,
    Branch(Box<[Card; BRANCH_WIDTH]>),
    Leaf(Box<[u8; LEAF_BYTES]>),
}

/// Outcome of flipping one bit beneath a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Change {
    /// The bit already had the requested value.
    Unchanged,
    /// The bit flipped; the card keeps its explicit storage.
    Changed,
    /// The bit flipped and the card collapsed to `Full` (insert) or
    /// `Empty` (remove).
    Collapsed,
}

impl Change {
    #[inline]
    pub(crate) fn flipped(self) -> bool {
        self != Change::Unchanged
    }
}

impl Card {
    /// Materialize explicit, all-absent storage for a card at `level`.
    fn explicit(level: usize) -> Self {
        if level < LEAF_LEVEL {
            Card::Branch(Box::new(std::array::from_fn(|_| Card::Empty)))
        } else {
            Card::Leaf(Box::new([0; LEAF_BYTES]))
        }
    }

    /// Materialize explicit storage for a card at `level` with every child
    /// dense, or every bit set.
    fn explicit_full(level: usize) -> Self {
        if level < LEAF_LEVEL {
            Card::Branch(Box::new(std::array::from_fn(|_| Card::Full)))
        } else {
            Card::Leaf(Box::new([u8::MAX; LEAF_BYTES]))
        }
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        matches!(self, Card::Full)
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Card::Empty)
    }

    /// Collapse to `Full` if every child is dense, or every bit is set.
    ///
    /// Only direct children are inspected: a child that is logically full but
    /// still explicit keeps this card explicit.
    pub(crate) fn check_full(&mut self) -> bool {
        let full = match self {
            Card::Full => return true,
            Card::Empty => false,
            Card::Branch(children) => children.iter().all(Card::is_full),
            Card::Leaf(bytes) => bytes.iter().all(|&b| b == u8::MAX),
        };

        if full {
            *self = Card::Full;
        }
        full
    }

    /// Collapse to `Empty` if no member is left beneath this card.
    ///
    /// Children are checked recursively, so explicit-but-empty subtrees left
    /// behind by non-compacting removals are discarded as well.
    pub(crate) fn check_empty(&mut self) -> bool {
        let empty = match self {
            Card::Empty => return true,
            Card::Full => false,
            Card::Branch(children) => children.iter_mut().all(Card::check_empty),
            Card::Leaf(bytes) => bytes.iter().all(|&b| b == 0),
        };

        if empty {
            *self = Card::Empty;
        }
        empty
    }

    /// Replace a dense card at `level` by explicit storage whose children are
    /// all dense. Other cards are left untouched.
    fn split(&mut self, level: usize) {
        if self.is_full() {
            trace!(level, "splitting dense card");
            *self = Card::explicit_full(level);
        }
    }

    /// Set the bit of `value` beneath this card at `level`.
    ///
    /// Descent stops at the first dense card. With `compact` set, a leaf that
    /// becomes all-ones collapses and the collapse is retried on each ancestor
    /// for as long as the card below it collapsed.
    pub(crate) fn insert(&mut self, value: i32, level: usize, compact: bool) -> Change {
        match self {
            Card::Full => Change::Unchanged,
            Card::Empty => {
                *self = Card::explicit(level);
                self.insert(value, level, compact)
            }
            Card::Branch(children) => {
                let change = children[card_index(value, level)].insert(value, level + 1, compact);
                if change != Change::Collapsed {
                    return change;
                }
                if self.check_full() {
                    trace!(level, "card collapsed to full");
                    Change::Collapsed
                } else {
                    Change::Changed
                }
            }
            Card::Leaf(bytes) => {
                let (byte, mask) = leaf_position(value);
                if bytes[byte] & mask != 0 {
                    return Change::Unchanged;
                }

                bytes[byte] |= mask;
                let saturated = bytes[byte] == u8::MAX;
                if compact && saturated && self.check_full() {
                    trace!(level, "leaf collapsed to full");
                    Change::Collapsed
                } else {
                    Change::Changed
                }
            }
        }
    }

    /// Clear the bit of `value` beneath this card at `level`.
    ///
    /// A dense card on the path is split one level at a time, so only the
    /// cards along the path are rebuilt. With `compact` set, a leaf that
    /// becomes all-zeros is discarded and the check cascades upward.
    pub(crate) fn remove(&mut self, value: i32, level: usize, compact: bool) -> Change {
        match self {
            Card::Empty => Change::Unchanged,
            Card::Full => {
                self.split(level);
                self.remove(value, level, compact)
            }
            Card::Branch(children) => {
                let change = children[card_index(value, level)].remove(value, level + 1, compact);
                if change != Change::Collapsed {
                    return change;
                }
                if self.check_empty() {
                    trace!(level, "card collapsed to empty");
                    Change::Collapsed
                } else {
                    Change::Changed
                }
            }
            Card::Leaf(bytes) => {
                let (byte, mask) = leaf_position(value);
                if bytes[byte] & mask == 0 {
                    return Change::Unchanged;
                }

                bytes[byte] &= !mask;
                let drained = bytes[byte] == 0;
                if compact && drained && self.check_empty() {
                    trace!(level, "leaf collapsed to empty");
                    Change::Collapsed
                } else {
                    Change::Changed
                }
            }
        }
    }

    /// Test the bit of `value` without allocating.
    pub(crate) fn contains(&self, value: i32) -> bool {
        let mut card = self;
        for level in 0..LEVELS {
            match card {
                Card::Full => return true,
                Card::Empty => return false,
                Card::Branch(children) => card = &children[card_index(value, level)],
                Card::Leaf(bytes) => {
                    let (byte, mask) = leaf_position(value);
                    return bytes[byte] & mask != 0;
                }
            }
        }
        false
    }

    /// Bottom-up compaction of the whole subtree: explicit cards whose
    /// children are all dense become `Full`, and those with no members left
    /// become `Empty`.
    pub(crate) fn compact(&mut self) {
        if let Card::Branch(children) = self {
            for child in children.iter_mut() {
                child.compact();
            }
        }

        if !self.check_full() {
            self.check_empty();
        }
    }

    /// The card reached through `path` (slot indices from this card down).
    ///
    /// Children of dense or absent cards are reported as dense or absent.
    /// Returns `None` when the path runs past the leaf level or names a slot
    /// outside the card.
    pub(crate) fn descend(&self, path: &[usize]) -> Option<&Card> {
        let mut card = self;
        for (level, &slot) in path.iter().enumerate() {
            if level >= LEAF_LEVEL || slot >= BRANCH_WIDTH {
                return None;
            }
            card = match card {
                Card::Branch(children) => &children[slot],
                Card::Full => &FULL,
                Card::Empty => &EMPTY,
                Card::Leaf(_) => return None,
            };
        }
        Some(card)
    }

    /// Display adapter rendering this card, assumed to sit at `level`, as a
    /// `'1'`/`'0'` mask.
    pub(crate) fn mask(&self, level: usize) -> CardMask<'_> {
        CardMask { card: self, level }
    }

    /// Accumulate structural statistics for the subtree at `level`.
    pub(crate) fn collect_stats(&self, level: usize, stats: &mut TreeStats) {
        match self {
            Card::Empty => {}
            Card::Full => stats.full_cards[level] += 1,
            Card::Branch(children) => {
                stats.branch_cards[level] += 1;
                stats.heap_bytes += mem::size_of::<[Card; BRANCH_WIDTH]>();
                stats.max_depth = stats.max_depth.max(Some(level));
                for child in children.iter() {
                    child.collect_stats(level + 1, stats);
                }
            }
            Card::Leaf(_) => {
                stats.leaf_cards += 1;
                stats.heap_bytes += LEAF_BYTES;
                stats.max_depth = stats.max_depth.max(Some(level));
            }
        }
    }
}

/// Renders one character per child slot (64 for a branch) or per bit (256
/// for a leaf, byte 0 bit 0 first). Dense cards render as all `'1'`, absent
/// cards as all `'0'`.
pub(crate) struct CardMask<'a> {
    card: &'a Card,
    level: usize,
}

impl fmt::Display for CardMask<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = if self.level < LEAF_LEVEL {
            BRANCH_WIDTH
        } else {
            LEAF_SPAN
        };

        let mut out = String::with_capacity(width);
        match self.card {
            Card::Full => out.extend(std::iter::repeat_n('1', width)),
            Card::Empty => out.extend(std::iter::repeat_n('0', width)),
            Card::Branch(children) => {
                out.extend(children.iter().map(|c| if c.is_empty() { '0' } else { '1' }))
            }
            Card::Leaf(bytes) => {
                for &byte in bytes.iter() {
                    out.extend((0..8).map(|bit| if byte & (1 << bit) != 0 { '1' } else { '0' }));
                }
            }
        }
        f.write_str(&out)
    }
}

/// Structural statistics of a trie.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Explicit branch cards per level (0..=3).
    pub branch_cards: [usize; LEAF_LEVEL],
    /// Explicit leaf bitmaps.
    pub leaf_cards: usize,
    /// Dense cards per level (0..=4), counted where they occupy a slot.
    pub full_cards: [usize; LEAF_LEVEL + 1],
    /// Deepest level holding explicit storage, `None` for no storage.
    pub max_depth: Option<usize>,
    /// Estimated heap bytes owned by explicit cards.
    pub heap_bytes: usize,
}

impl TreeStats {
    /// Number of cards holding explicit storage.
    pub fn explicit_cards(&self) -> usize {
        self.branch_cards.iter().sum::<usize>() + self.leaf_cards
    }

    /// Number of dense cards anywhere in the trie.
    pub fn dense_cards(&self) -> usize {
        self.full_cards.iter().sum()
    }
}
