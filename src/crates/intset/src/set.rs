use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::card::TreeStats;
use crate::error::{IntSetError, Result};
use crate::iter::{Direction, Iter};
use crate::tree::Tree;

/// A compressed, ordered set of `i32` values.
///
/// Members are stored in a five-level bitmap trie: four levels of 64-way
/// branch cards followed by 256-bit leaf bitmaps. Sub-ranges that are
/// entirely present collapse into a single dense card and sub-ranges that are
/// entirely absent hold no storage, so memory follows the density and
/// contiguity of the data rather than the size of the domain.
///
/// Iteration is in ascending signed order.
///
/// # Read-only views
///
/// [`as_read_only`](Self::as_read_only) returns a handle that *shares* the
/// trie with the original. Every mutating call on the view fails with
/// [`IntSetError::ReadOnly`], but mutations made through the original handle
/// remain visible through the view. The view is an alias, not a snapshot.
///
/// # Threading
///
/// The trie is shared through `Rc<RefCell<_>>`, so a set is confined to the
/// thread that created it. Use [`Clone`] to obtain an independent copy.
pub struct IntSet {
    tree: Rc<RefCell<Tree>>,
    fastest: bool,
    read_only: bool,
}

impl IntSet {
    /// An empty set that compacts on every mutation.
    pub fn new() -> Self {
        Self::with_options(false, false)
    }

    /// An empty set. With `fastest` set, `add` and `remove` skip compaction.
    pub fn with_fastest(fastest: bool) -> Self {
        Self::with_options(fastest, false)
    }

    /// A set holding every `i32`, represented by a single dense root.
    pub fn full() -> Self {
        Self::with_options(false, true)
    }

    /// Create a set with explicit settings. With `full` set the root starts
    /// dense and the set holds all `2^32` values.
    pub fn with_options(fastest: bool, full: bool) -> Self {
        let tree = if full {
            debug!(fastest, "creating dense IntSet");
            Tree::full()
        } else {
            Tree::new()
        };

        Self {
            tree: Rc::new(RefCell::new(tree)),
            fastest,
            read_only: false,
        }
    }

    /// A read-only handle sharing this set's trie.
    ///
    /// The returned set rejects every mutation, while changes made through
    /// `self` stay visible through it. Calling this on a view returns another
    /// view of the same trie.
    pub fn as_read_only(&self) -> IntSet {
        if !self.read_only {
            debug!("creating read-only IntSet view");
        }
        IntSet {
            tree: Rc::clone(&self.tree),
            fastest: self.fastest,
            read_only: true,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_fastest(&self) -> bool {
        self.fastest
    }

    /// Switch compaction off (`true`) or back on (`false`).
    ///
    /// Switching back on does not compact retroactively; see
    /// [`compact`](Self::compact).
    pub fn set_fastest(&mut self, fastest: bool) -> Result<()> {
        self.ensure_writable()?;
        self.fastest = fastest;
        Ok(())
    }

    /// Number of members. A dense set holds `2^32`.
    pub fn len(&self) -> u64 {
        self.tree.borrow().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of members as `i32`.
    ///
    /// Fails with [`IntSetError::CountOverflow`] once the set holds more than
    /// `i32::MAX` members (a dense set, for instance); [`len`](Self::len)
    /// always reports the exact count.
    pub fn count(&self) -> Result<i32> {
        let len = self.len();
        i32::try_from(len).map_err(|_| IntSetError::CountOverflow(len))
    }

    /// Insert `value`. Returns `Ok(true)` if it was not yet a member.
    pub fn add(&mut self, value: i32) -> Result<bool> {
        self.ensure_writable()?;
        Ok(self.insert(value))
    }

    /// Remove `value`. Returns `Ok(true)` if it was a member.
    pub fn remove(&mut self, value: i32) -> Result<bool> {
        self.ensure_writable()?;
        Ok(self.delete(value, !self.fastest))
    }

    pub fn contains(&self, value: i32) -> bool {
        self.tree.borrow().contains(value)
    }

    /// Remove every member.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_writable()?;
        debug!(len = self.len(), "clearing IntSet");
        self.tree.borrow_mut().clear();
        Ok(())
    }

    /// Collapse every dense or empty subtree in one bottom-up pass.
    ///
    /// Useful after loading or pruning in fastest mode.
    pub fn compact(&mut self) -> Result<()> {
        self.ensure_writable()?;
        self.tree.borrow_mut().compact();
        Ok(())
    }

    /// Iterate over the members in ascending order.
    pub fn iter(&self) -> Iter {
        Iter::new(Rc::clone(&self.tree), i32::MIN, i32::MAX, Direction::Ascending)
    }

    /// Iterate over the members in descending order.
    pub fn iter_desc(&self) -> Iter {
        Iter::new(Rc::clone(&self.tree), i32::MIN, i32::MAX, Direction::Descending)
    }

    /// Members within `[min(first, last), max(first, last)]`, ascending when
    /// `first <= last` and descending otherwise.
    ///
    /// Subtrees whose block range lies outside the bounds are never visited.
    pub fn range(&self, first: i32, last: i32) -> Iter {
        let direction = if first <= last {
            Direction::Ascending
        } else {
            Direction::Descending
        };
        Iter::new(
            Rc::clone(&self.tree),
            first.min(last),
            first.max(last),
            direction,
        )
    }

    /// The smallest member.
    pub fn first(&self) -> Option<i32> {
        self.iter().next()
    }

    /// The largest member.
    pub fn last(&self) -> Option<i32> {
        self.iter_desc().next()
    }

    /// The `index`-th member in ascending order.
    pub fn element_at(&self, index: u64) -> Option<i32> {
        let index = usize::try_from(index).ok()?;
        self.iter().nth(index)
    }

    /// Copy all members, ascending, into the start of `dest`.
    pub fn copy_to(&self, dest: &mut [i32]) -> Result<()> {
        self.copy_to_at(dest, 0)
    }

    /// Copy all members, ascending, into `dest` starting at `offset`.
    pub fn copy_to_at(&self, dest: &mut [i32], offset: isize) -> Result<()> {
        let count = isize::try_from(self.len()).unwrap_or(isize::MAX);
        self.copy_to_range(dest, offset, count)
    }

    /// Copy the first `count` members, ascending, into `dest` starting at
    /// `offset`.
    ///
    /// `offset` and `count` are signed so that negative arguments are
    /// rejected with [`IntSetError::NegativeArgument`] rather than wrapped.
    /// Fails with [`IntSetError::DestinationTooSmall`] when `dest` cannot
    /// hold `count` elements from `offset`; nothing is written in that case.
    pub fn copy_to_range(&self, dest: &mut [i32], offset: isize, count: isize) -> Result<()> {
        let offset = usize::try_from(offset).map_err(|_| IntSetError::NegativeArgument {
            name: "offset",
            value: offset,
        })?;
        let count = usize::try_from(count).map_err(|_| IntSetError::NegativeArgument {
            name: "count",
            value: count,
        })?;

        if offset > dest.len() || count > dest.len() - offset {
            return Err(IntSetError::DestinationTooSmall {
                offset,
                count,
                len: dest.len(),
            });
        }

        for (slot, value) in dest[offset..offset + count].iter_mut().zip(self.iter()) {
            *slot = value;
        }
        Ok(())
    }

    /// Structural statistics of the underlying trie.
    pub fn stats(&self) -> TreeStats {
        self.tree.borrow().stats()
    }

    /// Estimated heap bytes held by the trie.
    pub fn heap_bytes(&self) -> usize {
        self.stats().heap_bytes
    }

    /// Render the card reached through `path` (slot indices from the root)
    /// as a `'1'`/`'0'` mask: 64 characters for a branch level, 256 for a
    /// leaf.
    ///
    /// Returns `None` if the path is longer than four slots or names a slot
    /// outside `0..64`.
    pub fn mask_at(&self, path: &[usize]) -> Option<String> {
        let tree = self.tree.borrow();
        let card = tree.root.descend(path)?;
        Some(card.mask(path.len()).to_string())
    }

    /// The root card's 64-character mask.
    pub fn root_mask(&self) -> String {
        self.tree.borrow().root.mask(0).to_string()
    }

    /// Whether the card reached through `path` is dense.
    pub fn is_dense_at(&self, path: &[usize]) -> bool {
        let tree = self.tree.borrow();
        tree.root.descend(path).is_some_and(|card| card.is_full())
    }

    /// Whether the card reached through `path` is absent (holds no storage
    /// and is not dense).
    pub fn is_absent_at(&self, path: &[usize]) -> bool {
        let tree = self.tree.borrow();
        tree.root.descend(path).is_some_and(|card| card.is_empty())
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(IntSetError::ReadOnly);
        }
        Ok(())
    }

    /// Whether `other` is a handle on the same trie.
    pub(crate) fn shares_tree(&self, other: &IntSet) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }

    /// Insert without the read-only check, honoring the fastest flag.
    pub(crate) fn insert(&mut self, value: i32) -> bool {
        self.tree.borrow_mut().add(value, !self.fastest)
    }

    /// Remove without the read-only check.
    pub(crate) fn delete(&mut self, value: i32, compact: bool) -> bool {
        self.tree.borrow_mut().remove(value, compact)
    }

    /// Replace the trie contents in place, keeping views attached.
    pub(crate) fn replace_tree(&mut self, tree: Tree) {
        *self.tree.borrow_mut() = tree;
    }

    pub(crate) fn compact_tree(&mut self) {
        self.tree.borrow_mut().compact();
    }
}

impl Default for IntSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy into an independent, writable set with the same fastest flag.
impl Clone for IntSet {
    fn clone(&self) -> Self {
        let tree = self.tree.borrow().clone();
        Self {
            tree: Rc::new(RefCell::new(tree)),
            fastest: self.fastest,
            read_only: false,
        }
    }
}

impl fmt::Debug for IntSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntSet")
            .field("len", &self.len())
            .field("fastest", &self.fastest)
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl PartialEq for IntSet {
    fn eq(&self, other: &Self) -> bool {
        self.set_equals_set(other)
    }
}

impl Eq for IntSet {}

impl FromIterator<i32> for IntSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut set = IntSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<'a> IntoIterator for &'a IntSet {
    type Item = i32;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        self.iter()
    }
}
