use std::ops::{BitAnd, BitOr, BitXor, Sub};

use tracing::debug;

use crate::IntSet;
use crate::error::Result;
use crate::tree::Tree;

/// Set algebra and set predicates.
///
/// Every operation comes in two flavours: a generic one accepting any
/// `IntoIterator<Item = i32>`, which may yield duplicates and arrive in any
/// order, and a `*_set` one taking another `IntSet`, which can rely on
/// uniqueness and on the exact member count of both sides. The `*_set`
/// variants also recognise a handle on the same trie (such as a read-only
/// view of `self`).
impl IntSet {
    /// Add every value of `other`.
    pub fn union_with(&mut self, other: impl IntoIterator<Item = i32>) -> Result<()> {
        self.ensure_writable()?;
        for value in other {
            self.insert(value);
        }
        Ok(())
    }

    pub fn union_with_set(&mut self, other: &IntSet) -> Result<()> {
        self.ensure_writable()?;
        if self.shares_tree(other) {
            return Ok(());
        }
        self.union_with(other.iter())
    }

    /// Keep only the values that also appear in `other`.
    pub fn intersect_with(&mut self, other: impl IntoIterator<Item = i32>) -> Result<()> {
        self.ensure_writable()?;
        if self.is_empty() {
            return Ok(());
        }

        let compact = !self.is_fastest();
        let mut kept = Tree::new();
        for value in other {
            if self.contains(value) {
                kept.add(value, compact);
            }
        }

        debug!(before = self.len(), after = kept.len, "intersected IntSet");
        self.replace_tree(kept);
        Ok(())
    }

    /// Keep only the members of `other`.
    ///
    /// Members are dropped without per-removal compaction; unless the set is
    /// in fastest mode a single compaction pass follows.
    pub fn intersect_with_set(&mut self, other: &IntSet) -> Result<()> {
        self.ensure_writable()?;
        if self.is_empty() || self.shares_tree(other) {
            return Ok(());
        }
        if other.is_empty() {
            return self.clear();
        }

        let before = self.len();
        for value in self.iter() {
            if !other.contains(value) {
                self.delete(value, false);
            }
        }
        if !self.is_fastest() {
            self.compact_tree();
        }

        debug!(before, after = self.len(), "intersected IntSet");
        Ok(())
    }

    /// Remove every value of `other`.
    pub fn except_with(&mut self, other: impl IntoIterator<Item = i32>) -> Result<()> {
        self.ensure_writable()?;
        let compact = !self.is_fastest();
        for value in other {
            self.delete(value, compact);
        }
        Ok(())
    }

    pub fn except_with_set(&mut self, other: &IntSet) -> Result<()> {
        self.ensure_writable()?;
        if self.shares_tree(other) {
            return self.clear();
        }
        self.except_with(other.iter())
    }

    /// Keep the values present in exactly one of `self` and `other`.
    ///
    /// Duplicates in `other` count once.
    pub fn symmetric_except_with(&mut self, other: impl IntoIterator<Item = i32>) -> Result<()> {
        self.ensure_writable()?;
        if self.is_empty() {
            return self.union_with(other);
        }

        let mut added = IntSet::with_fastest(true);
        let mut to_remove = IntSet::with_fastest(true);
        for value in other {
            if self.insert(value) {
                added.insert(value);
            } else if !added.contains(value) {
                to_remove.insert(value);
            }
        }

        self.except_with(to_remove.iter())
    }

    pub fn symmetric_except_with_set(&mut self, other: &IntSet) -> Result<()> {
        self.ensure_writable()?;
        if self.shares_tree(other) {
            return self.clear();
        }

        let compact = !self.is_fastest();
        for value in other.iter() {
            if !self.insert(value) {
                self.delete(value, compact);
            }
        }
        Ok(())
    }

    /// Whether every member of `self` appears in `other`.
    pub fn is_subset_of(&self, other: impl IntoIterator<Item = i32>) -> bool {
        if self.is_empty() {
            return true;
        }
        let (unique, _) = self.check_unique_and_unfound(other, false);
        unique == self.len()
    }

    pub fn is_subset_of_set(&self, other: &IntSet) -> bool {
        if self.is_empty() || self.shares_tree(other) {
            return true;
        }
        if self.len() > other.len() {
            return false;
        }
        self.contained_in(other)
    }

    /// Whether every value of `other` is a member of `self`.
    pub fn is_superset_of(&self, other: impl IntoIterator<Item = i32>) -> bool {
        other.into_iter().all(|value| self.contains(value))
    }

    pub fn is_superset_of_set(&self, other: &IntSet) -> bool {
        if self.shares_tree(other) || other.is_empty() {
            return true;
        }
        if other.len() > self.len() {
            return false;
        }
        other.contained_in(self)
    }

    /// Whether `self` is a subset of `other` and `other` holds at least one
    /// value outside `self`.
    pub fn is_proper_subset_of(&self, other: impl IntoIterator<Item = i32>) -> bool {
        let (unique, unfound) = self.check_unique_and_unfound(other, false);
        unique == self.len() && unfound > 0
    }

    pub fn is_proper_subset_of_set(&self, other: &IntSet) -> bool {
        if self.shares_tree(other) || other.is_empty() {
            return false;
        }
        if self.is_empty() {
            return true;
        }
        if self.len() >= other.len() {
            return false;
        }
        self.contained_in(other)
    }

    /// Whether `self` is a superset of `other` and holds at least one member
    /// outside `other`.
    pub fn is_proper_superset_of(&self, other: impl IntoIterator<Item = i32>) -> bool {
        if self.is_empty() {
            return false;
        }
        let (unique, unfound) = self.check_unique_and_unfound(other, true);
        unique < self.len() && unfound == 0
    }

    pub fn is_proper_superset_of_set(&self, other: &IntSet) -> bool {
        if self.is_empty() || self.shares_tree(other) {
            return false;
        }
        if other.is_empty() {
            return true;
        }
        if other.len() >= self.len() {
            return false;
        }
        other.contained_in(self)
    }

    /// Whether at least one value of `other` is a member of `self`.
    pub fn overlaps(&self, other: impl IntoIterator<Item = i32>) -> bool {
        if self.is_empty() {
            return false;
        }
        other.into_iter().any(|value| self.contains(value))
    }

    pub fn overlaps_set(&self, other: &IntSet) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        if self.shares_tree(other) {
            return true;
        }

        // Walk the smaller side.
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|value| large.contains(value))
    }

    /// Whether `self` and the distinct values of `other` are the same set.
    pub fn set_equals(&self, other: impl IntoIterator<Item = i32>) -> bool {
        let (unique, unfound) = self.check_unique_and_unfound(other, true);
        unique == self.len() && unfound == 0
    }

    pub fn set_equals_set(&self, other: &IntSet) -> bool {
        if self.shares_tree(other) {
            return true;
        }
        if self.len() != other.len() {
            return false;
        }
        other.contained_in(self)
    }

    /// Count the distinct values of `other` found in `self`, and the values
    /// of `other` (with repetition) not found in `self`.
    ///
    /// With `return_if_unfound` set the scan stops at the first unfound value.
    /// An empty `self` only peeks at the first value of `other`, so the
    /// unfound count is then `0` or `1`.
    fn check_unique_and_unfound(
        &self,
        other: impl IntoIterator<Item = i32>,
        return_if_unfound: bool,
    ) -> (u64, u64) {
        let mut other = other.into_iter();
        if self.is_empty() {
            return (0, u64::from(other.next().is_some()));
        }

        let mut seen = Tree::new();
        let mut unique = 0u64;
        let mut unfound = 0u64;
        for value in other {
            if self.contains(value) {
                if seen.add(value, false) {
                    unique += 1;
                }
            } else {
                unfound += 1;
                if return_if_unfound {
                    break;
                }
            }
        }

        (unique, unfound)
    }

    /// Whether every member of `self` is a member of `other`.
    fn contained_in(&self, other: &IntSet) -> bool {
        self.iter().all(|value| other.contains(value))
    }
}

// Operators build a new, writable, compacting set and leave both operands
// untouched.

impl BitOr for &IntSet {
    type Output = IntSet;

    fn bitor(self, rhs: &IntSet) -> IntSet {
        self.iter().chain(rhs.iter()).collect()
    }
}

impl BitAnd for &IntSet {
    type Output = IntSet;

    fn bitand(self, rhs: &IntSet) -> IntSet {
        let (small, large) = if self.len() <= rhs.len() {
            (self, rhs)
        } else {
            (rhs, self)
        };
        small.iter().filter(|&value| large.contains(value)).collect()
    }
}

impl Sub for &IntSet {
    type Output = IntSet;

    fn sub(self, rhs: &IntSet) -> IntSet {
        self.iter().filter(|&value| !rhs.contains(value)).collect()
    }
}

impl BitXor for &IntSet {
    type Output = IntSet;

    fn bitxor(self, rhs: &IntSet) -> IntSet {
        let left = self.iter().filter(|&value| !rhs.contains(value));
        let right = rhs.iter().filter(|&value| !self.contains(value));
        left.chain(right).collect()
    }
}
