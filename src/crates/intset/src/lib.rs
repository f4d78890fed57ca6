//! A compressed, ordered set of `i32` values backed by a five-level bitmap
//! trie.
//!
//! ```
//! use intset::IntSet;
//!
//! let mut set = IntSet::new();
//! for v in [25, -3, 10, 15, 20] {
//!     set.add(v).unwrap();
//! }
//!
//! assert_eq!(set.iter().collect::<Vec<_>>(), [-3, 10, 15, 20, 25]);
//! assert_eq!(set.range(20, 10).collect::<Vec<_>>(), [20, 15, 10]);
//! ```

mod card;
mod error;
mod index;
mod iter;
mod ops;
mod set;
mod tree;

#[cfg(test)]
mod tests_tree;

pub use card::TreeStats;
pub use error::{IntSetError, Result};
pub use index::{block_range, card_index, leaf_position};
pub use iter::Iter;
pub use set::IntSet;
