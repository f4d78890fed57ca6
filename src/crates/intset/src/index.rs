//! Index derivation for the five trie levels.
//!
//! A value's unsigned bit pattern is cut into five fields, most significant
//! first:
//!
//! ```text
//!  31      26 25     20 19     14 13      8 7     3 2   0
//! +----------+---------+---------+----------+-------+-----+
//! | level 0  | level 1 | level 2 | level 3  | byte  | bit |
//! +----------+---------+---------+----------+-------+-----+
//!                                            \___ level 4 __/
//! ```
//!
//! The fields partition the 32 bits exactly once. No sign handling happens
//! here: the two's-complement discontinuity is dealt with by the traversal
//! order (see [`slot_for_rank`]).

/// Number of trie levels, root included.
pub(crate) const LEVELS: usize = 5;

/// Level of the leaf cards.
pub(crate) const LEAF_LEVEL: usize = 4;

/// Child slots in a branch card (levels 0..=3).
pub(crate) const BRANCH_WIDTH: usize = 64;

/// Bytes in a leaf bitmap.
pub(crate) const LEAF_BYTES: usize = 32;

/// Values covered by one leaf card.
pub(crate) const LEAF_SPAN: usize = LEAF_BYTES * 8;

/// Right shift that brings each level's field down to bit 0.
const SHIFTS: [u32; LEVELS] = [26, 20, 14, 8, 0];

/// Width mask of the level's field.
const MASKS: [u32; LEVELS] = [0x3f, 0x3f, 0x3f, 0x3f, 0xff];

/// Root slots whose values have the sign bit set.
const NEGATIVE_SLOTS: usize = BRANCH_WIDTH / 2;

/// The child-slot index of `value` at `level`.
///
/// Levels 0..=3 yield `0..64`; level 4 yields the bit offset `0..256` inside
/// the leaf bitmap (see [`leaf_position`] for the byte/bit split).
///
/// Panics if `level > 4`.
#[inline]
pub fn card_index(value: i32, level: usize) -> usize {
    assert!(level < LEVELS, "level {level} out of range 0..{LEVELS}");

    (((value as u32) >> SHIFTS[level]) & MASKS[level]) as usize
}

/// The byte index (bits 7-3) and the single-bit mask (bit 2-0) of `value`
/// inside its leaf bitmap.
#[inline]
pub fn leaf_position(value: i32) -> (usize, u8) {
    let offset = card_index(value, LEAF_LEVEL);
    (offset >> 3, 1u8 << (offset & 7))
}

/// Shift that places a slot index of `level` into its bit position.
#[inline]
pub(crate) fn shift(level: usize) -> u32 {
    SHIFTS[level]
}

/// The child slot visited at position `rank` of an ascending walk.
///
/// Negative values carry bit 31, which puts them in root slots 32..63. An
/// ascending signed walk therefore visits root slots 32..63 first and then
/// 0..31; flipping bit 5 of the rank does exactly that. Below the root no
/// field contains the sign bit and ranks map to slots unchanged.
#[inline]
pub(crate) fn slot_for_rank(level: usize, rank: usize) -> usize {
    if level == 0 {
        rank ^ NEGATIVE_SLOTS
    } else {
        rank
    }
}

/// The literal integer range covered by a card with `fixed` index fields
/// decided, whose decided bits are `prefix` (undecided bits zero).
///
/// The low bound keeps the undecided bits at 0 and the high bound sets them
/// to 1. With no fields decided the card is the root and covers the whole
/// `i32` domain. Once the level 0 field is fixed the sign bit is fixed too, so
/// the range never wraps.
#[inline]
pub(crate) fn block_bounds(prefix: u32, fixed: usize) -> (i32, i32) {
    if fixed == 0 {
        return (i32::MIN, i32::MAX);
    }

    debug_assert!(fixed <= LEVELS);
    let undecided = (1u32 << SHIFTS[fixed - 1]) - 1;

    (prefix as i32, (prefix | undecided) as i32)
}

/// The literal integer range covered by the card reached through `path`,
/// given as slot indices from the root down (at most four entries).
///
/// Returns `None` if the path is longer than the branch levels or names a
/// slot outside `0..64`.
pub fn block_range(path: &[usize]) -> Option<(i32, i32)> {
    if path.len() > LEAF_LEVEL || path.iter().any(|&slot| slot >= BRANCH_WIDTH) {
        return None;
    }

    let prefix = path
        .iter()
        .enumerate()
        .fold(0u32, |acc, (level, &slot)| acc | ((slot as u32) << SHIFTS[level]));

    Some(block_bounds(prefix, path.len()))
}
