use crate::tree::{FULL_LEN, Tree};
use crate::*;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

// ---- Index derivation ----

#[test]
fn test_card_index_fields() {
    // 0b000001_000010_000011_000100_00000101
    let v = (1 << 26) | (2 << 20) | (3 << 14) | (4 << 8) | 5;
    assert_eq!(card_index(v, 0), 1);
    assert_eq!(card_index(v, 1), 2);
    assert_eq!(card_index(v, 2), 3);
    assert_eq!(card_index(v, 3), 4);
    assert_eq!(card_index(v, 4), 5);
}

#[test]
fn test_card_index_sign_bit() {
    assert_eq!(card_index(-1, 0), 63);
    assert_eq!(card_index(-1, 4), 255);
    assert_eq!(card_index(i32::MIN, 0), 32);
    assert_eq!(card_index(i32::MIN, 1), 0);
    assert_eq!(card_index(i32::MAX, 0), 31);
    assert_eq!(card_index(0, 0), 0);
}

#[test]
#[should_panic]
fn test_card_index_rejects_level_5() {
    card_index(0, 5);
}

#[test]
fn test_leaf_position() {
    assert_eq!(leaf_position(0), (0, 0x01));
    assert_eq!(leaf_position(7), (0, 0x80));
    assert_eq!(leaf_position(8), (1, 0x01));
    assert_eq!(leaf_position(255), (31, 0x80));
    assert_eq!(leaf_position(256), (0, 0x01));
    assert_eq!(leaf_position(-1), (31, 0x80));
}

#[test]
fn test_block_range() {
    assert_eq!(block_range(&[]), Some((i32::MIN, i32::MAX)));
    assert_eq!(block_range(&[0]), Some((0, (1 << 26) - 1)));
    assert_eq!(block_range(&[31]), Some((31 << 26, i32::MAX)));
    assert_eq!(block_range(&[32]), Some((i32::MIN, i32::MIN + (1 << 26) - 1)));
    assert_eq!(block_range(&[63]), Some((-(1 << 26), -1)));
    assert_eq!(block_range(&[0, 0, 0]), Some((0, (1 << 14) - 1)));
    assert_eq!(block_range(&[0, 0, 0, 1]), Some((256, 511)));

    assert_eq!(block_range(&[0, 0, 0, 0, 0]), None);
    assert_eq!(block_range(&[64]), None);
}

#[test]
fn test_block_range_covers_own_values() {
    for v in [i32::MIN, -70_000, -1, 0, 1, 12_345, i32::MAX] {
        let path: Vec<usize> = (0..4).map(|level| card_index(v, level)).collect();
        let (lo, hi) = block_range(&path).unwrap();
        assert!(lo <= v && v <= hi, "{v} outside [{lo}, {hi}]");
        assert_eq!(hi - lo, 255);
    }
}

// ---- Tree ----

#[test]
fn test_tree_add_remove() {
    let mut tree = Tree::new();
    assert!(tree.add(42, true));
    assert!(!tree.add(42, true));
    assert_eq!(tree.len, 1);
    assert!(tree.contains(42));

    assert!(tree.remove(42, true));
    assert!(!tree.remove(42, true));
    assert_eq!(tree.len, 0);
    assert!(!tree.contains(42));
}

#[test]
fn test_tree_full() {
    let tree = Tree::full();
    assert_eq!(tree.len, FULL_LEN);
    assert!(tree.contains(i32::MIN));
    assert!(tree.contains(0));
    assert!(tree.contains(i32::MAX));

    let stats = tree.stats();
    assert_eq!(stats.explicit_cards(), 0);
    assert_eq!(stats.full_cards[0], 1);
    assert_eq!(stats.max_depth, None);
}

#[test]
fn test_tree_clear_resets_root() {
    let mut tree = Tree::new();
    for v in -1000..1000 {
        tree.add(v, true);
    }
    tree.clear();
    assert_eq!(tree.len, 0);
    assert_eq!(tree.stats(), TreeStats::default());
}

// ---- Compaction ----

#[test]
fn test_remove_last_member_cascades_to_root() {
    let mut set = IntSet::new();
    set.add(123_456).unwrap();
    assert!(!set.is_absent_at(&[]));

    set.remove(123_456).unwrap();
    assert!(set.is_absent_at(&[]));
    assert_eq!(set.root_mask(), "0".repeat(64));
    assert_eq!(set.stats().explicit_cards(), 0);
}

#[test]
fn test_remove_keeps_nonempty_ancestors() {
    let mut set = IntSet::new();
    set.add(1).unwrap();
    set.add(1 << 20).unwrap();
    set.remove(1).unwrap();

    // Level 1 card still holds `1 << 20`.
    assert!(!set.is_absent_at(&[0]));
    assert!(set.is_absent_at(&[0, 0]));
    assert!(!set.is_absent_at(&[0, 1]));
    assert_eq!(set.stats().leaf_cards, 1);
}

#[test]
fn test_dense_block_collapses_to_level_3() {
    let mut set = IntSet::new();
    for v in 0..(1 << 14) {
        set.add(v).unwrap();
    }

    assert!(set.is_dense_at(&[0, 0, 0]));
    assert!(!set.is_dense_at(&[0, 0]));
    assert!(!set.is_dense_at(&[0]));
    assert!(!set.is_dense_at(&[]));

    let mask = set.mask_at(&[0, 0]).unwrap();
    assert_eq!(mask, format!("1{}", "0".repeat(63)));

    let stats = set.stats();
    assert_eq!(stats.leaf_cards, 0);
    assert_eq!(stats.full_cards[3], 1);
    assert_eq!(stats.max_depth, Some(2));
    assert_eq!(set.len(), 1 << 14);
}

#[test]
fn test_dense_leaf_collapses_in_any_order() {
    let mut values: Vec<i32> = (-256..0).collect();
    values.shuffle(&mut StdRng::seed_from_u64(7));

    let mut set = IntSet::new();
    for v in values {
        set.add(v).unwrap();
    }

    let stats = set.stats();
    assert_eq!(stats.leaf_cards, 0);
    assert_eq!(stats.full_cards[4], 1);
    assert!(set.is_dense_at(&[63, 63, 63, 63]));
}

#[test]
fn test_fastest_mode_skips_collapse() {
    let mut set = IntSet::with_fastest(true);
    for v in 0..256 {
        set.add(v).unwrap();
    }
    assert!(!set.is_dense_at(&[0, 0, 0, 0]));
    assert_eq!(set.stats().leaf_cards, 1);

    set.compact().unwrap();
    assert!(set.is_dense_at(&[0, 0, 0, 0]));
    assert_eq!(set.stats().leaf_cards, 0);
    assert_eq!(set.len(), 256);
}

#[test]
fn test_fastest_mode_keeps_empty_storage_until_compact() {
    let mut set = IntSet::with_fastest(true);
    set.add(10).unwrap();
    set.remove(10).unwrap();
    assert!(set.is_empty());
    assert_eq!(set.stats().leaf_cards, 1);

    set.compact().unwrap();
    assert!(set.is_absent_at(&[]));
    assert_eq!(set.stats().explicit_cards(), 0);
}

#[test]
fn test_remove_from_dense_root_splits_path_only() {
    let mut set = IntSet::full();
    set.remove(5).unwrap();

    assert_eq!(set.len(), FULL_LEN - 1);
    assert!(!set.contains(5));
    assert!(set.contains(4));
    assert!(set.contains(6));
    assert!(set.contains(i32::MIN));
    assert!(set.contains(i32::MAX));

    let stats = set.stats();
    assert_eq!(stats.branch_cards, [1, 1, 1, 1]);
    assert_eq!(stats.leaf_cards, 1);
    assert_eq!(stats.full_cards, [0, 63, 63, 63, 63]);

    // Putting the value back collapses every card on the path again.
    set.add(5).unwrap();
    assert!(set.is_dense_at(&[]));
    assert_eq!(set.stats().explicit_cards(), 0);
    assert_eq!(set.len(), FULL_LEN);
}

#[test]
fn test_mask_at_leaf() {
    let mut set = IntSet::new();
    set.add(256 + 3).unwrap();
    set.add(256 + 8).unwrap();

    let mask = set.mask_at(&[0, 0, 0, 1]).unwrap();
    assert_eq!(mask.len(), 256);
    assert_eq!(&mask[..10], "0001000010");
    assert_eq!(mask.matches('1').count(), 2);

    assert_eq!(set.mask_at(&[0, 0, 0, 0]), Some("0".repeat(256)));
    assert_eq!(set.mask_at(&[0, 0, 0, 1, 0]), None);
}

#[test]
fn test_heap_bytes_track_storage() {
    let mut set = IntSet::new();
    assert_eq!(set.heap_bytes(), 0);

    set.add(1).unwrap();
    let one = set.heap_bytes();
    assert!(one > 0);

    // Same leaf: no new storage.
    set.add(2).unwrap();
    assert_eq!(set.heap_bytes(), one);

    set.add(i32::MIN).unwrap();
    assert!(set.heap_bytes() > one);
}
