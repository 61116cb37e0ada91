//! Tests for the braided tree.

use std::fmt::Debug;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::*;

fn tree_of(keys: &[&'static str]) -> BraidedTree<&'static str, String> {
    let mut tree = BraidedTree::new();
    for k in keys {
        tree.insert(*k, k.to_lowercase());
    }
    tree
}

fn key_of<'a>(node: Option<NodeRef<'a, &'static str, String>>) -> Option<&'static str> {
    node.map(|n| *n.key())
}

/// Checks ordering, parent links, skew flags, AVL balance and the in-order
/// thread against a recursive traversal.
fn check_invariants<K: Ord + Debug, V>(tree: &BraidedTree<K, V>) {
    fn walk<K: Ord + Debug, V>(
        tree: &BraidedTree<K, V>,
        id: Option<NodeId>,
        parent: Option<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> usize {
        let Some(id) = id else { return 0 };
        let node = tree.node(id);
        assert_eq!(node.parent, parent, "parent link of {:?}", node.key);
        assert!(!node.bucket.is_empty(), "empty bucket kept at {:?}", node.key);
        if let Some(l) = node.left {
            assert!(tree.node(l).key < node.key);
        }
        if let Some(r) = node.right {
            assert!(tree.node(r).key > node.key);
        }

        let hl = walk(tree, node.left, Some(id), order);
        order.push(id);
        let hr = walk(tree, node.right, Some(id), order);

        assert!(hl.abs_diff(hr) <= 1, "unbalanced at {:?}: {hl} vs {hr}", node.key);
        let expected = match hl.cmp(&hr) {
            Ordering::Equal => Skew::Balanced,
            Ordering::Greater => Skew::LeftHigh,
            Ordering::Less => Skew::RightHigh,
        };
        assert_eq!(node.skew, expected, "skew at {:?}", node.key);
        1 + hl.max(hr)
    }

    let mut order = Vec::new();
    walk(tree, tree.root, None, &mut order);
    assert_eq!(order.len(), tree.len());

    let threaded: Vec<NodeId> = tree.iter().map(|n| n.id()).collect();
    assert_eq!(threaded, order, "thread disagrees with in-order traversal");

    for pair in order.windows(2) {
        assert_eq!(tree.node(pair[0]).next, Some(pair[1]));
        assert_eq!(tree.node(pair[1]).prev, Some(pair[0]));
        assert!(tree.node(pair[0]).key < tree.node(pair[1]).key);
    }
    if let (Some(first), Some(last)) = (order.first(), order.last()) {
        assert_eq!(tree.node(*first).prev, None);
        assert_eq!(tree.node(*last).next, None);
    }

    let values: usize = tree.iter().map(|n| n.values().len()).sum();
    assert_eq!(values, tree.value_count());
}

#[test]
fn test_empty_tree() {
    let tree = BraidedTree::<u32, u32>::new();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert!(tree.root().is_none());
    assert!(tree.first().is_none());
    assert!(tree.find(&1).is_none());
    assert_eq!(tree.iter().count(), 0);
}

#[test]
fn test_insert_and_find() {
    let tree = tree_of(&["M", "C", "X", "A"]);
    let c = tree.find("C").unwrap();
    assert_eq!(c.values(), ["c"]);
    assert_eq!(key_of(c.prev()), Some("A"));
    assert_eq!(key_of(c.next()), Some("M"));
    assert!(tree.find("B").is_none());
    assert!(tree.contains("X", &"x".to_string()));
    assert!(!tree.contains("X", &"y".to_string()));
    check_invariants(&tree);
}

#[test]
fn test_same_key_shares_bucket() {
    let mut tree = BraidedTree::new();
    let a = tree.insert("smi", 1);
    let b = tree.insert("smi", 2);
    tree.insert("jon", 3);
    assert_eq!(a, b);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.value_count(), 3);
    assert_eq!(tree.find("smi").unwrap().values(), [1, 2]);
    check_invariants(&tree);
}

#[test]
fn test_iterator_follows_thread() {
    let tree = tree_of(&["D", "F", "C", "E", "A", "B"]);
    let keys: Vec<_> = tree.iter().map(|n| *n.key()).collect();
    assert_eq!(keys, ["A", "B", "C", "D", "E", "F"]);
    assert_eq!(key_of(tree.first()), Some("A"));
    assert_eq!(key_of(tree.last()), Some("F"));

    let values: Vec<_> = tree.values().cloned().collect();
    assert_eq!(values, ["a", "b", "c", "d", "e", "f"]);

    // Restartable: a fresh iterator starts from the smallest key again.
    let mut it = tree.iter();
    it.next();
    let resumed = it.clone();
    assert_eq!(resumed.count(), 5);
    assert_eq!(tree.iter().count(), 6);
}

#[test]
fn test_left_rotation() {
    let tree = tree_of(&["C", "A", "E", "B", "D", "G", "F", "H", "I"]);
    let c = tree.root().unwrap();
    assert_eq!(*c.key(), "C");
    assert_eq!(key_of(c.prev()), Some("B"));
    assert_eq!(key_of(c.next()), Some("D"));

    let a = c.left().unwrap();
    assert_eq!(*a.key(), "A");
    assert!(a.left().is_none());
    assert!(a.prev().is_none());
    assert_eq!(key_of(a.right()), Some("B"));

    let g = c.right().unwrap();
    assert_eq!(*g.key(), "G");
    assert_eq!(key_of(g.prev()), Some("F"));
    assert_eq!(key_of(g.next()), Some("H"));

    let e = g.left().unwrap();
    assert_eq!(*e.key(), "E");
    assert_eq!(key_of(e.left()), Some("D"));
    assert_eq!(key_of(e.right()), Some("F"));
    assert_eq!(key_of(e.left().unwrap().prev()), Some("C"));

    let h = g.right().unwrap();
    assert_eq!(*h.key(), "H");
    assert!(h.left().is_none());
    let i = h.right().unwrap();
    assert_eq!(*i.key(), "I");
    assert!(i.next().is_none());
    check_invariants(&tree);
}

#[test]
fn test_right_rotation() {
    let tree = tree_of(&["G", "I", "E", "H", "F", "C", "D", "B", "A"]);
    let g = tree.root().unwrap();
    assert_eq!(*g.key(), "G");
    assert_eq!(key_of(g.prev()), Some("F"));
    assert_eq!(key_of(g.next()), Some("H"));

    let i = g.right().unwrap();
    assert_eq!(*i.key(), "I");
    assert_eq!(key_of(i.left()), Some("H"));
    assert!(i.right().is_none());

    let c = g.left().unwrap();
    assert_eq!(*c.key(), "C");
    assert_eq!(key_of(c.prev()), Some("B"));
    assert_eq!(key_of(c.next()), Some("D"));

    let e = c.right().unwrap();
    assert_eq!(key_of(e.left()), Some("D"));
    assert_eq!(key_of(e.right()), Some("F"));
    assert_eq!(key_of(e.right().unwrap().next()), Some("G"));

    let b = c.left().unwrap();
    assert_eq!(*b.key(), "B");
    assert!(b.right().is_none());
    let a = b.left().unwrap();
    assert_eq!(*a.key(), "A");
    assert!(a.prev().is_none());
    assert_eq!(key_of(a.next()), Some("B"));
    check_invariants(&tree);
}

#[test]
fn test_double_rotations() {
    // left-right
    let tree = tree_of(&["C", "A", "B"]);
    assert_eq!(key_of(tree.root()), Some("B"));
    check_invariants(&tree);

    // right-left
    let tree = tree_of(&["A", "C", "B"]);
    assert_eq!(key_of(tree.root()), Some("B"));
    check_invariants(&tree);
}

#[test]
fn test_deletion_relinks_thread() {
    let mut tree = tree_of(&["C", "A", "D", "B", "E", "F"]);
    check_invariants(&tree);

    assert!(tree.delete("A", &"a".to_string()));
    check_invariants(&tree);
    assert!(tree.delete("E", &"e".to_string()));
    check_invariants(&tree);

    let c = tree.root().unwrap();
    assert_eq!(*c.key(), "C");
    assert_eq!(key_of(c.prev()), Some("B"));
    assert_eq!(key_of(c.next()), Some("D"));

    let d = c.right().unwrap();
    assert_eq!(*d.key(), "D");
    assert_eq!(key_of(d.prev()), Some("C"));
    assert_eq!(key_of(d.next()), Some("F"));
    assert!(d.left().is_none());

    let f = d.right().unwrap();
    assert_eq!(*f.key(), "F");
    assert_eq!(key_of(f.prev()), Some("D"));
    assert!(f.next().is_none());
    assert!(f.left().is_none() && f.right().is_none());

    let b = c.left().unwrap();
    assert_eq!(*b.key(), "B");
    assert_eq!(key_of(b.next()), Some("C"));
    assert!(b.prev().is_none());
    assert!(b.left().is_none() && b.right().is_none());
}

#[test]
fn test_deletion_keeps_node_with_remaining_values() {
    let mut tree = BraidedTree::new();
    tree.insert("A", "a");
    tree.insert("A", "a");
    assert!(tree.delete("A", &"a"));
    assert!(!tree.is_empty());
    let a = tree.root().unwrap();
    assert_eq!(*a.key(), "A");
    assert!(a.next().is_none());
    assert!(a.prev().is_none());
    assert!(tree.delete("A", &"a"));
    assert!(tree.is_empty());
    assert_eq!(tree.value_count(), 0);
}

#[test]
fn test_delete_absent_is_noop() {
    let mut tree = tree_of(&["B", "A", "C"]);
    assert!(!tree.delete("Z", &"z".to_string()));
    assert!(!tree.delete("A", &"x".to_string()));
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.value_count(), 3);
    check_invariants(&tree);
}

#[test]
fn test_delete_root_with_two_children() {
    let mut tree = tree_of(&["B", "A", "C"]);
    assert!(tree.delete("B", &"b".to_string()));
    check_invariants(&tree);
    let keys: Vec<_> = tree.iter().map(|n| *n.key()).collect();
    assert_eq!(keys, ["A", "C"]);
}

#[test]
fn test_removed_handles_are_released() {
    let mut tree = BraidedTree::new();
    let a = tree.insert(1, 'a');
    tree.insert(2, 'b');
    assert!(tree.delete(&1, &'a'));
    assert!(tree.get(a).is_none());

    // Freed slots are reused.
    let c = tree.insert(3, 'c');
    assert_eq!(c, a);
    assert_eq!(*tree.get(c).unwrap().key(), 3);
    check_invariants(&tree);
}

#[test]
fn test_clear() {
    let mut tree = tree_of(&["B", "A", "C"]);
    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.value_count(), 0);
    tree.insert("Q", "q".to_string());
    check_invariants(&tree);
}

#[test]
fn test_random_inserts_and_deletes() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut tree = BraidedTree::new();
    let mut pairs = Vec::new();

    for id in 0..2000u32 {
        let key = rng.gen_range(0..600u32);
        tree.insert(key, id);
        pairs.push((key, id));
        if id % 97 == 0 {
            check_invariants(&tree);
        }
    }
    check_invariants(&tree);

    pairs.shuffle(&mut rng);
    let (gone, kept) = pairs.split_at(pairs.len() / 2);
    for (i, (key, id)) in gone.iter().enumerate() {
        assert!(tree.delete(key, id));
        if i % 53 == 0 {
            check_invariants(&tree);
        }
    }
    check_invariants(&tree);

    for (key, id) in kept {
        assert!(tree.contains(key, id));
    }
    for (key, id) in gone {
        assert!(!tree.contains(key, id));
    }
    assert_eq!(tree.value_count(), kept.len());

    for (key, id) in kept {
        assert!(tree.delete(key, id));
    }
    assert!(tree.is_empty());
}

#[test]
fn test_sequential_keys_stay_balanced() {
    let mut tree = BraidedTree::new();
    for k in 0..1024 {
        tree.insert(k, k);
    }
    check_invariants(&tree);
    for k in (0..1024).step_by(3) {
        tree.delete(&k, &k);
    }
    check_invariants(&tree);
    for k in (0..1024).rev() {
        tree.delete(&k, &k);
    }
    assert!(tree.is_empty());
}
