//! Braided AVL tree for sorted-neighborhood indexing.
//!
//! A [`BraidedTree`] is an AVL-balanced binary search tree whose nodes are
//! additionally threaded into a doubly linked list in key order. Walking to
//! the in-order predecessor or successor of any node is a single hop, no
//! matter how the tree is currently shaped.
//!
//! Every key owns a bucket of values, so several values can share one key.
//!
//! Nodes live in an arena owned by the tree and refer to each other by
//! [`NodeId`]. Parent and thread links are plain indices and never own
//! anything.
//!
//! # Example
//!
//! ```rust
//! use dysni_braid::BraidedTree;
//!
//! let mut tree = BraidedTree::new();
//! tree.insert("smi", 1);
//! tree.insert("jon", 2);
//! tree.insert("smi", 3);
//! tree.insert("mil", 4);
//!
//! let node = tree.find("mil").unwrap();
//! assert_eq!(node.prev().map(|n| *n.key()), Some("jon"));
//! assert_eq!(node.next().map(|n| n.values()), Some(&[1, 3][..]));
//!
//! let keys: Vec<_> = tree.iter().map(|n| *n.key()).collect();
//! assert_eq!(keys, ["jon", "mil", "smi"]);
//! ```

mod node;

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::mem;

use node::{Node, Side};

pub use node::{NodeId, NodeRef, Skew};

/// Balanced search tree with in-order threading. See the crate docs.
pub struct BraidedTree<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    nodes: usize,
    values: usize,
}

impl<K, V> Default for BraidedTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> BraidedTree<K, V> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            nodes: 0,
            values: 0,
        }
    }

    /// Number of distinct keys (nodes).
    pub fn len(&self) -> usize {
        self.nodes
    }

    /// Number of values across all buckets.
    pub fn value_count(&self) -> usize {
        self.values
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Removes every node and releases the arena.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.root = None;
        self.nodes = 0;
        self.values = 0;
    }

    pub fn root(&self) -> Option<NodeRef<'_, K, V>> {
        self.root.map(|id| self.handle(id))
    }

    /// Node with the smallest key.
    pub fn first(&self) -> Option<NodeRef<'_, K, V>> {
        self.extreme(Side::Left).map(|id| self.handle(id))
    }

    /// Node with the largest key.
    pub fn last(&self) -> Option<NodeRef<'_, K, V>> {
        self.extreme(Side::Right).map(|id| self.handle(id))
    }

    /// Resolves a handle, or `None` if the node has been removed.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_, K, V>> {
        match self.slots.get(id.index()) {
            Some(Some(_)) => Some(self.handle(id)),
            _ => None,
        }
    }

    /// Iterates nodes in ascending key order by following the `next` thread.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: self,
            next: self.extreme(Side::Left),
        }
    }

    /// Iterates all values in key order, bucket by bucket.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().flat_map(|node| node.values().iter())
    }

    #[inline]
    fn handle(&self, id: NodeId) -> NodeRef<'_, K, V> {
        NodeRef { tree: self, id }
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
        match self.slots.get(id.index()) {
            Some(Some(node)) => node,
            _ => dangling(id),
        }
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => dangling(id),
        }
    }

    fn extreme(&self, side: Side) -> Option<NodeId> {
        let mut id = self.root?;
        loop {
            let node = self.node(id);
            let child = match side {
                Side::Left => node.left,
                Side::Right => node.right,
            };
            match child {
                Some(c) => id = c,
                None => return Some(id),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Arena
    // -----------------------------------------------------------------------

    fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        self.nodes += 1;
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                let id = NodeId(self.slots.len() as u32);
                self.slots.push(Some(node));
                id
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        if self.slots[id.index()].take().is_some() {
            self.nodes -= 1;
            self.free.push(id);
        }
    }

    // -----------------------------------------------------------------------
    // Structural links
    // -----------------------------------------------------------------------

    /// Threads `before` and `after` as direct in-order neighbors.
    fn link(&mut self, before: Option<NodeId>, after: Option<NodeId>) {
        if let Some(b) = before {
            self.node_mut(b).next = after;
        }
        if let Some(a) = after {
            self.node_mut(a).prev = before;
        }
    }

    fn set_left(&mut self, id: NodeId, child: Option<NodeId>) {
        self.node_mut(id).left = child;
        if let Some(c) = child {
            self.node_mut(c).parent = Some(id);
        }
    }

    fn set_right(&mut self, id: NodeId, child: Option<NodeId>) {
        self.node_mut(id).right = child;
        if let Some(c) = child {
            self.node_mut(c).parent = Some(id);
        }
    }

    /// Puts `new` where `old` hangs below `parent` (or at the root).
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            Some(p) => {
                let node = self.node_mut(p);
                if node.left == Some(old) {
                    node.left = new;
                } else {
                    node.right = new;
                }
            }
            None => self.root = new,
        }
        if let Some(c) = new {
            self.node_mut(c).parent = parent;
        }
    }

    fn side_of(&self, parent: NodeId, child: NodeId) -> Side {
        if self.node(parent).left == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn left_of(&self, id: NodeId) -> NodeId {
        match self.node(id).left {
            Some(l) => l,
            None => unreachable!("braid: left-high node {id:?} has no left child"),
        }
    }

    fn right_of(&self, id: NodeId) -> NodeId {
        match self.node(id).right {
            Some(r) => r,
            None => unreachable!("braid: right-high node {id:?} has no right child"),
        }
    }

    #[inline]
    fn skew(&self, id: NodeId) -> Skew {
        self.node(id).skew
    }

    #[inline]
    fn set_skew(&mut self, id: NodeId, skew: Skew) {
        self.node_mut(id).skew = skew;
    }

    // -----------------------------------------------------------------------
    // Rotations
    //
    // Rotations move whole nodes, never keys or buckets, so the in-order
    // sequence of node ids is the same before and after. The prev/next thread
    // therefore stays exact without being touched. Skews are finalized by the
    // caller.
    // -----------------------------------------------------------------------

    /// Counter-clockwise rotation around `id`. Returns the new subtree top.
    fn rotate_left(&mut self, id: NodeId) -> NodeId {
        let pivot = self.right_of(id);
        let parent = self.node(id).parent;
        self.replace_child(parent, id, Some(pivot));
        let inner = self.node(pivot).left;
        self.set_right(id, inner);
        self.set_left(pivot, Some(id));
        pivot
    }

    /// Clockwise rotation around `id`. Returns the new subtree top.
    fn rotate_right(&mut self, id: NodeId) -> NodeId {
        let pivot = self.left_of(id);
        let parent = self.node(id).parent;
        self.replace_child(parent, id, Some(pivot));
        let inner = self.node(pivot).right;
        self.set_left(id, inner);
        self.set_right(pivot, Some(id));
        pivot
    }

    /// Double rotation lifting the inner grandchild on the `heavy` side of
    /// `id`: left-right for `Side::Left`, right-left for `Side::Right`.
    fn rotate_double(&mut self, id: NodeId, heavy: Side) -> NodeId {
        let (top, lower_left, lower_right, s) = match heavy {
            Side::Left => {
                let child = self.left_of(id);
                let s = self.skew(self.right_of(child));
                self.rotate_left(child);
                (self.rotate_right(id), child, id, s)
            }
            Side::Right => {
                let child = self.right_of(id);
                let s = self.skew(self.left_of(child));
                self.rotate_right(child);
                (self.rotate_left(id), id, child, s)
            }
        };
        let (ll, lr) = match s {
            Skew::LeftHigh => (Skew::Balanced, Skew::RightHigh),
            Skew::RightHigh => (Skew::LeftHigh, Skew::Balanced),
            Skew::Balanced => (Skew::Balanced, Skew::Balanced),
        };
        self.set_skew(lower_left, ll);
        self.set_skew(lower_right, lr);
        self.set_skew(top, Skew::Balanced);
        top
    }

    // -----------------------------------------------------------------------
    // Rebalancing
    // -----------------------------------------------------------------------

    /// The `side` subtree of `id` grew by one level. Returns whether the
    /// subtree rooted at `id` grew as well.
    fn rebalance_grown(&mut self, id: NodeId, side: Side) -> bool {
        let (same, opposite) = match side {
            Side::Left => (Skew::LeftHigh, Skew::RightHigh),
            Side::Right => (Skew::RightHigh, Skew::LeftHigh),
        };
        let skew = self.skew(id);
        if skew == opposite {
            self.set_skew(id, Skew::Balanced);
            return false;
        }
        if skew == Skew::Balanced {
            self.set_skew(id, same);
            return true;
        }

        let child = match side {
            Side::Left => self.left_of(id),
            Side::Right => self.right_of(id),
        };
        if self.skew(child) == same {
            let top = match side {
                Side::Left => self.rotate_right(id),
                Side::Right => self.rotate_left(id),
            };
            self.set_skew(top, Skew::Balanced);
            self.set_skew(id, Skew::Balanced);
        } else {
            self.rotate_double(id, side);
        }
        false
    }

    /// The `side` subtree of `id` shrank by one level. Returns the node now
    /// on top of this subtree and whether the subtree got shorter.
    fn rebalance_shrunk(&mut self, id: NodeId, side: Side) -> (NodeId, bool) {
        let (same, opposite, heavy) = match side {
            Side::Left => (Skew::LeftHigh, Skew::RightHigh, Side::Right),
            Side::Right => (Skew::RightHigh, Skew::LeftHigh, Side::Left),
        };
        let skew = self.skew(id);
        if skew == same {
            self.set_skew(id, Skew::Balanced);
            return (id, true);
        }
        if skew == Skew::Balanced {
            self.set_skew(id, opposite);
            return (id, false);
        }

        let child = match heavy {
            Side::Left => self.left_of(id),
            Side::Right => self.right_of(id),
        };
        let child_skew = self.skew(child);
        if child_skew == same {
            return (self.rotate_double(id, heavy), true);
        }
        let top = match heavy {
            Side::Left => self.rotate_right(id),
            Side::Right => self.rotate_left(id),
        };
        if child_skew == Skew::Balanced {
            self.set_skew(top, same);
            self.set_skew(id, opposite);
            (top, false)
        } else {
            self.set_skew(top, Skew::Balanced);
            self.set_skew(id, Skew::Balanced);
            (top, true)
        }
    }

    /// Walks up from `id` while the subtree below keeps growing.
    fn retrace_grown(&mut self, mut id: NodeId, mut side: Side) {
        while self.rebalance_grown(id, side) {
            let Some(parent) = self.node(id).parent else {
                return;
            };
            side = self.side_of(parent, id);
            id = parent;
        }
    }

    /// Walks up from `id` while the subtree below keeps shrinking.
    fn retrace_shrunk(&mut self, mut id: NodeId, mut side: Side) {
        loop {
            let (top, shorter) = self.rebalance_shrunk(id, side);
            if !shorter {
                return;
            }
            let Some(parent) = self.node(top).parent else {
                return;
            };
            side = self.side_of(parent, top);
            id = parent;
        }
    }
}

impl<K: Ord, V> BraidedTree<K, V> {
    /// Returns the node holding exactly `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<NodeRef<'_, K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_id(key).map(|id| self.handle(id))
    }

    /// Returns true if `value` is stored under `key`.
    pub fn contains<Q>(&self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        V: PartialEq,
    {
        self.find_id(key)
            .is_some_and(|id| self.node(id).bucket.contains(value))
    }

    fn find_id<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = self.node(id);
            cur = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    /// Adds `value` to the bucket of `key`, creating and balancing a new node
    /// if the key is not present yet. Returns the node holding `key`.
    ///
    /// Values are not deduplicated within a bucket.
    pub fn insert(&mut self, key: K, value: V) -> NodeId {
        self.values += 1;
        let Some(mut cur) = self.root else {
            let id = self.alloc(Node::new(key, value, None));
            self.root = Some(id);
            return id;
        };
        loop {
            let (ord, left, right) = {
                let node = self.node(cur);
                (key.cmp(&node.key), node.left, node.right)
            };
            match ord {
                Ordering::Equal => {
                    self.node_mut(cur).bucket.push(value);
                    return cur;
                }
                Ordering::Less => match left {
                    Some(l) => cur = l,
                    None => return self.attach(cur, Side::Left, key, value),
                },
                Ordering::Greater => match right {
                    Some(r) => cur = r,
                    None => return self.attach(cur, Side::Right, key, value),
                },
            }
        }
    }

    fn attach(&mut self, parent: NodeId, side: Side, key: K, value: V) -> NodeId {
        let id = self.alloc(Node::new(key, value, Some(parent)));
        match side {
            Side::Left => {
                self.node_mut(parent).left = Some(id);
                let before = self.node(parent).prev;
                self.link(before, Some(id));
                self.link(Some(id), Some(parent));
            }
            Side::Right => {
                self.node_mut(parent).right = Some(id);
                let after = self.node(parent).next;
                self.link(Some(parent), Some(id));
                self.link(Some(id), after);
            }
        }
        self.retrace_grown(parent, side);
        id
    }

    /// Removes one occurrence of `value` from the bucket of `key`. A node
    /// whose bucket becomes empty is unlinked and the tree rebalanced.
    ///
    /// Returns false, leaving the tree untouched, if the pair is absent.
    pub fn delete<Q>(&mut self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        V: PartialEq,
    {
        let Some(id) = self.find_id(key) else {
            return false;
        };
        let bucket = &mut self.node_mut(id).bucket;
        let Some(pos) = bucket.iter().position(|v| v == value) else {
            return false;
        };
        bucket.remove(pos);
        let emptied = bucket.is_empty();
        self.values -= 1;
        if emptied {
            self.remove_node(id);
        }
        true
    }

    fn remove_node(&mut self, id: NodeId) {
        let (left, right, skew, prev, next) = {
            let node = self.node(id);
            (node.left, node.right, node.skew, node.prev, node.next)
        };

        // A node with two children hands its slot to the neighbor from the
        // taller side; that neighbor has at most one child.
        let target = match (left, right) {
            (Some(_), Some(_)) => {
                let neighbor = match skew {
                    Skew::RightHigh => next,
                    _ => prev,
                };
                let Some(neighbor) = neighbor else {
                    unreachable!("braid: inner node {id:?} without in-order neighbor")
                };
                self.swap_payload(id, neighbor);
                neighbor
            }
            _ => id,
        };

        let (child, parent, before, after) = {
            let node = self.node(target);
            (node.left.or(node.right), node.parent, node.prev, node.next)
        };
        self.link(before, after);
        let side = parent.map(|p| self.side_of(p, target));
        self.replace_child(parent, target, child);
        self.release(target);

        if let (Some(parent), Some(side)) = (parent, side) {
            self.retrace_shrunk(parent, side);
        }
    }

    fn swap_payload(&mut self, a: NodeId, b: NodeId) {
        let Some(mut other) = self.slots[b.index()].take() else {
            dangling(b)
        };
        let node = self.node_mut(a);
        mem::swap(&mut node.key, &mut other.key);
        mem::swap(&mut node.bucket, &mut other.bucket);
        self.slots[b.index()] = Some(other);
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BraidedTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|n| (n.key(), n.values())))
            .finish()
    }
}

/// Forward iterator over nodes in key order. A clone is an independent cursor
/// at the same position; [`BraidedTree::iter`] starts over from the smallest key.
pub struct Iter<'a, K, V> {
    tree: &'a BraidedTree<K, V>,
    next: Option<NodeId>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            next: self.next,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = NodeRef<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.node(id).next;
        Some(self.tree.handle(id))
    }
}

impl<'a, K, V> IntoIterator for &'a BraidedTree<K, V> {
    type Item = NodeRef<'a, K, V>;
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cold]
fn dangling(id: NodeId) -> ! {
    panic!("braid: dangling node handle {id:?}")
}

#[cfg(test)]
mod tests;
