//! Tree nodes and read-only node handles.

use std::fmt;

use crate::BraidedTree;

/// Stable handle of a node inside a [`BraidedTree`] arena.
///
/// A handle stays valid until the node is removed. Removing a node whose
/// neighbor takes over its payload keeps the handle of the surviving slot, so
/// handles must not be held across `delete` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// AVL balance indicator of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Skew {
    /// Both subtrees have the same height.
    #[default]
    Balanced,
    /// The left subtree is one level taller.
    LeftHigh,
    /// The right subtree is one level taller.
    RightHigh,
}

/// Which child slot of a parent a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) bucket: Vec<V>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) skew: Skew,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(key: K, value: V, parent: Option<NodeId>) -> Self {
        Self {
            key,
            bucket: vec![value],
            left: None,
            right: None,
            parent,
            prev: None,
            next: None,
            skew: Skew::Balanced,
        }
    }
}

/// Borrowed view of one node: its key, its bucket and its links.
///
/// `prev` and `next` follow the in-order thread and cost O(1) regardless of
/// where the neighbor sits in the tree.
pub struct NodeRef<'a, K, V> {
    pub(crate) tree: &'a BraidedTree<K, V>,
    pub(crate) id: NodeId,
}

impl<K, V> Clone for NodeRef<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodeRef<'_, K, V> {}

impl<'a, K, V> NodeRef<'a, K, V> {
    #[inline]
    fn node(&self) -> &'a Node<K, V> {
        self.tree.node(self.id)
    }

    #[inline]
    fn hop(&self, to: Option<NodeId>) -> Option<NodeRef<'a, K, V>> {
        to.map(|id| NodeRef { tree: self.tree, id })
    }

    /// Arena handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn key(&self) -> &'a K {
        &self.node().key
    }

    /// Values stored under this key, in insertion order.
    pub fn values(&self) -> &'a [V] {
        &self.node().bucket
    }

    pub fn contains(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.node().bucket.contains(value)
    }

    /// In-order predecessor.
    pub fn prev(&self) -> Option<NodeRef<'a, K, V>> {
        self.hop(self.node().prev)
    }

    /// In-order successor.
    pub fn next(&self) -> Option<NodeRef<'a, K, V>> {
        self.hop(self.node().next)
    }

    pub fn parent(&self) -> Option<NodeRef<'a, K, V>> {
        self.hop(self.node().parent)
    }

    pub fn left(&self) -> Option<NodeRef<'a, K, V>> {
        self.hop(self.node().left)
    }

    pub fn right(&self) -> Option<NodeRef<'a, K, V>> {
        self.hop(self.node().right)
    }

    pub fn skew(&self) -> Skew {
        self.node().skew
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for NodeRef<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", self.key())
            .field("values", &self.values())
            .field("skew", &self.skew())
            .finish()
    }
}
