//! One sort order over the records: a key handler, a braided tree of ids
//! and a window builder.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dysni_braid::BraidedTree;
use dysni_sim::SymmetricTable;
use dysni_store::RecordStore;

use crate::error::Result;
use crate::key::KeyHandler;
use crate::window::WindowBuilder;

/// Everything needed to build one [`DySNIndex`].
pub struct IndexConfig<R, K> {
    pub name: String,
    pub key_handler: Arc<dyn KeyHandler<R, K>>,
    pub window: WindowBuilder<R, K>,
}

impl<R, K> IndexConfig<R, K> {
    pub fn new<H>(name: impl Into<String>, key_handler: H, window: WindowBuilder<R, K>) -> Self
    where
        H: KeyHandler<R, K> + 'static,
    {
        Self {
            name: name.into(),
            key_handler: Arc::new(key_handler),
            window,
        }
    }

    /// Checks the window builder's thresholds and budget.
    pub fn validate(&self) -> Result<()> {
        self.window.validate()
    }
}

impl<R, K> Clone for IndexConfig<R, K> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            key_handler: Arc::clone(&self.key_handler),
            window: self.window.clone(),
        }
    }
}

impl<R, K> fmt::Debug for IndexConfig<R, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexConfig")
            .field("name", &self.name)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

/// Dynamic sorted neighborhood index over one blocking key.
pub struct DySNIndex<R, K, I> {
    name: String,
    key_handler: Arc<dyn KeyHandler<R, K>>,
    window: WindowBuilder<R, K>,
    tree: BraidedTree<K, I>,
    key_cache: SymmetricTable<K, f64>,
}

impl<R, K, I> DySNIndex<R, K, I>
where
    K: Ord + Hash + Clone,
    I: Clone + PartialEq,
{
    pub fn new(config: IndexConfig<R, K>) -> Self {
        Self {
            name: config.name,
            key_handler: config.key_handler,
            window: config.window,
            tree: BraidedTree::new(),
            key_cache: SymmetricTable::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn window(&self) -> &WindowBuilder<R, K> {
        &self.window
    }

    pub fn tree(&self) -> &BraidedTree<K, I> {
        &self.tree
    }

    /// Number of ids in the index.
    pub fn len(&self) -> usize {
        self.tree.value_count()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Sorts `id` in under the record's key. Returns `false` if the record
    /// has no key.
    pub fn insert(&mut self, record: &R, id: I) -> bool {
        match self.key_handler.compute_key(record) {
            Some(key) => {
                self.tree.insert(key, id);
                true
            }
            None => false,
        }
    }

    /// Removes `id` from the bucket of the record's key. Returns `false` if
    /// the pair was not indexed.
    pub fn remove(&mut self, record: &R, id: &I) -> bool {
        match self.key_handler.compute_key(record) {
            Some(key) => self.tree.delete(&key, id),
            None => false,
        }
    }

    /// Window around the record's key.
    ///
    /// Records without a key, or whose key is not in the tree, get an
    /// empty window.
    pub fn find_candidates(&mut self, record: &R, store: &dyn RecordStore<I, R>) -> Result<Vec<I>> {
        let node = match self.key_handler.compute_key(record) {
            Some(key) => self.tree.find(&key),
            None => None,
        };
        self.window
            .build_window(record, node, &mut self.key_cache, store)
    }
}

impl<R, K, I> fmt::Debug for DySNIndex<R, K, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DySNIndex")
            .field("name", &self.name)
            .field("window", &self.window)
            .field("keys", &self.tree.len())
            .field("ids", &self.tree.value_count())
            .finish()
    }
}

/// Key-type-erased view of a [`DySNIndex`], so one resolver can hold
/// indexes sorted by different key types.
pub trait SortedIndex<R, I>: Send {
    fn name(&self) -> &str;
    fn insert(&mut self, record: &R, id: I) -> bool;
    fn remove(&mut self, record: &R, id: &I) -> bool;
    fn find_candidates(&mut self, record: &R, store: &dyn RecordStore<I, R>) -> Result<Vec<I>>;
    fn len(&self) -> usize;
}

impl<R, K, I> SortedIndex<R, I> for DySNIndex<R, K, I>
where
    K: Ord + Hash + Clone + Send,
    I: Clone + PartialEq + Send,
{
    fn name(&self) -> &str {
        DySNIndex::name(self)
    }

    fn insert(&mut self, record: &R, id: I) -> bool {
        DySNIndex::insert(self, record, id)
    }

    fn remove(&mut self, record: &R, id: &I) -> bool {
        DySNIndex::remove(self, record, id)
    }

    fn find_candidates(&mut self, record: &R, store: &dyn RecordStore<I, R>) -> Result<Vec<I>> {
        DySNIndex::find_candidates(self, record, store)
    }

    fn len(&self) -> usize {
        DySNIndex::len(self)
    }
}
