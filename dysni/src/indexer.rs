//! Orchestrates several indexes, the record store and the match clusters.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dysni_sim::SimilarityClassifier;
use dysni_store::RecordStore;
use dysni_unionfind::UnionFind;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{DysniError, Result};
use crate::index::{DySNIndex, IndexConfig, SortedIndex};

/// Incremental entity resolver over one or more sort orders.
///
/// Records are stored, then sorted into every index. Resolving a record
/// gathers the windows of all indexes, compares the record against each
/// candidate and merges matches into clusters. Clusters only grow.
///
/// Mutation is single-writer: `add`, `resolve` and `remove` take
/// `&mut self`. Only the candidate comparisons inside `resolve` run in
/// parallel, and only when the parallel flag is set.
pub struct Indexer<R, I> {
    indexes: Vec<Box<dyn SortedIndex<R, I>>>,
    store: Arc<dyn RecordStore<I, R>>,
    classifier: Arc<dyn SimilarityClassifier<R>>,
    union_find: UnionFind<I>,
    parallel: bool,
    comparisons: u64,
}

/// Builder for [`Indexer`].
pub struct IndexerBuilder<R, I> {
    store: Arc<dyn RecordStore<I, R>>,
    classifier: Arc<dyn SimilarityClassifier<R>>,
    indexes: Vec<Box<dyn SortedIndex<R, I>>>,
    invalid: Option<DysniError>,
    parallel: bool,
}

impl<R, I> IndexerBuilder<R, I>
where
    R: Send + Sync + 'static,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new<S, C>(store: S, classifier: C) -> Self
    where
        S: RecordStore<I, R> + 'static,
        C: SimilarityClassifier<R> + 'static,
    {
        Self::with_shared(Arc::new(store), Arc::new(classifier))
    }

    /// Like [`IndexerBuilder::new`] for a store and classifier the caller
    /// keeps handles to.
    pub fn with_shared(
        store: Arc<dyn RecordStore<I, R>>,
        classifier: Arc<dyn SimilarityClassifier<R>>,
    ) -> Self {
        Self {
            store,
            classifier,
            indexes: Vec::new(),
            invalid: None,
            parallel: true,
        }
    }

    /// Add a sort order.
    pub fn index<K>(mut self, config: IndexConfig<R, K>) -> Self
    where
        K: Ord + Hash + Clone + Send + 'static,
    {
        if self.invalid.is_none() {
            if let Err(e) = config.validate() {
                self.invalid = Some(match e {
                    DysniError::Config(msg) => {
                        DysniError::Config(format!("index {}: {}", config.name, msg))
                    }
                    other => other,
                });
            }
        }
        self.indexes.push(Box::new(DySNIndex::<R, K, I>::new(config)));
        self
    }

    /// Compare candidates on the rayon pool. Enabled by default.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Build the indexer, rejecting invalid configurations.
    pub fn build(self) -> Result<Indexer<R, I>> {
        if let Some(e) = self.invalid {
            return Err(e);
        }
        if self.indexes.is_empty() {
            return Err(DysniError::Config("at least one index is required".into()));
        }
        let threshold = self.classifier.threshold();
        if !(0.0..=1.0).contains(&threshold) {
            return Err(DysniError::Config(format!(
                "record similarity threshold {threshold} outside [0, 1]"
            )));
        }
        let mut names = HashSet::new();
        for index in &self.indexes {
            if !names.insert(index.name()) {
                return Err(DysniError::Config(format!(
                    "duplicate index name: {}",
                    index.name()
                )));
            }
        }

        let index_names: Vec<&str> = self.indexes.iter().map(|i| i.name()).collect();
        info!(
            indexes = ?index_names,
            parallel = self.parallel,
            threshold,
            "indexer ready"
        );

        Ok(Indexer {
            indexes: self.indexes,
            store: self.store,
            classifier: self.classifier,
            union_find: UnionFind::new(),
            parallel: self.parallel,
            comparisons: 0,
        })
    }
}

impl<R, I> Indexer<R, I>
where
    R: Send + Sync + 'static,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Create a builder for an indexer.
    pub fn builder<S, C>(store: S, classifier: C) -> IndexerBuilder<R, I>
    where
        S: RecordStore<I, R> + 'static,
        C: SimilarityClassifier<R> + 'static,
    {
        IndexerBuilder::new(store, classifier)
    }

    /// Store the record and sort it into every index.
    pub fn add(&mut self, record: &R, id: I) -> Result<()> {
        self.store.put(&id, record)?;
        for index in &mut self.indexes {
            index.insert(record, id.clone());
        }
        Ok(())
    }

    /// Compare the record against its candidates and return every other
    /// member of its cluster.
    ///
    /// The record should already be added; otherwise its own key may be
    /// missing from the trees and the windows come back empty.
    pub fn resolve(&mut self, record: &R, id: &I) -> Result<HashSet<I>> {
        let mut candidates = HashSet::new();
        for index in &mut self.indexes {
            candidates.extend(index.find_candidates(record, self.store.as_ref())?);
        }
        candidates.remove(id);
        let candidates: Vec<I> = candidates.into_iter().collect();

        let matches = self.compare(record, &candidates)?;
        self.comparisons += candidates.len() as u64;
        debug!(
            candidates = candidates.len(),
            matches = matches.len(),
            "resolved record"
        );

        for other in matches {
            self.union_find.union(id.clone(), other);
        }
        Ok(self.union_find.get_component(id))
    }

    fn compare(&self, record: &R, candidates: &[I]) -> Result<Vec<I>> {
        let store = self.store.as_ref();
        let classifier = self.classifier.as_ref();
        let check = |candidate: &I| -> Result<Option<I>> {
            let other = store.get(candidate)?;
            Ok(classifier
                .are_similar(record, &other)
                .then(|| candidate.clone()))
        };

        let checked: Vec<Option<I>> = if self.parallel {
            candidates.par_iter().map(check).collect::<Result<_>>()?
        } else {
            candidates.iter().map(check).collect::<Result<_>>()?
        };
        Ok(checked.into_iter().flatten().collect())
    }

    /// Take the id out of every index. Clusters keep it.
    ///
    /// Returns `true` if any index held the pair.
    pub fn remove(&mut self, record: &R, id: &I) -> bool {
        let mut removed = false;
        for index in &mut self.indexes {
            removed |= index.remove(record, id);
        }
        removed
    }

    /// Candidate comparisons performed so far.
    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }

    /// `(name, ids)` per index.
    pub fn index_sizes(&self) -> Vec<(&str, usize)> {
        self.indexes.iter().map(|i| (i.name(), i.len())).collect()
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    pub fn store(&self) -> &Arc<dyn RecordStore<I, R>> {
        &self.store
    }

    pub fn clusters(&self) -> &UnionFind<I> {
        &self.union_find
    }

    /// Release the record store.
    pub fn close(&mut self) -> Result<()> {
        self.store.close()?;
        Ok(())
    }
}

impl<R, I> fmt::Debug for Indexer<R, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.indexes.iter().map(|i| i.name()).collect();
        f.debug_struct("Indexer")
            .field("indexes", &names)
            .field("parallel", &self.parallel)
            .field("comparisons", &self.comparisons)
            .finish_non_exhaustive()
    }
}
