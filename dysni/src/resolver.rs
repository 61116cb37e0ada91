//! The entity resolver contract and the exhaustive baseline.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use dysni_sim::SimilarityClassifier;
use dysni_store::RecordStore;
use dysni_unionfind::UnionFind;
use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::indexer::Indexer;

/// Finds, for each arriving record, the earlier records of the same entity.
pub trait EntityResolver<R, I> {
    /// Store and index the record, then resolve it.
    fn insert(&mut self, record: &R, id: I) -> Result<HashSet<I>>;

    /// Every other member of the record's cluster after comparing it
    /// against its candidates.
    fn resolve(&mut self, record: &R, id: &I) -> Result<HashSet<I>>;

    /// Pairwise comparisons performed so far.
    fn comparisons(&self) -> u64;

    fn close(&mut self) -> Result<()>;
}

impl<R, I> EntityResolver<R, I> for Indexer<R, I>
where
    R: Send + Sync + 'static,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn insert(&mut self, record: &R, id: I) -> Result<HashSet<I>> {
        self.add(record, id.clone())?;
        Indexer::resolve(self, record, &id)
    }

    fn resolve(&mut self, record: &R, id: &I) -> Result<HashSet<I>> {
        Indexer::resolve(self, record, id)
    }

    fn comparisons(&self) -> u64 {
        Indexer::comparisons(self)
    }

    fn close(&mut self) -> Result<()> {
        Indexer::close(self)
    }
}

/// Compares every record against every stored record.
///
/// Quadratic; useful as ground truth for what the indexes can find.
pub struct BruteForceResolver<R, I> {
    store: Arc<dyn RecordStore<I, R>>,
    classifier: Arc<dyn SimilarityClassifier<R>>,
    union_find: UnionFind<I>,
    parallel: bool,
    comparisons: u64,
}

impl<R, I> BruteForceResolver<R, I>
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

    /// Like [`BruteForceResolver::new`] for a store and classifier the
    /// caller keeps handles to.
    pub fn with_shared(
        store: Arc<dyn RecordStore<I, R>>,
        classifier: Arc<dyn SimilarityClassifier<R>>,
    ) -> Self {
        Self {
            store,
            classifier,
            union_find: UnionFind::new(),
            parallel: true,
            comparisons: 0,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn clusters(&self) -> &UnionFind<I> {
        &self.union_find
    }
}

impl<R, I> EntityResolver<R, I> for BruteForceResolver<R, I>
where
    R: Send + Sync + 'static,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn insert(&mut self, record: &R, id: I) -> Result<HashSet<I>> {
        self.store.put(&id, record)?;
        self.resolve(record, &id)
    }

    fn resolve(&mut self, record: &R, id: &I) -> Result<HashSet<I>> {
        let others: Vec<(I, R)> = self
            .store
            .all()?
            .into_iter()
            .filter(|(other, _)| other != id)
            .collect();
        self.comparisons += others.len() as u64;

        let classifier = self.classifier.as_ref();
        let matches: Vec<I> = if self.parallel {
            others
                .into_par_iter()
                .filter(|(_, other)| classifier.are_similar(record, other))
                .map(|(other, _)| other)
                .collect()
        } else {
            others
                .into_iter()
                .filter(|(_, other)| classifier.are_similar(record, other))
                .map(|(other, _)| other)
                .collect()
        };
        debug!(matches = matches.len(), "brute-force resolved record");

        for other in matches {
            self.union_find.union(id.clone(), other);
        }
        Ok(self.union_find.get_component(id))
    }

    fn comparisons(&self) -> u64 {
        self.comparisons
    }

    fn close(&mut self) -> Result<()> {
        self.store.close()?;
        Ok(())
    }
}
