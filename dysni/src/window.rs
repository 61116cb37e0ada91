//! Window builders: which neighboring buckets become candidates.
//!
//! Every builder starts from the node holding the query key, takes its whole
//! bucket, then walks the in-order thread towards smaller keys and towards
//! larger keys. The variants differ only in when a walk stops.

use std::fmt;
use std::hash::Hash;
use std::iter;
use std::sync::Arc;

use dysni_braid::NodeRef;
use dysni_sim::{SimilarityClassifier, SimilarityMeasure, SymmetricTable};
use dysni_store::RecordStore;

use crate::error::{DysniError, Result};

/// Stopping rule for the neighbor walk of one index.
pub enum WindowBuilder<R, K> {
    /// Exactly this many nodes on each side.
    Fixed(usize),

    /// Continue while the neighbor's key is similar to the query node's key.
    ///
    /// The walk stops at the first dissimilar neighbor, even if a similar
    /// key lies right behind it. Key similarities are cached per index.
    KeySimilarity(Arc<dyn SimilarityClassifier<K>>),

    /// Collect about this many candidates in total.
    ///
    /// Whatever the own bucket leaves of the budget is split evenly between
    /// the two directions. A side stops once its share is reached; the
    /// last bucket taken is never split.
    CandidateCount(usize),

    /// Continue while the share of neighbors that actually match the query
    /// record stays at or above `threshold`.
    ///
    /// This compares full records, so it fetches every neighbor from the
    /// store. Each direction keeps its own ratio.
    DuplicateRatio {
        threshold: f64,
        classifier: Arc<dyn SimilarityClassifier<R>>,
    },
}

impl<R, K> Clone for WindowBuilder<R, K> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(n) => Self::Fixed(*n),
            Self::KeySimilarity(sim) => Self::KeySimilarity(Arc::clone(sim)),
            Self::CandidateCount(n) => Self::CandidateCount(*n),
            Self::DuplicateRatio {
                threshold,
                classifier,
            } => Self::DuplicateRatio {
                threshold: *threshold,
                classifier: Arc::clone(classifier),
            },
        }
    }
}

impl<R, K> fmt::Debug for WindowBuilder<R, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => f.debug_tuple("Fixed").field(n).finish(),
            Self::KeySimilarity(sim) => f
                .debug_struct("KeySimilarity")
                .field("threshold", &sim.threshold())
                .finish(),
            Self::CandidateCount(n) => f.debug_tuple("CandidateCount").field(n).finish(),
            Self::DuplicateRatio { threshold, .. } => f
                .debug_struct("DuplicateRatio")
                .field("threshold", threshold)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Prev,
    Next,
}

impl Direction {
    const BOTH: [Direction; 2] = [Direction::Prev, Direction::Next];

    fn step<'a, K, I>(self, node: NodeRef<'a, K, I>) -> Option<NodeRef<'a, K, I>> {
        match self {
            Direction::Prev => node.prev(),
            Direction::Next => node.next(),
        }
    }

    /// Neighbors of `node` in this direction, nearest first.
    fn walk<'a, K, I>(self, node: NodeRef<'a, K, I>) -> impl Iterator<Item = NodeRef<'a, K, I>> {
        iter::successors(self.step(node), move |n| self.step(*n))
    }
}

impl<R, K> WindowBuilder<R, K> {
    pub fn key_similarity<C>(classifier: C) -> Self
    where
        C: SimilarityClassifier<K> + 'static,
    {
        Self::KeySimilarity(Arc::new(classifier))
    }

    pub fn duplicate_ratio<C>(threshold: f64, classifier: C) -> Self
    where
        C: SimilarityClassifier<R> + 'static,
    {
        Self::DuplicateRatio {
            threshold,
            classifier: Arc::new(classifier),
        }
    }

    /// Checks thresholds and budgets.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Fixed(_) => Ok(()),
            Self::KeySimilarity(sim) => check_threshold("key similarity", sim.threshold()),
            Self::CandidateCount(0) => Err(DysniError::Config(
                "candidate budget must be greater than zero".into(),
            )),
            Self::CandidateCount(_) => Ok(()),
            Self::DuplicateRatio {
                threshold,
                classifier,
            } => {
                check_threshold("duplicate ratio", *threshold)?;
                check_threshold("record similarity", classifier.threshold())
            }
        }
    }

    /// Candidate ids around `node` for `record`.
    ///
    /// `node` is the tree node holding the record's key; without one the
    /// window is empty. The own bucket comes first, then the smaller keys
    /// nearest first, then the larger keys nearest first. `cache` holds key
    /// similarities of this index; `store` is only read by
    /// [`WindowBuilder::DuplicateRatio`].
    pub fn build_window<I>(
        &self,
        record: &R,
        node: Option<NodeRef<'_, K, I>>,
        cache: &mut SymmetricTable<K, f64>,
        store: &dyn RecordStore<I, R>,
    ) -> Result<Vec<I>>
    where
        K: Ord + Hash + Clone,
        I: Clone,
    {
        let Some(node) = node else {
            return Ok(Vec::new());
        };
        let mut window = node.values().to_vec();

        match self {
            Self::Fixed(size) => {
                for dir in Direction::BOTH {
                    for n in dir.walk(node).take(*size) {
                        window.extend_from_slice(n.values());
                    }
                }
            }
            Self::KeySimilarity(sim) => {
                let center = node.key();
                for dir in Direction::BOTH {
                    for n in dir.walk(node) {
                        let s = *cache
                            .get_or_insert_with(n.key(), center, || sim.calculate(center, n.key()));
                        if !sim.is_similarity(s) {
                            break;
                        }
                        window.extend_from_slice(n.values());
                    }
                }
            }
            Self::CandidateCount(budget) => {
                let per_side = budget.saturating_sub(window.len()).div_ceil(2);
                for dir in Direction::BOTH {
                    let mut taken = 0;
                    for n in dir.walk(node) {
                        if taken >= per_side {
                            break;
                        }
                        taken += n.values().len();
                        window.extend_from_slice(n.values());
                    }
                }
            }
            Self::DuplicateRatio {
                threshold,
                classifier,
            } => {
                for dir in Direction::BOTH {
                    let (mut added, mut matches) = (0usize, 0usize);
                    for n in dir.walk(node) {
                        if added > 0 && (matches as f64 / added as f64) < *threshold {
                            break;
                        }
                        for id in n.values() {
                            let other = store.get(id)?;
                            if classifier.are_similar(record, &other) {
                                matches += 1;
                            }
                            added += 1;
                            window.push(id.clone());
                        }
                    }
                }
            }
        }
        Ok(window)
    }
}

fn check_threshold(what: &str, threshold: f64) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(DysniError::Config(format!(
            "{what} threshold {threshold} outside [0, 1]"
        )))
    }
}
