//! Similarity measures and the threshold classifiers built on them.
//!
//! A [`SimilarityMeasure`] maps a pair of values to a score in `[0, 1]`.
//! A [`SimilarityClassifier`] adds a threshold and answers whether a pair
//! is similar enough to count as a match. Any measure becomes a classifier
//! through [`AsClassifier::as_classifier`].
//!
//! Scores outside `[0, 1]` are a bug in the measure. They are passed through
//! unchanged but logged with `tracing::warn!` when a classifier looks at them.
//!
//! ```
//! use dysni_sim::{AsClassifier, Levenshtein, SimilarityClassifier, SimilarityMeasure};
//!
//! let sim = Levenshtein.as_classifier(0.7);
//! assert!((sim.calculate("kitten", "sitten") - 5.0 / 6.0).abs() < 1e-9);
//! assert!(sim.are_similar("kitten", "sitten"));
//! assert!(!sim.are_similar("kitten", "mitts"));
//! ```

mod levenshtein;
mod table;

pub use levenshtein::{Levenshtein, levenshtein_distance};
pub use table::SymmetricTable;

use tracing::warn;

/// Scores how alike two values are.
pub trait SimilarityMeasure<T: ?Sized>: Send + Sync {
    /// Similarity of `a` and `b` in `[0, 1]`, where 1 means identical.
    fn calculate(&self, a: &T, b: &T) -> f64;
}

impl<T: ?Sized, F> SimilarityMeasure<T> for F
where
    F: Fn(&T, &T) -> f64 + Send + Sync,
{
    fn calculate(&self, a: &T, b: &T) -> f64 {
        self(a, b)
    }
}

/// A measure with a match threshold.
pub trait SimilarityClassifier<T: ?Sized>: SimilarityMeasure<T> {
    fn threshold(&self) -> f64;

    /// Whether `similarity` reaches the threshold. NaN never does.
    fn is_similarity(&self, similarity: f64) -> bool {
        checked(similarity) >= self.threshold()
    }

    fn are_similar(&self, a: &T, b: &T) -> bool {
        self.is_similarity(self.calculate(a, b))
    }
}

/// Returns `value` unchanged, warning when it is not a valid similarity.
pub fn checked(value: f64) -> f64 {
    if !(0.0..=1.0).contains(&value) {
        warn!(value, "similarity outside [0, 1]");
    }
    value
}

/// Wraps a measure with a fixed threshold.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<M> {
    measure: M,
    threshold: f64,
}

impl<M> Classifier<M> {
    pub fn new(measure: M, threshold: f64) -> Self {
        Self { measure, threshold }
    }

    pub fn measure(&self) -> &M {
        &self.measure
    }
}

impl<T: ?Sized, M: SimilarityMeasure<T>> SimilarityMeasure<T> for Classifier<M> {
    fn calculate(&self, a: &T, b: &T) -> f64 {
        self.measure.calculate(a, b)
    }
}

impl<T: ?Sized, M: SimilarityMeasure<T>> SimilarityClassifier<T> for Classifier<M> {
    fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Turns any measure into a [`Classifier`].
pub trait AsClassifier: Sized {
    fn as_classifier(self, threshold: f64) -> Classifier<Self> {
        Classifier::new(self, threshold)
    }
}

impl<M> AsClassifier for M {}

/// Equality as a similarity: 1 for equal values, 0 otherwise.
///
/// As a classifier its threshold is 1, so only equal values match.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exact;

impl<T: PartialEq + ?Sized> SimilarityMeasure<T> for Exact {
    fn calculate(&self, a: &T, b: &T) -> f64 {
        if a == b { 1.0 } else { 0.0 }
    }
}

impl<T: PartialEq + ?Sized> SimilarityClassifier<T> for Exact {
    fn threshold(&self) -> f64 {
        1.0
    }
}
