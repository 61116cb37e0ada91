use std::collections::HashMap;
use std::hash::Hash;

/// A map keyed by unordered pairs: `(a, b)` and `(b, a)` are the same entry.
///
/// Pairs are stored with the smaller element first, so lookups never need
/// to probe twice.
#[derive(Debug, Clone)]
pub struct SymmetricTable<K, V> {
    rows: HashMap<K, HashMap<K, V>>,
    len: usize,
}

impl<K, V> Default for SymmetricTable<K, V> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            len: 0,
        }
    }
}

impl<K: Ord + Hash + Clone, V> SymmetricTable<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.len = 0;
    }

    pub fn get(&self, a: &K, b: &K) -> Option<&V> {
        let (lo, hi) = ordered(a, b);
        self.rows.get(lo)?.get(hi)
    }

    /// Stores `value` for the pair, returning the previous value.
    pub fn insert(&mut self, a: &K, b: &K, value: V) -> Option<V> {
        let (lo, hi) = ordered(a, b);
        let old = self
            .rows
            .entry(lo.clone())
            .or_default()
            .insert(hi.clone(), value);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    /// Value for the pair, computing and storing it on a miss.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, a: &K, b: &K, f: F) -> &V {
        let (lo, hi) = ordered(a, b);
        let row = self.rows.entry(lo.clone()).or_default();
        if !row.contains_key(hi) {
            row.insert(hi.clone(), f());
            self.len += 1;
        }
        &row[hi]
    }
}

fn ordered<'a, K: Ord>(a: &'a K, b: &'a K) -> (&'a K, &'a K) {
    if a <= b { (a, b) } else { (b, a) }
}
