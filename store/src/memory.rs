//! In-memory record store.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::{RecordStore, StoreError, StoreResult};

/// A record store backed by a HashMap.
///
/// Clones share the same map. Reads take a shared lock, so parallel
/// comparisons do not serialize on lookups.
#[derive(Clone)]
pub struct MemoryStore<I, R> {
    data: Arc<RwLock<HashMap<I, R>>>,
    closed: Arc<AtomicBool>,
}

impl<I, R> MemoryStore<I, R> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl<I, R> Default for MemoryStore<I, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, R> RecordStore<I, R> for MemoryStore<I, R>
where
    I: Eq + Hash + Clone + Send + Sync,
    R: Clone + Send + Sync,
{
    fn put(&self, id: &I, record: &R) -> StoreResult<()> {
        self.check_open()?;
        let mut data = self
            .data
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        data.insert(id.clone(), record.clone());
        Ok(())
    }

    fn get(&self, id: &I) -> StoreResult<R> {
        self.check_open()?;
        let data = self
            .data
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        data.get(id).cloned().ok_or(StoreError::NotFound)
    }

    fn all(&self) -> StoreResult<Vec<(I, R)>> {
        self.check_open()?;
        let data = self
            .data
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(data.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn len(&self) -> StoreResult<usize> {
        self.check_open()?;
        let data = self
            .data
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(data.len())
    }

    fn close(&self) -> StoreResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let mut data = self
                .data
                .write()
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            data.clear();
        }
        Ok(())
    }
}
