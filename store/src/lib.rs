//! Record store interface and implementations.
//!
//! The resolver keeps only ids in its indexes and fetches full records
//! from a [`RecordStore`] when it needs to compare them. [`MemoryStore`]
//! keeps everything in a map; [`RedbStore`] persists records in a redb
//! database, encoded with MessagePack.

pub mod memory;
pub mod redb;

use std::fmt;
use thiserror::Error;

/// Errors that can occur in record store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store: not found")]
    NotFound,

    #[error("store: closed")]
    Closed,

    #[error("store: storage error: {0}")]
    Storage(String),

    #[error("store: serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Stores and retrieves records by id.
///
/// Every method fails with [`StoreError::Closed`] after [`close`](Self::close).
pub trait RecordStore<I, R>: Send + Sync {
    /// Store a record, replacing any record stored under the same id.
    fn put(&self, id: &I, record: &R) -> StoreResult<()>;

    /// Get a record by id; [`StoreError::NotFound`] if absent.
    fn get(&self, id: &I) -> StoreResult<R>;

    /// All stored `(id, record)` pairs, in no particular order.
    fn all(&self) -> StoreResult<Vec<(I, R)>>;

    /// Number of stored records.
    fn len(&self) -> StoreResult<usize>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Release the store. Closing twice is not an error.
    fn close(&self) -> StoreResult<()>;
}

impl<I, R> fmt::Debug for dyn RecordStore<I, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordStore {{ ... }}")
    }
}

/// A boxed record store for use in trait objects.
pub type BoxedRecordStore<I, R> = Box<dyn RecordStore<I, R>>;

pub use self::memory::MemoryStore;
pub use self::redb::RedbStore;
