//! Error types for the resolver.

use dysni_store::StoreError;

/// Result type alias for index and resolver operations.
pub type Result<T> = std::result::Result<T, DysniError>;

/// Error type for index and resolver operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DysniError {
    /// Record store failure while storing or fetching a record.
    #[error("dysni: {0}")]
    Store(#[from] StoreError),

    /// Invalid index or resolver configuration.
    #[error("dysni: invalid config: {0}")]
    Config(String),
}
