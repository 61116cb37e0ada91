//! Dynamic sorted neighborhood index for incremental entity resolution.
//!
//! Records arrive one at a time. Each [`DySNIndex`] sorts record ids by a
//! cheap blocking key in a braided tree, so likely duplicates end up as
//! in-order neighbors. When a record is resolved, a [`WindowBuilder`] picks
//! how far to walk from its key in each direction; the ids in those buckets
//! are the candidates. The [`Indexer`] merges the candidates of all its
//! indexes, compares the record against each with a similarity classifier,
//! and folds matches into transitive clusters.
//!
//! ```
//! use dysni::{IndexConfig, Indexer, WindowBuilder};
//! use dysni_sim::{AsClassifier, Levenshtein};
//! use dysni_store::MemoryStore;
//!
//! let first_char = |s: &String| s.chars().next();
//!
//! let mut indexer = Indexer::builder(MemoryStore::new(), Levenshtein.as_classifier(0.5))
//!     .index(IndexConfig::new("first", first_char, WindowBuilder::Fixed(1)))
//!     .build()
//!     .unwrap();
//!
//! assert!(indexer.add(&"AA".to_string(), 1).is_ok());
//! assert!(indexer.resolve(&"AA".to_string(), &1).unwrap().is_empty());
//!
//! indexer.add(&"BA".to_string(), 2).unwrap();
//! let cluster = indexer.resolve(&"BA".to_string(), &2).unwrap();
//! assert_eq!(cluster.into_iter().collect::<Vec<_>>(), vec![1]);
//! ```

pub mod error;
pub mod index;
pub mod indexer;
pub mod key;
pub mod resolver;
pub mod window;

pub use error::{DysniError, Result};
pub use index::{DySNIndex, IndexConfig, SortedIndex};
pub use indexer::{Indexer, IndexerBuilder};
pub use key::{KeyHandler, prefix_key};
pub use resolver::{BruteForceResolver, EntityResolver};
pub use window::WindowBuilder;
