//! Dataset configuration.
//!
//! A dataset file names the id column, the fields compared when matching,
//! and one entry per sort order:
//!
//! ```yaml
//! id_field: did
//! threshold: 0.7
//! fields:
//!   - { name: artist, kind: text, weight: 5 }
//!   - { name: year, kind: year }
//! indexes:
//!   - name: artist-title
//!     key: [{ field: artist, len: 3 }, { field: dtitle, len: 3 }]
//!     window: { kind: key_similarity, threshold: 0.8 }
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use dysni::{IndexConfig, WindowBuilder, prefix_key};
use dysni_sim::{AsClassifier, Levenshtein, SimilarityClassifier};
use serde::{Deserialize, Serialize};

use crate::record::{FieldKind, FieldSpec, Record, WeightedMeasure};

/// Matching setup for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Column holding the record id.
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Record similarity at or above which two records match.
    pub threshold: f64,

    /// Score of a text or year field that is empty on either side.
    /// Defaults to `threshold`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<f64>,

    pub fields: Vec<FieldSpec>,

    pub indexes: Vec<IndexSpec>,
}

fn default_id_field() -> String {
    "id".to_string()
}

/// One sort order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub key: Vec<KeyPart>,
    pub window: WindowSpec,
}

/// A prefix of one field, part of a blocking key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPart {
    pub field: String,
    pub len: usize,
}

impl KeyPart {
    fn new(field: &str, len: usize) -> Self {
        Self {
            field: field.to_string(),
            len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowSpec {
    Fixed { size: usize },
    /// Levenshtein similarity between keys.
    KeySimilarity { threshold: f64 },
    CandidateCount { budget: usize },
    /// Uses the record classifier of the dataset.
    DuplicateRatio { threshold: f64 },
}

impl Default for DatasetConfig {
    /// The CD dataset: two complementary artist/title keys.
    fn default() -> Self {
        let text = |name: &str, weight| FieldSpec::new(name, FieldKind::Text, weight);
        Self {
            id_field: "did".to_string(),
            threshold: 0.7,
            missing: None,
            fields: vec![
                text("artist", 5.0),
                text("dtitle", 3.0),
                FieldSpec::new("tracks", FieldKind::List, 2.0),
                text("category", 1.0),
                text("cdextra", 1.0),
                text("genre", 1.0),
                FieldSpec::new("year", FieldKind::Year, 1.0),
            ],
            indexes: vec![
                IndexSpec {
                    name: "artist-title".to_string(),
                    key: vec![KeyPart::new("artist", 3), KeyPart::new("dtitle", 3)],
                    window: WindowSpec::KeySimilarity { threshold: 0.8 },
                },
                IndexSpec {
                    name: "title-artist".to_string(),
                    key: vec![KeyPart::new("dtitle", 3), KeyPart::new("artist", 3)],
                    window: WindowSpec::KeySimilarity { threshold: 0.6 },
                },
            ],
        }
    }
}

impl DatasetConfig {
    /// Loads and validates a YAML dataset file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&data)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects what the indexer cannot check itself: missing fields and
    /// empty keys.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fields.is_empty() {
            bail!("no fields to compare");
        }
        if self.fields.iter().any(|f| f.weight < 0.0) {
            bail!("field weights must not be negative");
        }
        if self.fields.iter().map(|f| f.weight).sum::<f64>() <= 0.0 {
            bail!("field weights sum to zero");
        }
        if let Some(missing) = self.missing {
            if !(0.0..=1.0).contains(&missing) {
                bail!("missing score {missing} outside [0, 1]");
            }
        }
        for index in &self.indexes {
            if index.key.is_empty() {
                bail!("index {}: empty key", index.name);
            }
        }
        Ok(())
    }

    pub fn measure(&self) -> WeightedMeasure {
        WeightedMeasure::new(self.fields.clone(), self.missing.unwrap_or(self.threshold))
    }

    pub fn classifier(&self) -> Arc<dyn SimilarityClassifier<Record>> {
        Arc::new(self.measure().as_classifier(self.threshold))
    }

    /// Index configurations; duplicate-ratio windows share `classifier`.
    pub fn index_configs(
        &self,
        classifier: &Arc<dyn SimilarityClassifier<Record>>,
    ) -> Vec<IndexConfig<Record, String>> {
        self.indexes
            .iter()
            .map(|spec| {
                let parts = spec.key.clone();
                let key_handler = move |r: &Record| -> Option<String> {
                    Some(prefix_key(
                        parts.iter().map(|p| (r.field(&p.field), p.len)),
                    ))
                };
                let window = match spec.window {
                    WindowSpec::Fixed { size } => WindowBuilder::Fixed(size),
                    WindowSpec::KeySimilarity { threshold } => {
                        WindowBuilder::key_similarity(Levenshtein.as_classifier(threshold))
                    }
                    WindowSpec::CandidateCount { budget } => WindowBuilder::CandidateCount(budget),
                    WindowSpec::DuplicateRatio { threshold } => WindowBuilder::DuplicateRatio {
                        threshold,
                        classifier: Arc::clone(classifier),
                    },
                };
                IndexConfig::new(spec.name.clone(), key_handler, window)
            })
            .collect()
    }
}
