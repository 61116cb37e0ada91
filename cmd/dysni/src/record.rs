//! CSV-backed records and the weighted field similarity used to match them.

use std::collections::{BTreeMap, HashSet};

use dysni_sim::{Levenshtein, SimilarityMeasure};
use serde::{Deserialize, Serialize};

/// One dataset row: field name to raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    /// The field's value, or `""` when the row lacks it.
    pub fn field(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// How a field is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Normalized Levenshtein similarity.
    Text,
    /// Digit-wise distance, weighting higher digits more.
    Year,
    /// Jaccard similarity of `|`-separated entries.
    List,
}

/// A compared field and its weight in the record score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind, weight: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            weight,
        }
    }
}

/// Weight-normalized sum of per-field similarities.
///
/// A text or year field that is empty on either side scores `missing`
/// instead of being compared.
#[derive(Debug, Clone)]
pub struct WeightedMeasure {
    fields: Vec<FieldSpec>,
    missing: f64,
    total_weight: f64,
}

impl WeightedMeasure {
    pub fn new(fields: Vec<FieldSpec>, missing: f64) -> Self {
        let total_weight = fields.iter().map(|f| f.weight).sum();
        Self {
            fields,
            missing,
            total_weight,
        }
    }

    fn field_similarity(&self, kind: FieldKind, a: &str, b: &str) -> f64 {
        match kind {
            FieldKind::Text => {
                if a.trim().is_empty() || b.trim().is_empty() {
                    self.missing
                } else {
                    Levenshtein::similarity(a.trim(), b.trim())
                }
            }
            FieldKind::Year => match (parse_year(a), parse_year(b)) {
                (Some(a), Some(b)) => year_similarity(a, b),
                _ => self.missing,
            },
            FieldKind::List => list_similarity(a, b),
        }
    }
}

impl SimilarityMeasure<Record> for WeightedMeasure {
    fn calculate(&self, a: &Record, b: &Record) -> f64 {
        if self.total_weight <= 0.0 {
            return 0.0;
        }
        let sum: f64 = self
            .fields
            .iter()
            .map(|f| f.weight * self.field_similarity(f.kind, a.field(&f.name), b.field(&f.name)))
            .sum();
        sum / self.total_weight
    }
}

fn parse_year(s: &str) -> Option<u32> {
    s.trim().parse().ok()
}

fn digits(mut n: u32) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

/// `1 - diff / max`, where digit `i` (from the least significant) weighs
/// `i + 1`.
pub fn year_similarity(a: u32, b: u32) -> f64 {
    let n = digits(a).max(digits(b));
    let (mut a, mut b) = (a, b);
    let (mut diff, mut max) = (0u32, 0u32);
    for i in 0..n as u32 {
        let weight = i + 1;
        max += weight * 9;
        diff += weight * (a % 10).abs_diff(b % 10);
        a /= 10;
        b /= 10;
    }
    1.0 - f64::from(diff) / f64::from(max)
}

/// Drops a leading track number (`"03 Song"` becomes `"Song"`).
fn trim_number(entry: &str) -> &str {
    let entry = entry.trim();
    let digits = entry.len() - entry.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return entry;
    }
    let rest = &entry[digits..];
    if rest.starts_with(char::is_whitespace) {
        rest.trim_start()
    } else {
        entry
    }
}

fn entries(list: &str) -> HashSet<String> {
    list.split('|')
        .map(|e| trim_number(e).to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Shared entries over all entries; two empty lists are identical.
pub fn list_similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (entries(a), entries(b));
    let union = a.union(&b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cd(artist: &str, title: &str, year: &str, tracks: &str) -> Record {
        [
            ("artist", artist),
            ("dtitle", title),
            ("year", year),
            ("tracks", tracks),
        ]
        .into_iter()
        .collect()
    }

    fn measure() -> WeightedMeasure {
        WeightedMeasure::new(
            vec![
                FieldSpec::new("artist", FieldKind::Text, 5.0),
                FieldSpec::new("dtitle", FieldKind::Text, 3.0),
                FieldSpec::new("tracks", FieldKind::List, 2.0),
                FieldSpec::new("year", FieldKind::Year, 1.0),
            ],
            0.7,
        )
    }

    #[test]
    fn test_missing_field_is_empty() {
        let r = cd("Muse", "", "", "");
        assert_eq!(r.field("artist"), "Muse");
        assert_eq!(r.field("genre"), "");
    }

    #[test]
    fn test_year_similarity() {
        assert_eq!(year_similarity(1999, 1999), 1.0);
        // one in the least significant digit: 1 / (9 * (1 + 2 + 3 + 4))
        assert!((year_similarity(1999, 1998) - (1.0 - 1.0 / 90.0)).abs() < 1e-12);
        assert!(year_similarity(1999, 2000) < year_similarity(1999, 1990));
        assert_eq!(year_similarity(0, 9), 0.0);
    }

    #[test]
    fn test_list_similarity() {
        assert_eq!(list_similarity("", ""), 1.0);
        assert_eq!(list_similarity("01 One|02 Two", "one|two"), 1.0);
        assert_eq!(list_similarity("One|Two", "Two|Three"), 1.0 / 3.0);
        assert_eq!(list_similarity("One", ""), 0.0);
        assert_eq!(list_similarity("1999", "1999"), 1.0);
    }

    #[test]
    fn test_trim_number() {
        assert_eq!(trim_number("03 Song"), "Song");
        assert_eq!(trim_number("  12\tSong "), "Song");
        assert_eq!(trim_number("99Luftballons"), "99Luftballons");
        assert_eq!(trim_number("Song"), "Song");
    }

    #[test]
    fn test_identical_records() {
        let r = cd("Metallica", "Load", "1996", "Ain't My Bitch|2 x 4");
        assert!((measure().calculate(&r, &r) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_values_score_neutral() {
        let a = cd("Muse", "", "", "");
        let b = cd("Muse", "Absolution", "", "");
        // artist 5 * 1, title 3 * 0.7, tracks 2 * 1, year 1 * 0.7
        let expected = (5.0 + 2.1 + 2.0 + 0.7) / 11.0;
        assert!((measure().calculate(&a, &b) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_typo_stays_close() {
        let a = cd("Metallica", "Load", "1996", "Until It Sleeps");
        let b = cd("Netallica", "Load", "1996", "Until It Sleeps");
        let c = cd("Mozart", "Requiem", "1791", "Lacrimosa");
        let m = measure();
        assert!(m.calculate(&a, &b) > 0.9);
        assert!(m.calculate(&a, &c) < 0.5);
    }

    #[test]
    fn test_zero_weight_scores_zero() {
        let m = WeightedMeasure::new(Vec::new(), 0.7);
        assert_eq!(m.calculate(&Record::default(), &Record::default()), 0.0);
    }
}
