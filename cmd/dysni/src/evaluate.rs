//! Scores found duplicate pairs against a ground truth.

use std::collections::HashSet;
use std::io::{BufRead, Read};

use anyhow::{Context, bail};
use dysni_unionfind::UnionFind;
use serde::Serialize;

/// A duplicate pair with the smaller id first.
pub type Pair = (String, String);

pub fn pair(a: &str, b: &str) -> Pair {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub found: usize,
    pub true_duplicates: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub missed: usize,
    pub precision: f64,
    pub recall: f64,
    pub f_measure: f64,
}

/// Known duplicates, closed under transitivity.
#[derive(Debug, Default)]
pub struct GroundTruth {
    duplicates: UnionFind<String>,
}

impl GroundTruth {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut duplicates = UnionFind::new();
        for (a, b) in pairs {
            duplicates.union(a.into(), b.into());
        }
        Self { duplicates }
    }

    /// Reads a CSV with a header row; the first two columns of every row
    /// are one duplicate pair.
    pub fn from_csv<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut rows = csv::Reader::from_reader(reader);
        let mut pairs = Vec::new();
        for (line, row) in rows.records().enumerate() {
            let row = row.context("failed to read ground truth")?;
            match (row.get(0), row.get(1)) {
                (Some(a), Some(b)) => pairs.push((a.trim().to_string(), b.trim().to_string())),
                _ => bail!("ground truth row {}: expected two ids", line + 1),
            }
        }
        Ok(Self::from_pairs(pairs))
    }

    pub fn evaluate(&mut self, found: &HashSet<Pair>) -> Evaluation {
        let mut true_positives = 0;
        for (a, b) in found {
            if self.duplicates.connected(a, b) {
                true_positives += 1;
            }
        }
        let false_positives = found.len() - true_positives;

        let roots: Vec<String> = self.duplicates.roots().cloned().collect();
        let (mut true_duplicates, mut missed) = (0, 0);
        for root in roots {
            let mut members: Vec<String> = self.duplicates.get_component(&root).into_iter().collect();
            members.push(root);
            for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    true_duplicates += 1;
                    if !found.contains(&pair(a, b)) {
                        missed += 1;
                    }
                }
            }
        }

        let precision = ratio(true_positives, found.len());
        let recall = ratio(true_positives, true_duplicates);
        let f_measure = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Evaluation {
            found: found.len(),
            true_duplicates,
            true_positives,
            false_positives,
            missed,
            precision,
            recall,
            f_measure,
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Reads `id<TAB>duplicate` lines, merging both orders of a pair.
pub fn read_found<R: BufRead>(reader: R) -> anyhow::Result<HashSet<Pair>> {
    let mut found = HashSet::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once('\t') {
            Some((a, b)) if a.trim() != b.trim() => {
                found.insert(pair(a.trim(), b.trim()));
            }
            Some(_) => {}
            None => bail!("line {}: expected id<TAB>duplicate", n + 1),
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(pairs: &[(&str, &str)]) -> HashSet<Pair> {
        pairs.iter().map(|(a, b)| pair(a, b)).collect()
    }

    #[test]
    fn test_perfect() {
        let mut truth = GroundTruth::from_pairs([("1", "2"), ("2", "3")]);
        let e = truth.evaluate(&found(&[("1", "2"), ("3", "1"), ("2", "3")]));
        assert_eq!(e.true_duplicates, 3);
        assert_eq!(e.true_positives, 3);
        assert_eq!(e.missed, 0);
        assert_eq!(e.precision, 1.0);
        assert_eq!(e.recall, 1.0);
        assert_eq!(e.f_measure, 1.0);
    }

    #[test]
    fn test_partial() {
        let mut truth = GroundTruth::from_pairs([("a", "b"), ("c", "d")]);
        let e = truth.evaluate(&found(&[("a", "b"), ("a", "c")]));
        assert_eq!(e.found, 2);
        assert_eq!(e.true_positives, 1);
        assert_eq!(e.false_positives, 1);
        assert_eq!(e.missed, 1);
        assert_eq!(e.precision, 0.5);
        assert_eq!(e.recall, 0.5);
        assert_eq!(e.f_measure, 0.5);
    }

    #[test]
    fn test_nothing_found() {
        let mut truth = GroundTruth::from_pairs([("a", "b")]);
        let e = truth.evaluate(&HashSet::new());
        assert_eq!(e.precision, 0.0);
        assert_eq!(e.recall, 0.0);
        assert_eq!(e.f_measure, 0.0);
        assert_eq!(e.missed, 1);
    }

    #[test]
    fn test_truth_from_csv() {
        let data = "id1,id2\n1,2\n2,3\n7,8\n";
        let mut truth = GroundTruth::from_csv(data.as_bytes()).unwrap();
        let e = truth.evaluate(&HashSet::new());
        assert_eq!(e.true_duplicates, 4);
    }

    #[test]
    fn test_truth_rejects_short_rows() {
        let data = "id\n1\n";
        assert!(GroundTruth::from_csv(data.as_bytes()).is_err());
    }

    #[test]
    fn test_read_found_dedups() {
        let data = "1\t2\n2\t1\n\n3\t3\n4\t5\n";
        let pairs = read_found(data.as_bytes()).unwrap();
        assert_eq!(pairs, found(&[("1", "2"), ("4", "5")]));
        assert!(read_found("12\n".as_bytes()).is_err());
    }
}
