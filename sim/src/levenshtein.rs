use crate::SimilarityMeasure;

/// Normalized, case-insensitive Levenshtein similarity.
///
/// `1 - distance / max_len`, counted in chars after lowercasing. Two empty
/// strings are identical.
#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl Levenshtein {
    pub fn similarity(a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.to_lowercase().chars().collect();
        let b: Vec<char> = b.to_lowercase().chars().collect();
        let longest = a.len().max(b.len());
        if longest == 0 {
            return 1.0;
        }
        1.0 - distance(&a, &b) as f64 / longest as f64
    }
}

impl SimilarityMeasure<str> for Levenshtein {
    fn calculate(&self, a: &str, b: &str) -> f64 {
        Self::similarity(a, b)
    }
}

impl SimilarityMeasure<String> for Levenshtein {
    fn calculate(&self, a: &String, b: &String) -> f64 {
        Self::similarity(a, b)
    }
}

/// Edit distance between two strings, case-sensitive, in chars.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    distance(&a, &b)
}

fn distance(a: &[char], b: &[char]) -> usize {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut row: Vec<usize> = (0..=short.len()).collect();
    for (i, lc) in long.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(lc != sc);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }
    row[short.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
        assert_eq!(levenshtein_distance("Abc", "abc"), 1);
        assert_eq!(levenshtein_distance("über", "uber"), 1);
    }

    #[test]
    fn test_similarity() {
        assert_eq!(Levenshtein::similarity("", ""), 1.0);
        assert_eq!(Levenshtein::similarity("abc", ""), 0.0);
        assert_eq!(Levenshtein::similarity("ABBA", "abba"), 1.0);
        assert_eq!(Levenshtein::similarity("abcd", "abce"), 0.75);
        assert_eq!(Levenshtein::similarity("ab", "ba"), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [("Pink Floyd", "pink floid"), ("metal", "petals"), ("a", "abc")];
        for (a, b) in pairs {
            assert_eq!(Levenshtein.calculate(a, b), Levenshtein.calculate(b, a));
        }
    }
}
