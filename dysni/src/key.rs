//! Blocking key extraction.

/// Derives the blocking key a record is sorted by in one index.
///
/// `None` means the record has no key for this index; it is then neither
/// inserted into nor looked up in that index.
pub trait KeyHandler<R, K>: Send + Sync {
    fn compute_key(&self, record: &R) -> Option<K>;
}

impl<R, K, F> KeyHandler<R, K> for F
where
    F: Fn(&R) -> Option<K> + Send + Sync,
{
    fn compute_key(&self, record: &R) -> Option<K> {
        self(record)
    }
}

/// Concatenates lowercased prefixes of several string fields.
///
/// `parts` lists `(field, len)` pairs; each field contributes at most `len`
/// chars. A record whose fields are all empty yields the empty key, which
/// still sorts and blocks like any other key.
pub fn prefix_key<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    let mut key = String::new();
    for (value, len) in parts {
        key.extend(value.trim().chars().take(len).flat_map(char::to_lowercase));
    }
    key
}
