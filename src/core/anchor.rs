//! Hash index and sequence matching primitives for anchor search.
//!
//! A [`HashIndex`] keeps only the hashable lines of a sequence, each with
//! its position in that sequence. Anchors are found by matching runs of
//! hashes, then mapped back to physical line numbers through the index.

use crate::parsing::{LineNormalizer, hash_line};

/// One hashable line of an indexed sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashEntry<'a> {
    /// Hex SHA-256 of the normalized line
    pub hash: String,
    /// 0-based position of the line in its source sequence
    pub line: usize,
    /// The line as written, before normalization
    pub text: &'a str,
}

/// The hashable lines of a sequence, in order.
#[derive(Debug, Clone, Default)]
pub struct HashIndex<'a> {
    entries: Vec<HashEntry<'a>>,
}

impl<'a> HashIndex<'a> {
    /// Indexes every line that normalizes to a hashable form.
    pub fn build<S: AsRef<str>>(lines: &'a [S], normalizer: &LineNormalizer) -> Self {
        let entries = lines
            .iter()
            .enumerate()
            .filter_map(|(line, raw)| {
                let text = raw.as_ref();
                normalizer.normalize(text).map(|normalized| HashEntry {
                    hash: hash_line(&normalized),
                    line,
                    text,
                })
            })
            .collect();
        Self { entries }
    }

    /// Returns the indexed entries.
    pub fn entries(&self) -> &[HashEntry<'a>] {
        &self.entries
    }

    /// Returns the entry at `idx`.
    pub fn get(&self, idx: usize) -> Option<&HashEntry<'a>> {
        self.entries.get(idx)
    }

    /// Returns the number of hashable lines.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no line is hashable.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the hashes alone, for sequence matching.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.hash.as_str()).collect()
    }
}

/// Returns the start of the first contiguous occurrence of `needle` in `haystack`.
///
/// An empty needle never matches.
///
/// ```
/// use chatsplice::core::anchor::find_run;
///
/// assert_eq!(find_run(&[1, 2, 3, 2, 3], &[2, 3]), Some(1));
/// assert_eq!(find_run(&[1, 2, 3], &[3, 1]), None);
/// assert_eq!(find_run::<i32>(&[1, 2, 3], &[]), None);
/// ```
pub fn find_run<T: PartialEq>(haystack: &[T], needle: &[T]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Returns how many leading elements `a` and `b` share.
pub fn common_prefix_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Returns how many trailing elements `a` and `b` share.
pub fn common_suffix_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_skips_short_lines() {
        let lines = vec!["hello world", "", "ok", "another long line", "(图片)"];
        let index = HashIndex::build(&lines, &LineNormalizer::default());
        let positions: Vec<usize> = index.entries().iter().map(|e| e.line).collect();
        assert_eq!(positions, vec![0, 3]);
        assert_eq!(index.get(1).map(|e| e.text), Some("another long line"));
    }

    #[test]
    fn test_index_hashes_normalized_form() {
        let lines = vec!["see you soon (edited)", "see you soon"];
        let index = HashIndex::build(&lines, &LineNormalizer::default());
        assert_eq!(index.len(), 2);
        assert_eq!(index.entries()[0].hash, index.entries()[1].hash);
        assert_eq!(index.entries()[0].text, "see you soon (edited)");
    }

    #[test]
    fn test_index_empty() {
        let lines: Vec<String> = Vec::new();
        let index = HashIndex::build(&lines, &LineNormalizer::default());
        assert!(index.is_empty());
        assert!(index.keys().is_empty());
    }

    #[test]
    fn test_find_run_first_occurrence_wins() {
        assert_eq!(find_run(&["a", "b", "a", "b"], &["a", "b"]), Some(0));
        assert_eq!(find_run(&["x", "a", "b"], &["a", "b"]), Some(1));
    }

    #[test]
    fn test_find_run_longer_needle() {
        assert_eq!(find_run(&["a"], &["a", "b"]), None);
    }

    #[test]
    fn test_common_prefix_len() {
        assert_eq!(common_prefix_len(&[1, 2, 3, 9], &[1, 2, 3, 4, 5]), 3);
        assert_eq!(common_prefix_len(&[1, 2], &[1, 2, 3]), 2);
        assert_eq!(common_prefix_len::<i32>(&[], &[1]), 0);
    }

    #[test]
    fn test_common_suffix_len() {
        assert_eq!(common_suffix_len(&[0, 3, 4, 5], &[9, 9, 3, 4, 5]), 3);
        assert_eq!(common_suffix_len(&[1, 2], &[3, 4]), 0);
    }
}
