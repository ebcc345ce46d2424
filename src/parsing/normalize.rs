//! Hashable-line normalization.
//!
//! Chat exports are full of boilerplate: sticker placeholders, reaction
//! markers, `(image)` asides, one-word replies. Such lines are useless as
//! merge anchors because they repeat everywhere. [`LineNormalizer`] strips
//! the noise and drops whatever is too short to be trusted as a unique key.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::config::{MAX_ANNOTATION_LIMIT, MergeConfig};

/// Parenthetical asides, non-greedy: `(图片)`, `(edited)`.
static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("parenthetical regex is valid"));

static DEFAULT_NORMALIZER: LazyLock<LineNormalizer> =
    LazyLock::new(|| LineNormalizer::new(&MergeConfig::default()));

/// Normalizes content lines into their hashable form.
#[derive(Debug, Clone)]
pub struct LineNormalizer {
    annotation: Regex,
    min_chars: usize,
}

impl LineNormalizer {
    /// Builds a normalizer from the merge configuration.
    pub fn new(config: &MergeConfig) -> Self {
        let pattern = format!(r"\[[^\]]{{1,{}}}\]", config.max_annotation_chars.clamp(1, MAX_ANNOTATION_LIMIT));
        Self {
            annotation: Regex::new(&pattern).expect("annotation regex is valid"),
            min_chars: config.min_hashable_chars,
        }
    }

    /// Returns the normalized text, or `None` if the line is too short to anchor on.
    pub fn normalize(&self, line: &str) -> Option<String> {
        let text = PARENTHETICAL.replace_all(line, "");
        let text = self.annotation.replace_all(&text, "");
        let text = text.trim();
        if text.chars().count() < self.min_chars {
            return None;
        }
        Some(text.to_string())
    }
}

impl Default for LineNormalizer {
    fn default() -> Self {
        DEFAULT_NORMALIZER.clone()
    }
}

/// Normalizes a line with the default settings.
///
/// Strips parenthetical asides, strips bracketed annotations of at most five
/// characters, trims, and returns `None` if fewer than five characters remain.
///
/// ```
/// use chatsplice::parsing::normalize_for_hashing;
///
/// assert_eq!(
///     normalize_for_hashing("这是一个测试消息 (图片) [表情]").as_deref(),
///     Some("这是一个测试消息")
/// );
/// assert_eq!(normalize_for_hashing("短消息 (图片) [表情]"), None);
/// ```
pub fn normalize_for_hashing(line: &str) -> Option<String> {
    DEFAULT_NORMALIZER.normalize(line)
}

/// Returns the lowercase hex SHA-256 digest of a normalized line.
pub fn hash_line(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
