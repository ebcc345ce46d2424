//! Configuration types for merging and ingestion.
//!
//! This module provides plain configuration structs for library usage,
//! without any CLI framework dependencies.
//!
//! - [`MergeConfig`] - anchor window size and line normalization knobs
//! - [`IngestConfig`] - batch settings for the ingestion driver
//!
//! # Example
//!
//! ```rust
//! use chatsplice::config::{IngestConfig, MergeConfig};
//!
//! let config = IngestConfig::new()
//!     .with_fallback_year(2024)
//!     .with_merge(MergeConfig::new().with_window_size(3));
//!
//! assert_eq!(config.merge.window_size, 3);
//! ```

use serde::{Deserialize, Serialize};

/// Default number of hashable lines used as an anchor window.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Default minimum length (in characters) of a normalized line to be hashable.
pub const DEFAULT_MIN_HASHABLE_CHARS: usize = 5;

/// Default maximum length of a bracketed annotation that is stripped before hashing.
pub const DEFAULT_MAX_ANNOTATION_CHARS: usize = 5;

/// Upper bound for [`MergeConfig::max_annotation_chars`].
pub const MAX_ANNOTATION_LIMIT: usize = 64;

/// Configuration for the merge engine.
///
/// A small window risks false anchors on generic short exchanges; a large one
/// risks missing a true overlap when the incoming block is itself short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Number of hashable lines matched at each end of a block (default: 5)
    pub window_size: usize,

    /// Normalized lines shorter than this are not used as anchors (default: 5)
    pub min_hashable_chars: usize,

    /// Bracketed annotations up to this many characters are stripped (default: 5, at most 64)
    pub max_annotation_chars: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_hashable_chars: DEFAULT_MIN_HASHABLE_CHARS,
            max_annotation_chars: DEFAULT_MAX_ANNOTATION_CHARS,
        }
    }
}

impl MergeConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the anchor window size. Zero is raised to one.
    #[must_use]
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size.max(1);
        self
    }

    /// Sets the minimum hashable line length.
    #[must_use]
    pub fn with_min_hashable_chars(mut self, chars: usize) -> Self {
        self.min_hashable_chars = chars;
        self
    }

    /// Sets the longest bracketed annotation stripped before hashing.
    #[must_use]
    pub fn with_max_annotation_chars(mut self, chars: usize) -> Self {
        self.max_annotation_chars = chars.clamp(1, MAX_ANNOTATION_LIMIT);
        self
    }
}

/// Configuration for a batch ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Year used to complete `MM-DD` tags when no earlier tag exists in a file
    pub fallback_year: Option<i32>,

    /// Plan merges and write audit artifacts, but leave archives and inputs untouched
    pub dry_run: bool,

    /// Merge engine settings
    pub merge: MergeConfig,
}

impl IngestConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fallback year.
    #[must_use]
    pub fn with_fallback_year(mut self, year: i32) -> Self {
        self.fallback_year = Some(year);
        self
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Sets the merge engine configuration.
    #[must_use]
    pub fn with_merge(mut self, merge: MergeConfig) -> Self {
        self.merge = merge;
        self
    }
}
