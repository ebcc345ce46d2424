//! Unified error types for chatsplice.
//!
//! This module provides a single [`ChatspliceError`] enum that covers all error
//! cases in the library, in the same shape as `reqwest`, `serde_json`, and `csv`.
//!
//! # Error Handling Philosophy
//!
//! - **Fail fast**: an unresolvable time tag aborts the whole file being parsed
//! - **Fail before writing**: archive invariant violations surface before any
//!   byte of the target archive is touched
//! - **Locatable**: parse errors carry the file path and 1-based line number

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for chatsplice operations.
///
/// # Example
///
/// ```rust
/// use chatsplice::error::Result;
/// use chatsplice::Block;
///
/// fn my_function() -> Result<Vec<Block>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChatspliceError>;

/// The error type for all chatsplice operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatspliceError {
    /// An I/O error occurred.
    ///
    /// Missing target archives are *not* reported through this variant; they
    /// are treated as empty archives.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A time marker line could not be turned into a full `YYYY-MM-DD HH:mm` tag.
    #[error("Time tag error: {0}")]
    TimeTag(#[from] TimeTagErrorKind),

    /// A document failed to parse at a specific line.
    #[error("Failed to parse {} at line {line}: {source}", path.display())]
    Parse {
        /// The file being parsed
        path: PathBuf,
        /// 1-based line number of the offending line
        line: usize,
        /// The underlying classification error
        #[source]
        source: TimeTagErrorKind,
    },

    /// An organized archive broke one of its invariants.
    ///
    /// Raised when an archive contains more than one conversation, or when a
    /// block for another conversation is appended to it.
    #[error("Archive invariant violated{}: {message}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    InvariantViolation {
        /// The archive path, if known
        path: Option<PathBuf>,
        /// Description of the violated invariant
        message: String,
    },

    /// The ingestion input directory is not inside the raw-input root.
    #[error("Input directory {} must be located under {}", input.display(), root.display())]
    InvalidInputDir {
        /// The directory passed on the command line
        input: PathBuf,
        /// The knowledge base's raw-input root
        root: PathBuf,
    },

    /// A conversation name cannot be used as an archive directory.
    #[error("Conversation name '{name}' cannot be used as an archive directory")]
    InvalidConversation {
        /// The heading's conversation name
        name: String,
    },

    /// YAML serialization error while writing audit artifacts.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error while writing the run audit log.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Kinds of time tag errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeTagErrorKind {
    /// The tag is partial and neither a reference nor a fallback year can complete it,
    /// or the digits do not form a valid date/time.
    #[error("cannot resolve '{tag}': {reason}")]
    Unresolvable {
        /// The tag text after the `--` marker
        tag: String,
        /// Why completion failed
        reason: &'static str,
    },

    /// A reference tag was not in `YYYY-MM-DD` or `YYYY-MM-DD HH:mm` form.
    #[error("invalid reference '{reference}'. Expected format: YYYY-MM-DD or YYYY-MM-DD HH:mm")]
    InvalidReference {
        /// The rejected reference text
        reference: String,
    },
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatspliceError {
    /// Creates an unresolvable time tag error.
    pub fn unresolvable(tag: impl Into<String>, reason: &'static str) -> Self {
        ChatspliceError::TimeTag(TimeTagErrorKind::Unresolvable {
            tag: tag.into(),
            reason,
        })
    }

    /// Creates an invalid reference error.
    pub fn invalid_reference(reference: impl Into<String>) -> Self {
        ChatspliceError::TimeTag(TimeTagErrorKind::InvalidReference {
            reference: reference.into(),
        })
    }

    /// Creates an invariant violation error.
    pub fn invariant(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        ChatspliceError::InvariantViolation {
            path,
            message: message.into(),
        }
    }

    /// Attaches a file location to a time tag error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn at_line(self, path: impl Into<PathBuf>, line: usize) -> Self {
        match self {
            ChatspliceError::TimeTag(source) => ChatspliceError::Parse {
                path: path.into(),
                line,
                source,
            },
            other => other,
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChatspliceError::Io(_))
    }

    /// Returns `true` if this is a time tag error, located or not.
    pub fn is_time_tag(&self) -> bool {
        matches!(
            self,
            ChatspliceError::TimeTag(_) | ChatspliceError::Parse { .. }
        )
    }

    /// Returns `true` if this is an archive invariant violation.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, ChatspliceError::InvariantViolation { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
