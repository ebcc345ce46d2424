//! Progress reporting for ingestion runs.
//!
//! The [`Ingestor`](crate::ingest::Ingestor) pushes an [`IngestEvent`] to a
//! callback at every step, so callers can report progress without the
//! library printing anything itself.
//!
//! # Example
//!
//! ```rust
//! use chatsplice::progress::{IngestEvent, ProgressCallback};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let callback: ProgressCallback = Arc::new(|event| {
//!     if let IngestEvent::FileParsed { rel, blocks } = event {
//!         println!("{}: {} blocks", rel.display(), blocks);
//!     }
//! });
//!
//! callback(&IngestEvent::FileParsed { rel: PathBuf::from("phone/a.md"), blocks: 3 });
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::merge::MergeStrategy;

/// One step of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    /// A source file was parsed.
    FileParsed {
        /// Path relative to the raw-input root
        rel: PathBuf,
        /// Number of blocks found
        blocks: usize,
    },

    /// A block was merged (or planned, in dry-run mode).
    BlockMerged {
        rel: PathBuf,
        /// Position of the block in its file
        index: usize,
        target: PathBuf,
        strategy: MergeStrategy,
        added_lines: i64,
    },

    /// A consumed source file was moved out of the raw-input tree.
    FileRelocated { rel: PathBuf, to: PathBuf },
}

/// Callback type for receiving ingestion events.
pub type ProgressCallback = Arc<dyn Fn(&IngestEvent) + Send + Sync>;

/// Creates a callback that ignores every event.
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}
