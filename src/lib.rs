//! # chatsplice
//!
//! A Rust library for reconciling exported chat-log fragments into
//! canonical, time-ordered, per-conversation monthly archives.
//!
//! ## Overview
//!
//! Chat exports arrive as arbitrary chunks of a conversation that often
//! overlap content already archived. chatsplice finds where a new fragment
//! overlaps an archive by hashing its normalized lines, and splices it in
//! exactly once.
//!
//! A chat document looks like this:
//!
//! ```text
//! ---
//! optional: front matter
//! ---
//! ## -- Project Group
//! -- 2024-06-01 14:30
//! Alice: the deploy is done
//! -- 07-02
//! Bob: thanks!
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatsplice::prelude::*;
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     let doc = BlockParser::new()
//!         .with_fallback_year(2024)
//!         .parse(Path::new("00-chats-input-raw/phone/export.md"))?;
//!
//!     let reconciler = Reconciler::new();
//!     for block in &doc.blocks {
//!         let target = archive_path(Path::new("archive"), block.conversation(), block.time_tag())?;
//!         let outcome = reconciler.reconcile(block, &target)?;
//!         println!("{} -> {}", target.display(), outcome.strategy());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`parsing`] - per-line classification: time markers, headings,
//!   front-matter delimiters, hashable-line normalization
//! - [`block`] - [`TimeTag`] and [`Block`]
//! - [`parser`] - [`BlockParser`](parser::BlockParser), lines to blocks
//! - [`core`] - documents, anchor search, the merge engine and audit records
//! - [`kb`] - knowledge base layout and archive paths
//! - [`ingest`] - batch driver used by the binary
//! - [`progress`] - ingestion progress callbacks
//! - [`config`] - [`MergeConfig`](config::MergeConfig), [`IngestConfig`](config::IngestConfig)
//! - [`error`] - [`ChatspliceError`] and [`Result`]
//! - [`cli`] - clap arguments (feature `cli`)

pub mod block;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod ingest;
pub mod kb;
pub mod parser;
pub mod parsing;
pub mod progress;

// Re-export the main types at the crate root for convenience
pub use block::{Block, TimeTag};
pub use error::{ChatspliceError, Result};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chatsplice::prelude::*;
/// ```
pub mod prelude {
    pub use crate::block::{Block, TimeTag};

    pub use crate::error::{ChatspliceError, Result};

    pub use crate::config::{IngestConfig, MergeConfig};

    pub use crate::parser::{BlockParser, parse_organized, parse_raw_document};

    pub use crate::core::{
        MergeOutcome, MergePlan, MergeStrategy, OrgDocument, RawDocument, Reconciler, reconcile,
    };

    pub use crate::kb::archive_path;

    pub use crate::ingest::{IngestReport, Ingestor};

    pub use crate::parsing::{classify_heading, classify_time_tag, normalize_for_hashing};
}
