//! Core document and merge logic.
//!
//! This module contains:
//! - [`models`] - [`RawDocument`] and [`OrgDocument`]
//! - [`anchor`] - hash index and sequence matching
//! - [`merge`] - the [`Reconciler`] and its [`MergeOutcome`] audit record
//! - [`audit`] - YAML and JSONL audit artifacts
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chatsplice::core::{Reconciler, MergeStrategy};
//! use chatsplice::parser::parse_raw_document;
//! use std::path::Path;
//!
//! let doc = parse_raw_document(Path::new("raw.md"), Some(2024))?;
//! let reconciler = Reconciler::new();
//! for block in &doc.blocks {
//!     let target = Path::new("archive")
//!         .join(block.conversation())
//!         .join(format!("{}.md", block.time_tag().month_key()));
//!     let outcome = reconciler.reconcile(block, &target)?;
//!     if outcome.strategy() == MergeStrategy::NoMatch {
//!         println!("new content for {}", block.conversation());
//!     }
//! }
//! # Ok::<(), chatsplice::ChatspliceError>(())
//! ```

pub mod anchor;
pub mod audit;
pub mod merge;
pub mod models;

// Re-export main types for convenience
pub use audit::{BlockDump, BlockSummary, MergeDump, append_jsonl, write_yaml};
pub use merge::{Anchor, MergeOutcome, MergePlan, MergeStatus, MergeStrategy, Reconciler, reconcile};
pub use models::{OrgDocument, RawDocument};
