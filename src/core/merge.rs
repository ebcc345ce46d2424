//! Hash-anchored merge engine.
//!
//! [`Reconciler::reconcile`] splices one [`Block`] into its target archive
//! exactly once. The first and last `window_size` hashable lines of the block
//! are searched as contiguous runs among the hashable lines of the target.
//! Depending on which ends anchor, the block is spliced over the overlap
//! (both-match), appended after it (begin-match), prepended before it
//! (end-match), or inserted by time order into a re-rendered archive
//! (no-match).
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use chatsplice::core::merge::{MergeStrategy, Reconciler};
//! use chatsplice::{Block, TimeTag};
//!
//! let tag: TimeTag = "2024-03-01 10:00".parse()?;
//! let block = Block::new("Project", tag, vec!["Alice: morning everyone".into()], "raw.md");
//!
//! let plan = Reconciler::new().plan(&block, Path::new("Project/2024-03.md"), None)?;
//! assert_eq!(plan.outcome.strategy(), MergeStrategy::NoMatch);
//! assert_eq!(plan.lines[0], "## -- Project");
//! # Ok::<(), chatsplice::ChatspliceError>(())
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::anchor::{HashIndex, common_prefix_len, common_suffix_len, find_run};
use super::models::OrgDocument;
use crate::block::{Block, TimeTag};
use crate::config::MergeConfig;
use crate::error::Result;
use crate::parser::parse_organized_lines;
use crate::parsing::LineNormalizer;

/// How a block was spliced into its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Both ends anchored in order; the block replaces the span between them
    BothMatch,
    /// Only the start anchored; the block's tail follows the overlap
    BeginMatch,
    /// Only the end anchored; the block's head precedes the overlap
    EndMatch,
    /// No anchor; inserted by time order into a canonical re-render
    NoMatch,
}

impl MergeStrategy {
    /// Returns all strategies in priority order.
    pub fn all() -> &'static [MergeStrategy] {
        &[
            MergeStrategy::BothMatch,
            MergeStrategy::BeginMatch,
            MergeStrategy::EndMatch,
            MergeStrategy::NoMatch,
        ]
    }

    /// Returns the hyphenated display name.
    pub fn as_str(self) -> &'static str {
        match self {
            MergeStrategy::BothMatch => "both-match",
            MergeStrategy::BeginMatch => "begin-match",
            MergeStrategy::EndMatch => "end-match",
            MergeStrategy::NoMatch => "no-match",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the computed lines have been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    /// Computed by [`Reconciler::plan`], nothing written
    Planned,
    /// Written to the target file
    Written,
}

/// One anchor of a merge, as recorded in the audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// Whether the window was found in the target
    pub found: bool,
    /// Block line of the anchor: first hashable line for the start anchor,
    /// last hashable line for the end anchor
    pub index_in_block: Option<usize>,
    /// Target line matched with `index_in_block`
    pub line_in_target: Option<usize>,
    /// Trimmed text of the matched target line
    pub preview: String,
    /// Physical lines spanned by the extended overlap in the target
    pub overlap_lines_in_target: usize,
    /// Physical lines spanned by the extended overlap in the block
    pub overlap_lines_in_block: usize,
}

/// Identification of a merge call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeMeta {
    pub target: PathBuf,
    pub conversation: String,
    pub block_tag: TimeTag,
    /// Local wall-clock time of the call, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetStats {
    pub exists: bool,
    pub initial_total_lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStats {
    pub total_lines: usize,
    pub hashable_lines: usize,
    pub ignored_lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDetails {
    pub start_anchor: Anchor,
    pub end_anchor: Anchor,
}

/// Hashable lines between the two anchors, block versus target.
///
/// Only populated for [`MergeStrategy::BothMatch`]. A positive `diff_count`
/// means the target held hashable lines in that span that the block does not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapAnalysis {
    pub block_hashes_between: usize,
    pub target_hashes_between: usize,
    pub diff_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTaken {
    pub strategy: MergeStrategy,
    pub final_total_lines: usize,
    /// Net line change of the target, negative when a splice shrank it
    pub added_lines: i64,
    pub status: MergeStatus,
}

/// Audit record of one merge call. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub meta: MergeMeta,
    pub target_stats: TargetStats,
    pub block_stats: BlockStats,
    pub match_details: MatchDetails,
    pub overlap_analysis: OverlapAnalysis,
    pub action_taken: ActionTaken,
}

impl MergeOutcome {
    /// Returns the chosen strategy.
    pub fn strategy(&self) -> MergeStrategy {
        self.action_taken.strategy
    }

    /// Returns the net line change of the target.
    pub fn added_lines(&self) -> i64 {
        self.action_taken.added_lines
    }

    /// Returns the target path.
    pub fn target(&self) -> &Path {
        &self.meta.target
    }
}

/// The result of planning a merge: the new target content and its audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    /// Full content of the target after the merge, without terminators
    pub lines: Vec<String>,
    pub outcome: MergeOutcome,
}

/// A matched, extended run of hashable lines, in physical line numbers.
#[derive(Debug, Clone, Copy)]
struct Hit<'a> {
    /// Anchor line in the block
    block_line: usize,
    /// Anchor line in the target
    target_line: usize,
    /// Overlap in the block, inclusive
    block_span: (usize, usize),
    /// Overlap in the target, inclusive
    target_span: (usize, usize),
    preview: &'a str,
}

impl Hit<'_> {
    fn to_anchor(self) -> Anchor {
        Anchor {
            found: true,
            index_in_block: Some(self.block_line),
            line_in_target: Some(self.target_line),
            preview: self.preview.trim().to_string(),
            overlap_lines_in_target: self.target_span.1 - self.target_span.0 + 1,
            overlap_lines_in_block: self.block_span.1 - self.block_span.0 + 1,
        }
    }
}

fn to_anchor(hit: Option<Hit<'_>>) -> Anchor {
    hit.map(Hit::to_anchor).unwrap_or_default()
}

/// Merges blocks into organized archives.
#[derive(Debug, Clone)]
pub struct Reconciler {
    config: MergeConfig,
    normalizer: LineNormalizer,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    /// Creates a reconciler with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MergeConfig::default())
    }

    /// Creates a reconciler with a custom configuration.
    pub fn with_config(config: MergeConfig) -> Self {
        Self {
            normalizer: LineNormalizer::new(&config),
            config,
        }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Computes the merged content of `target_path` without touching the filesystem.
    ///
    /// `existing` is the current content of the target, or `None` when the
    /// target does not exist yet.
    ///
    /// # Errors
    ///
    /// On the no-match path the existing content is parsed as an organized
    /// archive; a parse error or an archive invariant violation is returned
    /// before anything is written.
    pub fn plan(
        &self,
        block: &Block,
        target_path: &Path,
        existing: Option<&[String]>,
    ) -> Result<MergePlan> {
        let target: &[String] = existing.unwrap_or_default();
        let block_index = HashIndex::build(&block.content, &self.normalizer);
        let target_index = HashIndex::build(target, &self.normalizer);

        let begin = self.find_begin(&block_index, &target_index);
        let end = self.find_end(&block_index, &target_index);
        debug!(
            "event=anchor_search module=merge target={} block_hashable={} target_hashable={} begin={} end={}",
            target_path.display(),
            block_index.len(),
            target_index.len(),
            begin.is_some(),
            end.is_some()
        );

        let mut overlap = OverlapAnalysis::default();
        let (strategy, lines) = match (begin, end) {
            (Some(b), Some(e)) if b.target_line <= e.target_line => {
                overlap = analyze_overlap(&block_index, &target_index, b, e);
                if overlap.diff_count != 0 {
                    warn!(
                        "event=overlap_mismatch module=merge target={} block_between={} target_between={}",
                        target_path.display(),
                        overlap.block_hashes_between,
                        overlap.target_hashes_between
                    );
                }
                let lines = concat(&[
                    &target[..b.target_line],
                    &block.content[b.block_line..=e.block_line],
                    &target[e.target_line + 1..],
                ]);
                (MergeStrategy::BothMatch, lines)
            }
            (Some(b), _) => {
                let cut = b.target_span.1 + 1;
                let lines = concat(&[
                    &target[..cut],
                    &block.content[b.block_span.1 + 1..],
                    &target[cut..],
                ]);
                (MergeStrategy::BeginMatch, lines)
            }
            (None, Some(e)) => {
                let cut = e.target_span.0;
                let lines = concat(&[
                    &target[..cut],
                    &block.content[..e.block_span.0],
                    &target[cut..],
                ]);
                (MergeStrategy::EndMatch, lines)
            }
            (None, None) => {
                let mut doc = match existing {
                    Some(lines) => parse_organized_lines(lines, target_path)?,
                    None => OrgDocument::new(target_path),
                };
                doc.insert(block.clone())?;
                (MergeStrategy::NoMatch, doc.render_lines())
            }
        };

        let outcome = MergeOutcome {
            meta: MergeMeta {
                target: target_path.to_path_buf(),
                conversation: block.conversation.clone(),
                block_tag: block.time_tag,
                timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            },
            target_stats: TargetStats {
                exists: existing.is_some(),
                initial_total_lines: target.len(),
            },
            block_stats: BlockStats {
                total_lines: block.len(),
                hashable_lines: block_index.len(),
                ignored_lines: block.len() - block_index.len(),
            },
            match_details: MatchDetails {
                start_anchor: to_anchor(begin),
                end_anchor: to_anchor(end),
            },
            overlap_analysis: overlap,
            action_taken: ActionTaken {
                strategy,
                final_total_lines: lines.len(),
                added_lines: line_delta(target.len(), lines.len()),
                status: MergeStatus::Planned,
            },
        };

        Ok(MergePlan { lines, outcome })
    }

    /// Reads the target, plans the merge and overwrites the target.
    ///
    /// A missing target is treated as an empty archive. Parent directories
    /// are created as needed. The write is a plain overwrite.
    pub fn reconcile(&self, block: &Block, target_path: &Path) -> Result<MergeOutcome> {
        info!(
            "event=reconcile module=merge status=start target={} conversation={} tag={}",
            target_path.display(),
            block.conversation(),
            block.time_tag()
        );

        let existing = read_lines(target_path)?;
        let MergePlan { lines, mut outcome } = self.plan(block, target_path, existing.as_deref())?;
        write_lines(target_path, &lines)?;
        outcome.action_taken.status = MergeStatus::Written;

        info!(
            "event=reconcile module=merge status=ok target={} strategy={} final_lines={} added_lines={}",
            target_path.display(),
            outcome.strategy(),
            outcome.action_taken.final_total_lines,
            outcome.added_lines()
        );
        Ok(outcome)
    }

    /// Start window: the first `window_size` hashable block lines, extended forward.
    fn find_begin<'t>(&self, block: &HashIndex<'_>, target: &HashIndex<'t>) -> Option<Hit<'t>> {
        let block_keys = block.keys();
        let target_keys = target.keys();
        let n = self.config.window_size.min(block_keys.len());

        let t = find_run(&target_keys, &block_keys[..n])?;
        let len = common_prefix_len(&block_keys, &target_keys[t..]);

        let first_t = target.get(t)?;
        Some(Hit {
            block_line: block.get(0)?.line,
            target_line: first_t.line,
            block_span: (block.get(0)?.line, block.get(len - 1)?.line),
            target_span: (first_t.line, target.get(t + len - 1)?.line),
            preview: first_t.text,
        })
    }

    /// End window: the last `window_size` hashable block lines, extended backward.
    fn find_end<'t>(&self, block: &HashIndex<'_>, target: &HashIndex<'t>) -> Option<Hit<'t>> {
        let block_keys = block.keys();
        let target_keys = target.keys();
        let n = self.config.window_size.min(block_keys.len());
        let last_b = block_keys.len().checked_sub(1)?;

        let t = find_run(&target_keys, &block_keys[block_keys.len() - n..])?;
        let window_end = t + n;
        let len = common_suffix_len(&block_keys, &target_keys[..window_end]);

        let last_t = target.get(window_end - 1)?;
        Some(Hit {
            block_line: block.get(last_b)?.line,
            target_line: last_t.line,
            block_span: (block.get(block_keys.len() - len)?.line, block.get(last_b)?.line),
            target_span: (target.get(window_end - len)?.line, last_t.line),
            preview: last_t.text,
        })
    }
}

fn analyze_overlap(
    block: &HashIndex<'_>,
    target: &HashIndex<'_>,
    begin: Hit<'_>,
    end: Hit<'_>,
) -> OverlapAnalysis {
    let between = |index: &HashIndex<'_>, from: usize, to: usize| {
        index
            .entries()
            .iter()
            .filter(|e| (from..=to).contains(&e.line))
            .count()
    };
    let block_hashes_between = between(block, begin.block_line, end.block_line);
    let target_hashes_between = between(target, begin.target_line, end.target_line);
    OverlapAnalysis {
        block_hashes_between,
        target_hashes_between,
        diff_count: line_delta(block_hashes_between, target_hashes_between),
    }
}

fn concat(parts: &[&[String]]) -> Vec<String> {
    parts.iter().flat_map(|part| part.iter().cloned()).collect()
}

#[allow(clippy::cast_possible_wrap)]
fn line_delta(before: usize, after: usize) -> i64 {
    after as i64 - before as i64
}

/// Merges `block` into `target_path` with the default configuration.
pub fn reconcile(block: &Block, target_path: &Path) -> Result<MergeOutcome> {
    Reconciler::new().reconcile(block, target_path)
}

/// Reads a file as lines, returning `None` if it does not exist.
pub fn read_lines(path: &Path) -> Result<Option<Vec<String>>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content.lines().map(str::to_string).collect())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Overwrites a file with `lines`, each terminated by `\n`.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = lines.join("\n");
    if !lines.is_empty() {
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}
