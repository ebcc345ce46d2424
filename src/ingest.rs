//! Batch ingestion driver.
//!
//! Walks an input directory under `{kb}/00-chats-input-raw`, and for each
//! `.md` file in path order:
//!
//! 1. parses it into blocks
//! 2. dumps every raw block as YAML
//! 3. reconciles every block into `{archive_root}/{conversation}/{YYYY-MM}.md`
//!    and dumps each [`MergeOutcome`] as YAML and as a JSON line
//! 4. moves the file to `{kb}/10-chats-input-raw-used/`
//!
//! The first error stops the run. Files handled before it stay merged and
//! relocated; the failing file stays where it is.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatsplice::config::IngestConfig;
//! use chatsplice::ingest::Ingestor;
//! use std::path::Path;
//!
//! let ingestor = Ingestor::new("kb", "kb/01-chats-organized", IngestConfig::new().with_fallback_year(2024));
//! let report = ingestor.run(Path::new("kb/00-chats-input-raw/phone"))?;
//! println!("{} blocks merged", report.blocks());
//! # Ok::<(), chatsplice::ChatspliceError>(())
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::{debug, info};

use crate::config::IngestConfig;
use crate::core::audit::{BlockDump, MergeDump, append_jsonl, write_yaml};
use crate::core::merge::{MergeOutcome, MergeStrategy, Reconciler, read_lines};
use crate::error::Result;
use crate::kb::{KnowledgeBase, SKIPPED_DIRS, TaskRun, archive_path, move_file, safe_name};
use crate::parser::BlockParser;
use crate::progress::{IngestEvent, ProgressCallback, no_progress};

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub source: PathBuf,
    /// Path relative to the raw-input root
    pub rel: PathBuf,
    pub blocks: usize,
    /// Where the file was moved, `None` in dry-run mode
    pub relocated_to: Option<PathBuf>,
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Audit directory of the run, `None` when there was nothing to ingest
    pub task_dir: Option<PathBuf>,
    pub files: Vec<FileReport>,
    /// One outcome per block, in processing order
    pub outcomes: Vec<MergeOutcome>,
    pub dry_run: bool,
}

impl IngestReport {
    /// Returns `true` if no source file was found.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns the number of merged blocks.
    pub fn blocks(&self) -> usize {
        self.outcomes.len()
    }

    /// Counts outcomes per strategy.
    pub fn strategy_counts(&self) -> BTreeMap<MergeStrategy, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            *counts.entry(outcome.strategy()).or_insert(0) += 1;
        }
        counts
    }

    /// Returns the total net line change across all targets.
    pub fn lines_added(&self) -> i64 {
        self.outcomes.iter().map(MergeOutcome::added_lines).sum()
    }
}

/// Collects `.md` files under `dir`, recursively and in path order.
///
/// Directories named in [`SKIPPED_DIRS`] and symlinked directories are not
/// descended into. A missing directory yields no files.
pub fn collect_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    collect_md_paths(dir, &mut out)?;
    Ok(out)
}

fn collect_md_paths(path: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if !path.is_dir() {
        return Ok(());
    }

    let mut entries = fs::read_dir(path)?
        .map(|entry| entry.and_then(|e| Ok((e.path(), e.file_type()?))))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (entry_path, file_type) in entries {
        if file_type.is_dir() {
            let skip = entry_path
                .file_name()
                .and_then(|s| s.to_str())
                .is_some_and(|name| SKIPPED_DIRS.contains(&name));
            if skip {
                debug!("event=walk_skip module=ingest dir={}", entry_path.display());
                continue;
            }
            collect_md_paths(&entry_path, out)?;
        } else if file_type.is_symlink() && entry_path.is_dir() {
            debug!("event=walk_skip module=ingest symlink={}", entry_path.display());
        } else if entry_path.extension().and_then(|s| s.to_str()) == Some("md") {
            out.push(entry_path);
        }
    }
    Ok(())
}

/// Drives parsing, merging, auditing and relocation for a batch of files.
pub struct Ingestor {
    kb: KnowledgeBase,
    archive_root: PathBuf,
    config: IngestConfig,
    parser: BlockParser,
    reconciler: Reconciler,
    progress: ProgressCallback,
}

impl Ingestor {
    /// Creates an ingestor for a knowledge base and an archive root.
    pub fn new(kb_root: impl Into<PathBuf>, archive_root: impl Into<PathBuf>, config: IngestConfig) -> Self {
        let parser = match config.fallback_year {
            Some(year) => BlockParser::new().with_fallback_year(year),
            None => BlockParser::new(),
        };
        Self {
            kb: KnowledgeBase::new(kb_root),
            archive_root: archive_root.into(),
            reconciler: Reconciler::with_config(config.merge.clone()),
            parser,
            config,
            progress: no_progress(),
        }
    }

    /// Sets the callback receiving progress events.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingests every `.md` file under `input_dir`.
    pub fn run(&self, input_dir: &Path) -> Result<IngestReport> {
        self.run_at(input_dir, chrono::Local::now().naive_local())
    }

    /// Same as [`run`](Self::run), with the run timestamp supplied.
    ///
    /// # Errors
    ///
    /// [`InvalidInputDir`](crate::ChatspliceError::InvalidInputDir) if
    /// `input_dir` is not under the raw-input root; otherwise the first
    /// parse, merge or IO error.
    pub fn run_at(&self, input_dir: &Path, now: NaiveDateTime) -> Result<IngestReport> {
        self.kb.relative_to_raw(input_dir)?;

        let mut report = IngestReport {
            dry_run: self.config.dry_run,
            ..IngestReport::default()
        };

        let sources = collect_sources(input_dir)?;
        if sources.is_empty() {
            info!("event=ingest module=ingest status=empty input={}", input_dir.display());
            return Ok(report);
        }

        let run = self.kb.task_run(now);
        run.create()?;
        report.task_dir = Some(run.dir().to_path_buf());
        info!(
            "event=ingest module=ingest status=start files={} task_dir={} dry_run={}",
            sources.len(),
            run.dir().display(),
            self.config.dry_run
        );

        let mut staged: HashMap<PathBuf, Vec<String>> = HashMap::new();
        for source in sources {
            let file = self.ingest_file(&source, &run, &mut staged, &mut report.outcomes)?;
            report.files.push(file);
        }

        info!(
            "event=ingest module=ingest status=ok files={} blocks={} lines_added={}",
            report.files.len(),
            report.blocks(),
            report.lines_added()
        );
        Ok(report)
    }

    fn ingest_file(
        &self,
        source: &Path,
        run: &TaskRun,
        staged: &mut HashMap<PathBuf, Vec<String>>,
        outcomes: &mut Vec<MergeOutcome>,
    ) -> Result<FileReport> {
        let rel = self.kb.relative_to_raw(source)?;
        let name = safe_name(&rel);

        let doc = self.parser.parse(source)?;
        info!(
            "event=parse module=ingest status=ok file={} blocks={}",
            rel.display(),
            doc.len()
        );
        (self.progress)(&IngestEvent::FileParsed {
            rel: rel.clone(),
            blocks: doc.len(),
        });

        for (idx, block) in doc.iter().enumerate() {
            write_yaml(&run.raw_chunk_path(&name, idx), &BlockDump::from(block))?;
        }

        for (idx, block) in doc.iter().enumerate() {
            let target = archive_path(&self.archive_root, block.conversation(), block.time_tag())?;
            let outcome = if self.config.dry_run {
                let existing = match staged.get(&target) {
                    Some(lines) => Some(lines.clone()),
                    None => read_lines(&target)?,
                };
                let plan = self.reconciler.plan(block, &target, existing.as_deref())?;
                staged.insert(target.clone(), plan.lines);
                plan.outcome
            } else {
                self.reconciler.reconcile(block, &target)?
            };

            (self.progress)(&IngestEvent::BlockMerged {
                rel: rel.clone(),
                index: idx,
                target: target.clone(),
                strategy: outcome.strategy(),
                added_lines: outcome.added_lines(),
            });

            append_jsonl(&run.audit_log_path(), &outcome)?;
            let dump = MergeDump::new(block, outcome);
            write_yaml(&run.merge_chunk_path(&name, idx), &dump)?;
            outcomes.push(dump.merge_result);
        }

        let relocated_to = if self.config.dry_run {
            None
        } else {
            let to = self.kb.used_path(&rel);
            move_file(source, &to)?;
            info!(
                "event=relocate module=ingest status=ok file={} to={}",
                rel.display(),
                to.display()
            );
            (self.progress)(&IngestEvent::FileRelocated {
                rel: rel.clone(),
                to: to.clone(),
            });
            Some(to)
        };

        Ok(FileReport {
            source: source.to_path_buf(),
            blocks: doc.len(),
            rel,
            relocated_to,
        })
    }
}
