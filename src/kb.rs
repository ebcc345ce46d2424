//! Knowledge base layout.
//!
//! ```text
//! {kb}/
//!   00-chats-input-raw/         raw exports waiting to be ingested
//!   10-chats-input-raw-used/    raw exports already ingested, same relative paths
//!   tasks/normalize/run_{YYYY-MM-DD_HH-MM}/
//!     chunks/                   one YAML per parsed raw block
//!     chunks_merged/            one YAML per merge
//!     audit.jsonl               one JSON line per merge
//! {archive_root}/{conversation}/{YYYY-MM}.md
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::NaiveDateTime;

use crate::block::TimeTag;
use crate::error::{ChatspliceError, Result};

/// Raw exports waiting to be ingested.
pub const RAW_INPUT_DIR: &str = "00-chats-input-raw";

/// Raw exports that have been ingested.
pub const USED_INPUT_DIR: &str = "10-chats-input-raw-used";

/// Directory names never descended into while collecting inputs.
pub const SKIPPED_DIRS: &[&str] = &["processed", USED_INPUT_DIR];

/// A knowledge base rooted at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBase {
    root: PathBuf,
}

impl KnowledgeBase {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `{kb}/00-chats-input-raw`.
    pub fn raw_input_root(&self) -> PathBuf {
        self.root.join(RAW_INPUT_DIR)
    }

    /// Returns the relocation target of an input given relative to the raw-input root.
    pub fn used_path(&self, rel: &Path) -> PathBuf {
        self.root.join(USED_INPUT_DIR).join(rel)
    }

    /// Returns `path` relative to the raw-input root.
    ///
    /// Both paths are made absolute and lexically normalized first, so
    /// `./kb/00-chats-input-raw/../00-chats-input-raw/phone` is accepted.
    ///
    /// # Errors
    ///
    /// [`ChatspliceError::InvalidInputDir`] if `path` is not inside the raw-input root.
    pub fn relative_to_raw(&self, path: &Path) -> Result<PathBuf> {
        let root = lexical_absolute(&self.raw_input_root())?;
        let abs = lexical_absolute(path)?;
        abs.strip_prefix(&root)
            .map(Path::to_path_buf)
            .map_err(|_| ChatspliceError::InvalidInputDir {
                input: path.to_path_buf(),
                root,
            })
    }

    /// Returns the task directory of a normalize run started at `now`.
    pub fn task_run(&self, now: NaiveDateTime) -> TaskRun {
        let stamp = now.format("%Y-%m-%d_%H-%M");
        TaskRun {
            dir: self
                .root
                .join("tasks")
                .join("normalize")
                .join(format!("run_{stamp}")),
        }
    }
}

/// Audit directory of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRun {
    dir: PathBuf,
}

impl TaskRun {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the run directory.
    pub fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// `chunks/{name}_{idx}_raw_chunk.yaml`
    pub fn raw_chunk_path(&self, name: &str, idx: usize) -> PathBuf {
        self.dir
            .join("chunks")
            .join(format!("{name}_{idx}_raw_chunk.yaml"))
    }

    /// `chunks_merged/{name}_{idx}_merge_chunk.yaml`
    pub fn merge_chunk_path(&self, name: &str, idx: usize) -> PathBuf {
        self.dir
            .join("chunks_merged")
            .join(format!("{name}_{idx}_merge_chunk.yaml"))
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.dir.join("audit.jsonl")
    }
}

/// Returns `{archive_root}/{conversation}/{YYYY-MM}.md`.
///
/// ```
/// use std::path::Path;
/// use chatsplice::kb::archive_path;
///
/// let tag = "2024-07-02 14:30".parse()?;
/// assert_eq!(
///     archive_path(Path::new("/kb/org"), "Project", &tag)?,
///     Path::new("/kb/org/Project/2024-07.md")
/// );
/// assert!(archive_path(Path::new("/kb/org"), "..", &tag).is_err());
/// # Ok::<(), chatsplice::ChatspliceError>(())
/// ```
///
/// # Errors
///
/// [`ChatspliceError::InvalidConversation`] if the name is empty or would
/// resolve outside `archive_root` (`.`, `..`, absolute paths).
pub fn archive_path(archive_root: &Path, conversation: &str, tag: &TimeTag) -> Result<PathBuf> {
    let name = Path::new(conversation);
    let stays_inside = name
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if conversation.trim().is_empty() || !stays_inside {
        return Err(ChatspliceError::InvalidConversation {
            name: conversation.to_string(),
        });
    }
    Ok(archive_root
        .join(name)
        .join(format!("{}.md", tag.month_key())))
}

/// Flattens a relative path into a file-name stem: separators and dots become `_`.
pub fn safe_name(rel: &Path) -> String {
    rel.to_string_lossy()
        .chars()
        .map(|c| if std::path::is_separator(c) || c == '.' { '_' } else { c })
        .collect()
}

/// Moves a file, creating the destination's parent directories.
///
/// Falls back to copy and remove when a rename is not possible.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if matches!(e.kind(), ErrorKind::CrossesDevices | ErrorKind::PermissionDenied) => {
            fs::copy(from, to)?;
            fs::remove_file(from)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn lexical_absolute(path: &Path) -> Result<PathBuf> {
    let abs = std::path::absolute(path)?;
    let mut out = PathBuf::new();
    for component in abs.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}
