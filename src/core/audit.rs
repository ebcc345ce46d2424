//! Audit artifacts written during an ingestion run.
//!
//! - one YAML dump per raw block, as parsed
//! - one YAML dump per merge, holding a block summary and the [`MergeOutcome`]
//! - one JSON line per merge in the run log

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::merge::MergeOutcome;
use crate::block::{Block, TimeTag};
use crate::error::Result;

/// Characters of block content kept in a merge dump.
pub const PREVIEW_CHARS: usize = 80;

/// A raw block as parsed from its source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDump {
    pub conversation: String,
    pub time_tag: TimeTag,
    pub source: PathBuf,
    pub content: Vec<String>,
}

impl From<&Block> for BlockDump {
    fn from(block: &Block) -> Self {
        Self {
            conversation: block.conversation.clone(),
            time_tag: block.time_tag,
            source: block.source.clone(),
            content: block.content.clone(),
        }
    }
}

/// A block reduced to its identity and a content preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub conversation: String,
    pub time_tag: TimeTag,
    pub source: PathBuf,
    pub content_preview: String,
}

impl From<&Block> for BlockSummary {
    fn from(block: &Block) -> Self {
        Self {
            conversation: block.conversation.clone(),
            time_tag: block.time_tag,
            source: block.source.clone(),
            content_preview: block.preview(PREVIEW_CHARS),
        }
    }
}

/// The per-merge audit dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeDump {
    pub block_info: BlockSummary,
    pub merge_result: MergeOutcome,
}

impl MergeDump {
    pub fn new(block: &Block, outcome: MergeOutcome) -> Self {
        Self {
            block_info: BlockSummary::from(block),
            merge_result: outcome,
        }
    }
}

/// Serializes `value` as YAML into `path`, creating parent directories.
pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(value)?;
    fs::write(path, yaml)?;
    Ok(())
}

/// Appends `value` as one JSON line to `path`.
pub fn append_jsonl<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let line = format!("{}\n", serde_json::to_string(value)?);
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::merge::{MergeStrategy, Reconciler};
    use tempfile::tempdir;

    fn block() -> Block {
        Block::new(
            "Team",
            "2024-03-01 10:00".parse::<TimeTag>().unwrap(),
            vec!["Alice: good morning everyone".into(), "x".repeat(100)],
            "in/raw.md",
        )
    }

    #[test]
    fn test_block_dump_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chunks").join("raw_0.yaml");
        write_yaml(&path, &BlockDump::from(&block())).unwrap();

        let yaml = fs::read_to_string(&path).unwrap();
        assert!(yaml.contains("conversation: Team"));
        assert!(yaml.contains("2024-03-01 10:00"));

        let back: BlockDump = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.content.len(), 2);
    }

    #[test]
    fn test_summary_preview_is_truncated() {
        let summary = BlockSummary::from(&block());
        assert_eq!(summary.content_preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(summary.content_preview.ends_with("..."));
    }

    #[test]
    fn test_merge_dump_sections() {
        let b = block();
        let plan = Reconciler::new()
            .plan(&b, Path::new("Team/2024-03.md"), None)
            .unwrap();
        let dump = MergeDump::new(&b, plan.outcome);
        let yaml = serde_yaml::to_string(&dump).unwrap();
        for key in [
            "block_info",
            "merge_result",
            "meta",
            "target_stats",
            "block_stats",
            "match_details",
            "overlap_analysis",
            "action_taken",
            "no_match",
        ] {
            assert!(yaml.contains(key), "missing {key} in:\n{yaml}");
        }
        assert_eq!(dump.merge_result.strategy(), MergeStrategy::NoMatch);
    }

    #[test]
    fn test_append_jsonl() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        append_jsonl(&path, &BlockSummary::from(&block())).unwrap();
        append_jsonl(&path, &BlockSummary::from(&block())).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: BlockSummary = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.conversation, "Team");
    }
}
