//! Document models: raw exports and organized archives.

use std::path::{Path, PathBuf};

use crate::block::Block;
use crate::error::{ChatspliceError, Result};

/// A parsed source file: blocks in file order, possibly from several conversations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// Source file path
    pub path: PathBuf,
    /// Blocks in file order
    pub blocks: Vec<Block>,
}

impl RawDocument {
    /// Creates a document from parsed blocks.
    pub fn new(path: impl Into<PathBuf>, blocks: Vec<Block>) -> Self {
        Self {
            path: path.into(),
            blocks,
        }
    }

    /// Returns the number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if no block was found.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterates over blocks in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Returns the distinct conversation names in order of first appearance.
    pub fn conversations(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for block in &self.blocks {
            if !names.contains(&block.conversation()) {
                names.push(block.conversation());
            }
        }
        names
    }
}

impl IntoIterator for RawDocument {
    type Item = Block;
    type IntoIter = std::vec::IntoIter<Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.into_iter()
    }
}

/// The canonical archive of one conversation for one calendar month.
///
/// # Invariants
///
/// - every block belongs to the same conversation
/// - blocks are kept in non-decreasing [`TimeTag`](crate::TimeTag) order
///   (ties keep insertion order)
///
/// Tags are well-formed by construction of [`TimeTag`](crate::TimeTag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgDocument {
    path: PathBuf,
    blocks: Vec<Block>,
}

impl OrgDocument {
    /// Creates an empty archive.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            blocks: Vec::new(),
        }
    }

    /// Builds an archive from blocks, validating and sorting them.
    ///
    /// Leading and trailing blank lines of every block are dropped, so a
    /// parsed archive renders and re-parses to the same blocks.
    pub fn from_blocks(path: impl Into<PathBuf>, blocks: Vec<Block>) -> Result<Self> {
        let mut doc = Self {
            path: path.into(),
            blocks: blocks.into_iter().map(trim_blank_edges).collect(),
        };
        doc.validate()?;
        doc.blocks.sort_by(|a, b| a.time_tag.cmp(&b.time_tag));
        Ok(doc)
    }

    /// Returns the archive path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the blocks in time order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns the conversation name, or `None` for an empty archive.
    pub fn conversation(&self) -> Option<&str> {
        self.blocks.first().map(Block::conversation)
    }

    /// Returns the number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the archive holds no block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Adds a block after every block with an earlier or equal tag.
    pub fn insert(&mut self, block: Block) -> Result<()> {
        if let Some(name) = self.conversation() {
            if name != block.conversation() {
                return Err(ChatspliceError::invariant(
                    Some(self.path.clone()),
                    format!(
                        "archive of '{}' cannot take a block of '{}'",
                        name,
                        block.conversation()
                    ),
                ));
            }
        }
        let at = self
            .blocks
            .partition_point(|existing| existing.time_tag <= block.time_tag);
        self.blocks.insert(at, trim_blank_edges(block));
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let Some(first) = self.blocks.first() else {
            return Ok(());
        };
        if let Some(other) = self
            .blocks
            .iter()
            .find(|b| b.conversation() != first.conversation())
        {
            return Err(ChatspliceError::invariant(
                Some(self.path.clone()),
                format!(
                    "organized archive must hold one conversation, found '{}' and '{}'",
                    first.conversation(),
                    other.conversation()
                ),
            ));
        }
        Ok(())
    }

    /// Renders the archive in canonical form.
    ///
    /// One heading, then each block as its tag line, a blank line, the content
    /// without surrounding blank lines, and a closing blank line. An empty
    /// archive renders to no lines.
    pub fn render_lines(&self) -> Vec<String> {
        let Some(name) = self.conversation() else {
            return Vec::new();
        };
        let mut lines = vec![format!("## -- {name}"), String::new()];
        for block in &self.blocks {
            lines.push(format!("-- {}", block.time_tag));
            lines.push(String::new());
            lines.extend(block.trimmed_content().iter().cloned());
            lines.push(String::new());
        }
        lines
    }
}

fn trim_blank_edges(mut block: Block) -> Block {
    let trimmed = block.trimmed_content().to_vec();
    block.content = trimmed;
    block
}
