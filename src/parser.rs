//! File parser: turns chat documents into ordered [`Block`]s.
//!
//! The parser is a fold over physical lines. Its accumulator carries the
//! active conversation, the last completed [`TimeTag`] (used as the reference
//! for completing partial markers) and the content buffer of the open block.
//!
//! # Example
//!
//! ```rust
//! use chatsplice::parser::BlockParser;
//!
//! let content = "\
//! ---
//! source: phone export
//! ---
//! ## -- Project
//! -- 2024-03-01 10:00
//! morning everyone, standup in five
//! -- 11:30
//! lunch plans anyone?
//! ";
//!
//! let doc = BlockParser::new().parse_str(content, "raw.md")?;
//! assert_eq!(doc.len(), 2);
//! assert_eq!(doc.blocks[1].time_tag().to_string(), "2024-03-01 11:30");
//! # Ok::<(), chatsplice::ChatspliceError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::block::{Block, TimeTag};
use crate::core::models::{OrgDocument, RawDocument};
use crate::error::Result;
use crate::parsing::{classify_heading, classify_time_tag, is_delimiter};

/// Parser for raw chat exports and organized archives.
///
/// # Example
///
/// ```rust,no_run
/// use chatsplice::parser::BlockParser;
///
/// let parser = BlockParser::new().with_fallback_year(2024);
/// let doc = parser.parse("00-chats-input-raw/phone/2024-07.md".as_ref())?;
/// for block in &doc.blocks {
///     println!("{} @ {}", block.conversation(), block.time_tag());
/// }
/// # Ok::<(), chatsplice::ChatspliceError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockParser {
    fallback_year: Option<i32>,
}

impl BlockParser {
    /// Creates a parser without a fallback year.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the year used for `MM-DD` markers that precede any dated marker.
    #[must_use]
    pub fn with_fallback_year(mut self, year: i32) -> Self {
        self.fallback_year = Some(year);
        self
    }

    /// Returns the configured fallback year.
    pub fn fallback_year(&self) -> Option<i32> {
        self.fallback_year
    }

    /// Reads and parses a file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a parse error
    /// (with path and line) at the first time marker that cannot be completed.
    pub fn parse(&self, path: &Path) -> Result<RawDocument> {
        let content = fs::read_to_string(path)?;
        self.parse_str(&content, path)
    }

    /// Parses in-memory content attributed to `path`.
    pub fn parse_str(&self, content: &str, path: impl Into<PathBuf>) -> Result<RawDocument> {
        let path = path.into();
        let lines: Vec<&str> = content.lines().collect();
        let blocks = self.parse_lines(&lines, &path)?;
        Ok(RawDocument::new(path, blocks))
    }

    /// Parses already-split lines.
    pub fn parse_lines<S: AsRef<str>>(&self, lines: &[S], path: &Path) -> Result<Vec<Block>> {
        let start = body_start(lines);
        let state = lines
            .iter()
            .enumerate()
            .skip(start)
            .try_fold(ParseState::default(), |state, (idx, line)| {
                state
                    .step(line.as_ref(), self.fallback_year, path)
                    .map_err(|e| e.at_line(path, idx + 1))
            })?;
        Ok(state.finish(path))
    }
}

/// Returns the index of the first line after the leading front matter.
///
/// An unterminated front matter swallows the whole input.
fn body_start<S: AsRef<str>>(lines: &[S]) -> usize {
    match lines.first() {
        Some(first) if is_delimiter(first.as_ref()) => lines
            .iter()
            .skip(1)
            .position(|line| is_delimiter(line.as_ref()))
            .map_or(lines.len(), |offset| offset + 2),
        _ => 0,
    }
}

#[derive(Debug, Default)]
struct ParseState {
    conversation: Option<String>,
    last_tag: Option<TimeTag>,
    buffer: Vec<String>,
    blocks: Vec<Block>,
}

impl ParseState {
    fn step(mut self, line: &str, fallback_year: Option<i32>, path: &Path) -> Result<Self> {
        if let Some(name) = classify_heading(line) {
            self.close(path);
            self.conversation = Some(name);
            self.last_tag = None;
            return Ok(self);
        }

        if let Some(tag) = classify_time_tag(line, self.last_tag.as_ref(), fallback_year)? {
            self.close(path);
            self.last_tag = Some(tag);
            return Ok(self);
        }

        self.buffer.push(line.to_string());
        Ok(self)
    }

    /// Emits the open block, if any, and clears the buffer.
    fn close(&mut self, path: &Path) {
        let content = std::mem::take(&mut self.buffer);
        if let (Some(conversation), Some(tag)) = (&self.conversation, self.last_tag) {
            self.blocks
                .push(Block::new(conversation.clone(), tag, content, path));
        }
    }

    fn finish(mut self, path: &Path) -> Vec<Block> {
        self.close(path);
        self.blocks
    }
}

/// Parses a raw export file.
///
/// ```rust,no_run
/// let doc = chatsplice::parser::parse_raw_document("raw.md".as_ref(), Some(2024))?;
/// # Ok::<(), chatsplice::ChatspliceError>(())
/// ```
pub fn parse_raw_document(path: &Path, fallback_year: Option<i32>) -> Result<RawDocument> {
    parser_for(fallback_year).parse(path)
}

/// Parses raw export content held in memory.
pub fn parse_raw_str(
    content: &str,
    path: impl Into<PathBuf>,
    fallback_year: Option<i32>,
) -> Result<RawDocument> {
    parser_for(fallback_year).parse_str(content, path)
}

fn parser_for(fallback_year: Option<i32>) -> BlockParser {
    match fallback_year {
        Some(year) => BlockParser::new().with_fallback_year(year),
        None => BlockParser::new(),
    }
}

/// Reads an organized archive and checks its invariants.
///
/// Archives are parsed without a fallback year: every partial marker in an
/// archive must be completable from an earlier marker.
///
/// # Errors
///
/// Returns [`InvariantViolation`](crate::ChatspliceError::InvariantViolation)
/// when the archive mixes conversations.
pub fn parse_organized(path: &Path) -> Result<OrgDocument> {
    let content = fs::read_to_string(path)?;
    parse_organized_str(&content, path)
}

/// Parses organized archive content held in memory.
pub fn parse_organized_str(content: &str, path: impl Into<PathBuf>) -> Result<OrgDocument> {
    let raw = BlockParser::new().parse_str(content, path)?;
    OrgDocument::from_blocks(raw.path, raw.blocks)
}

/// Parses organized archive lines held in memory.
pub fn parse_organized_lines<S: AsRef<str>>(lines: &[S], path: &Path) -> Result<OrgDocument> {
    let blocks = BlockParser::new().parse_lines(lines, path)?;
    OrgDocument::from_blocks(path, blocks)
}
