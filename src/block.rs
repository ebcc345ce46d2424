//! Time tags and chat blocks.
//!
//! A [`Block`] is a contiguous run of one conversation's messages under one
//! [`TimeTag`]. Blocks are produced by the [`parser`](crate::parser) and
//! consumed exactly once by the [`merge engine`](crate::core::merge).
//!
//! # Examples
//!
//! ```
//! use chatsplice::{Block, TimeTag};
//!
//! let tag: TimeTag = "2024-03-01 10:00".parse()?;
//! let block = Block::new("Project", tag, vec!["hello there, everyone".to_string()], "raw.md");
//!
//! assert_eq!(block.conversation(), "Project");
//! assert_eq!(block.time_tag().month_key(), "2024-03");
//! # Ok::<(), chatsplice::ChatspliceError>(())
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ChatspliceError;

/// A normalized `YYYY-MM-DD HH:mm` timestamp.
///
/// A `TimeTag` is always complete: partial markers such as `07-02` or `14:30`
/// are completed by [`classify_time_tag`](crate::parsing::classify_time_tag)
/// before a tag is created. Ordering is chronological, which is also the
/// lexicographic order of the rendered string.
///
/// Serializes as its rendered string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TimeTag(NaiveDateTime);

impl TimeTag {
    /// Rendering format of every tag.
    pub const FORMAT: &'static str = "%Y-%m-%d %H:%M";

    /// Creates a tag from a date and a time. Seconds are discarded.
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);
        Self(NaiveDateTime::new(date, time))
    }

    /// Creates a tag from numeric fields, returning `None` for impossible dates or times.
    pub fn from_ymd_hm(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        Some(Self(NaiveDateTime::new(date, time)))
    }

    /// Returns the calendar date.
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    /// Returns the year.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the underlying date-time.
    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// Returns the `YYYY-MM` key naming the monthly archive this tag belongs to.
    pub fn month_key(&self) -> String {
        self.0.format("%Y-%m").to_string()
    }
}

impl fmt::Display for TimeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for TimeTag {
    type Err = ChatspliceError;

    /// Parses a complete tag: `YYYY-MM-DD HH:mm` or `YYYY-MM-DD` (midnight).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, Self::FORMAT) {
            return Ok(Self(dt));
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::new(date, NaiveTime::MIN));
        }
        Err(ChatspliceError::invalid_reference(s))
    }
}

impl From<TimeTag> for String {
    fn from(tag: TimeTag) -> String {
        tag.to_string()
    }
}

impl TryFrom<String> for TimeTag {
    type Error = ChatspliceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A contiguous span of one conversation's messages tagged with one timestamp.
///
/// Content lines are stored verbatim, without line terminators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Conversation (group or contact) name from the heading line.
    pub conversation: String,

    /// Completed timestamp from the time marker line.
    pub time_tag: TimeTag,

    /// Raw content lines between this marker and the next one.
    pub content: Vec<String>,

    /// File the block was parsed from.
    pub source: PathBuf,
}

impl Block {
    /// Creates a new block.
    pub fn new(
        conversation: impl Into<String>,
        time_tag: TimeTag,
        content: Vec<String>,
        source: impl Into<PathBuf>,
    ) -> Self {
        Self {
            conversation: conversation.into(),
            time_tag,
            content,
            source: source.into(),
        }
    }

    /// Returns the conversation name.
    pub fn conversation(&self) -> &str {
        &self.conversation
    }

    /// Returns the time tag.
    pub fn time_tag(&self) -> &TimeTag {
        &self.time_tag
    }

    /// Returns the content lines.
    pub fn content(&self) -> &[String] {
        &self.content
    }

    /// Returns the originating file path.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Returns the number of content lines.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns `true` if the block has no content lines.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the content without leading and trailing blank lines.
    pub fn trimmed_content(&self) -> &[String] {
        let start = self
            .content
            .iter()
            .position(|line| !line.trim().is_empty())
            .unwrap_or(self.content.len());
        let end = self
            .content
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(start, |idx| idx + 1);
        &self.content[start..end]
    }

    /// Returns the content joined with newlines.
    pub fn text(&self) -> String {
        self.content.join("\n")
    }

    /// Returns the first `max_chars` characters of the joined content followed
    /// by `...`, or an empty string for an empty block.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.content.is_empty() {
            return String::new();
        }
        let mut preview: String = self.text().chars().take(max_chars).collect();
        preview.push_str("...");
        preview
    }
}
