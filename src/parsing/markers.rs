//! Marker line classification.
//!
//! Every physical line of a chat document is one of:
//! - a **time marker**: `-- 2024-06-01 14:30`, `-- 07-02`, `-- 14:30`, ...
//! - a **heading**: `## -- Project Group` or `### -- [Alice]`
//! - a **front-matter delimiter**: `---`
//! - ordinary content

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::{Captures, Regex};

use crate::block::TimeTag;
use crate::error::{ChatspliceError, Result};

/// `--` followed only by digits, colons, dashes and whitespace.
static TIME_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--\s*[\d:\-\s]+$").expect("time marker regex is valid"));

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#+\s+--\s+(.+)$").expect("heading regex is valid"));

/// Accepted shapes of the text after a time marker, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagShape {
    /// `2024-06-01 14:30`
    DateTime,
    /// `2024-06-01`
    Date,
    /// `07-02 14:30`
    MonthDayTime,
    /// `07-02`
    MonthDay,
    /// `14:30`
    Time,
}

impl TagShape {
    /// Returns the regex pattern for this shape.
    pub fn pattern(self) -> &'static str {
        match self {
            TagShape::DateTime => r"^(\d{4})-(\d{1,2})-(\d{1,2})\s+(\d{1,2}):(\d{2})$",
            TagShape::Date => r"^(\d{4})-(\d{1,2})-(\d{1,2})$",
            TagShape::MonthDayTime => r"^(\d{1,2})-(\d{1,2})\s+(\d{1,2}):(\d{2})$",
            TagShape::MonthDay => r"^(\d{1,2})-(\d{1,2})$",
            TagShape::Time => r"^(\d{1,2}):(\d{2})$",
        }
    }

    /// Returns all shapes in matching priority order.
    pub fn all() -> &'static [TagShape] {
        &[
            TagShape::DateTime,
            TagShape::Date,
            TagShape::MonthDayTime,
            TagShape::MonthDay,
            TagShape::Time,
        ]
    }
}

static SHAPES: LazyLock<Vec<(TagShape, Regex)>> = LazyLock::new(|| {
    TagShape::all()
        .iter()
        .map(|&shape| {
            (
                shape,
                Regex::new(shape.pattern()).expect("tag shape regex is valid"),
            )
        })
        .collect()
});

/// Recognizes a time marker line and completes it to a full [`TimeTag`].
///
/// Returns `Ok(None)` when the line is not a time marker at all. Missing
/// fields are taken from `reference` (the previous tag in the same file)
/// first, then from `fallback_year`. A bare `HH:mm` needs a reference.
///
/// # Errors
///
/// Returns [`ChatspliceError::TimeTag`] when the line looks like a marker but
/// cannot be completed or does not form a valid date/time.
///
/// # Example
///
/// ```
/// use chatsplice::TimeTag;
/// use chatsplice::parsing::classify_time_tag;
///
/// let reference: TimeTag = "2024-01-01 00:00".parse()?;
/// let tag = classify_time_tag("-- 07-02 14:30", Some(&reference), None)?;
/// assert_eq!(tag.unwrap().to_string(), "2024-07-02 14:30");
///
/// assert!(classify_time_tag("just chatting", None, None)?.is_none());
/// # Ok::<(), chatsplice::ChatspliceError>(())
/// ```
pub fn classify_time_tag(
    line: &str,
    reference: Option<&TimeTag>,
    fallback_year: Option<i32>,
) -> Result<Option<TimeTag>> {
    let trimmed = line.trim();
    if !TIME_MARKER.is_match(trimmed) {
        return Ok(None);
    }

    let raw = trimmed[2..].trim();
    if !raw.bytes().any(|b| b.is_ascii_digit()) {
        return Ok(None);
    }

    for (shape, regex) in SHAPES.iter() {
        if let Some(caps) = regex.captures(raw) {
            return complete(*shape, &caps, raw, reference, fallback_year).map(Some);
        }
    }

    Err(ChatspliceError::unresolvable(
        raw,
        "unrecognized date/time layout, write a more complete tag",
    ))
}

fn complete(
    shape: TagShape,
    caps: &Captures<'_>,
    raw: &str,
    reference: Option<&TimeTag>,
    fallback_year: Option<i32>,
) -> Result<TimeTag> {
    let field = |idx: usize| -> u32 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(u32::MAX)
    };
    let year_from_context = || -> Result<i32> {
        reference
            .map(TimeTag::year)
            .or(fallback_year)
            .ok_or_else(|| ChatspliceError::unresolvable(raw, "no reference tag or fallback year"))
    };

    let (date, time) = match shape {
        TagShape::DateTime | TagShape::Date => {
            let year = caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(i32::MIN);
            let time = if shape == TagShape::DateTime {
                (field(4), field(5))
            } else {
                (0, 0)
            };
            (NaiveDate::from_ymd_opt(year, field(2), field(3)), time)
        }
        TagShape::MonthDayTime => {
            let year = year_from_context()?;
            (NaiveDate::from_ymd_opt(year, field(1), field(2)), (field(3), field(4)))
        }
        TagShape::MonthDay => {
            let year = year_from_context()?;
            (NaiveDate::from_ymd_opt(year, field(1), field(2)), (0, 0))
        }
        TagShape::Time => {
            let reference = reference.ok_or_else(|| {
                ChatspliceError::unresolvable(raw, "a bare time needs an earlier dated tag")
            })?;
            (Some(reference.date()), (field(1), field(2)))
        }
    };

    let date = date.ok_or_else(|| ChatspliceError::unresolvable(raw, "not a valid calendar date"))?;
    let time = NaiveTime::from_hms_opt(time.0, time.1, 0)
        .ok_or_else(|| ChatspliceError::unresolvable(raw, "not a valid time of day"))?;
    Ok(TimeTag::new(date, time))
}

/// Recognizes a conversation heading and returns the conversation name.
///
/// Surrounding square brackets are stripped from the name.
///
/// ```
/// use chatsplice::parsing::classify_heading;
///
/// assert_eq!(classify_heading("## -- 摸鱼群").as_deref(), Some("摸鱼群"));
/// assert_eq!(classify_heading("### -- [项目讨论群]").as_deref(), Some("项目讨论群"));
/// assert_eq!(classify_heading("### 普通行"), None);
/// ```
pub fn classify_heading(line: &str) -> Option<String> {
    let caps = HEADING.captures(line.trim())?;
    let name = caps.get(1)?.as_str().trim().trim_matches(['[', ']']);
    Some(name.to_string())
}

/// Returns `true` for a standalone front-matter delimiter line (`---`).
pub fn is_delimiter(line: &str) -> bool {
    line.trim() == "---"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> TimeTag {
        s.parse().unwrap()
    }

    fn classify(line: &str, reference: Option<&str>, fallback: Option<i32>) -> Option<String> {
        let reference = reference.map(tag);
        classify_time_tag(line, reference.as_ref(), fallback)
            .unwrap()
            .map(|t| t.to_string())
    }

    #[test]
    fn test_full_datetime_passes_through() {
        assert_eq!(
            classify("-- 2024-06-01 14:30", Some("2024-01-01 00:00"), None).as_deref(),
            Some("2024-06-01 14:30")
        );
    }

    #[test]
    fn test_date_only_gets_midnight() {
        assert_eq!(
            classify("-- 2024-06-01", None, None).as_deref(),
            Some("2024-06-01 00:00")
        );
    }

    #[test]
    fn test_month_day_from_reference() {
        assert_eq!(
            classify("-- 07-02", Some("2024-01-01 00:00"), None).as_deref(),
            Some("2024-07-02 00:00")
        );
    }

    #[test]
    fn test_month_day_from_fallback_year() {
        assert_eq!(
            classify("-- 07-02", None, Some(2024)).as_deref(),
            Some("2024-07-02 00:00")
        );
    }

    #[test]
    fn test_reference_wins_over_fallback() {
        assert_eq!(
            classify("-- 07-02", Some("2023-12-31 00:00"), Some(2024)).as_deref(),
            Some("2023-07-02 00:00")
        );
    }

    #[test]
    fn test_month_day_time_from_reference() {
        assert_eq!(
            classify("-- 07-02 14:30", Some("2024-01-01 00:00"), None).as_deref(),
            Some("2024-07-02 14:30")
        );
    }

    #[test]
    fn test_time_only_from_reference() {
        assert_eq!(
            classify("-- 14:30", Some("2024-06-01 00:00"), None).as_deref(),
            Some("2024-06-01 14:30")
        );
    }

    #[test]
    fn test_single_digit_fields_are_padded() {
        assert_eq!(
            classify("-- 2024-6-1 9:05", None, None).as_deref(),
            Some("2024-06-01 09:05")
        );
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(
            classify("  --   2024-06-01   14:30  ", None, None).as_deref(),
            Some("2024-06-01 14:30")
        );
        assert_eq!(classify("--07-02", None, Some(2025)).as_deref(), Some("2025-07-02 00:00"));
    }

    #[test]
    fn test_non_markers() {
        assert_eq!(classify("hello world", None, None), None);
        assert_eq!(classify("-- see you tomorrow", None, None), None);
        assert_eq!(classify("---", None, None), None);
        assert_eq!(classify("-- -- --", None, None), None);
        assert_eq!(classify("## -- Group", None, None), None);
        assert_eq!(classify("2024-06-01 14:30", None, None), None);
    }

    #[test]
    fn test_month_day_without_context_fails() {
        let err = classify_time_tag("-- 07-02", None, None).unwrap_err();
        assert!(err.is_time_tag());
        assert!(err.to_string().contains("07-02"));
    }

    #[test]
    fn test_time_only_with_fallback_year_still_fails() {
        assert!(classify_time_tag("-- 14:30", None, Some(2024)).is_err());
    }

    #[test]
    fn test_unrecognized_layout_fails() {
        assert!(classify_time_tag("-- 2024", None, Some(2024)).is_err());
        assert!(classify_time_tag("-- 1:2:3", None, Some(2024)).is_err());
    }

    #[test]
    fn test_invalid_calendar_values_fail() {
        assert!(classify_time_tag("-- 02-30", None, Some(2024)).is_err());
        assert!(classify_time_tag("-- 2024-13-01", None, None).is_err());
        assert!(classify_time_tag("-- 2024-01-01 25:00", None, None).is_err());
    }

    #[test]
    fn test_leap_day_uses_completed_year() {
        assert_eq!(
            classify("-- 02-29", None, Some(2024)).as_deref(),
            Some("2024-02-29 00:00")
        );
        assert!(classify_time_tag("-- 02-29", None, Some(2023)).is_err());
    }

    #[test]
    fn test_classify_heading() {
        assert_eq!(classify_heading("## -- 摸鱼群").as_deref(), Some("摸鱼群"));
        assert_eq!(
            classify_heading("### -- [项目讨论群]").as_deref(),
            Some("项目讨论群")
        );
        assert_eq!(classify_heading("# --  Alice  ").as_deref(), Some("Alice"));
        assert_eq!(classify_heading("### 普通行"), None);
        assert_eq!(classify_heading("-- 2024-06-01"), None);
        assert_eq!(classify_heading("##-- tight"), None);
    }

    #[test]
    fn test_is_delimiter() {
        assert!(is_delimiter("---"));
        assert!(is_delimiter("  ---  "));
        assert!(!is_delimiter("----"));
        assert!(!is_delimiter("-- 07-02"));
    }

    #[test]
    fn test_shapes_are_ordered_most_specific_first() {
        assert_eq!(TagShape::all().first(), Some(&TagShape::DateTime));
        assert_eq!(TagShape::all().last(), Some(&TagShape::Time));
    }
}
