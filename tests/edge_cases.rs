//! Edge case tests for chatsplice
//!
//! These tests cover unusual inputs and boundary conditions
//! that might not be covered by regular unit and integration tests.

use std::path::Path;

use chatsplice::config::MergeConfig;
use chatsplice::core::{MergeStrategy, Reconciler};
use chatsplice::parser::{BlockParser, parse_organized_str, parse_raw_str};
use chatsplice::parsing::normalize_for_hashing;
use chatsplice::{Block, TimeTag};

fn parse(content: &str) -> Vec<Block> {
    parse_raw_str(content, "raw.md", None).unwrap().blocks
}

fn tags(blocks: &[Block]) -> Vec<String> {
    blocks.iter().map(|b| b.time_tag().to_string()).collect()
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =========================================================================
// Unicode and noise
// =========================================================================

#[test]
fn test_cjk_conversation_and_content() {
    let blocks = parse("### -- [项目讨论群]\n-- 2024-05-01 09:00\n张三：今天的会议改到下午三点 [表情]\n");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].conversation(), "项目讨论群");
    assert_eq!(blocks[0].content(), &["张三：今天的会议改到下午三点 [表情]".to_string()]);
    assert_eq!(
        normalize_for_hashing(&blocks[0].content()[0]).as_deref(),
        Some("张三：今天的会议改到下午三点")
    );
}

#[test]
fn test_noise_only_lines_are_not_hashable() {
    for line in ["", "   ", "ok", "👍👍", "(图片)", "[表情]", "[ok] (sticker)", "好的 [捂脸]"] {
        assert_eq!(normalize_for_hashing(line), None, "{line:?} should not be hashable");
    }
}

#[test]
fn test_long_annotation_is_kept() {
    assert_eq!(
        normalize_for_hashing("see [the attached quarterly report]").as_deref(),
        Some("see [the attached quarterly report]")
    );
}

#[test]
fn test_reexport_with_different_noise_still_anchors() {
    let target = lines(&[
        "## -- 家庭群",
        "",
        "-- 2024-05-01 09:00",
        "",
        "妈妈：晚上回家吃饭吗 (图片)",
        "爸爸：我七点到家 [微笑]",
        "",
    ]);
    let block = Block::new(
        "家庭群",
        "2024-05-01 09:00".parse().unwrap(),
        lines(&["妈妈：晚上回家吃饭吗 [图片]", "爸爸：我七点到家"]),
        "raw.md",
    );

    let plan = Reconciler::new()
        .plan(&block, Path::new("家庭群/2024-05.md"), Some(target.as_slice()))
        .unwrap();
    assert_eq!(plan.outcome.strategy(), MergeStrategy::BothMatch);
    assert_eq!(plan.outcome.added_lines(), 0);
}

// =========================================================================
// Line endings and front matter
// =========================================================================

#[test]
fn test_crlf_line_endings() {
    let blocks = parse("## -- Team\r\n-- 2024-03-01 10:00\r\nAlice: windows export here\r\n");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].conversation(), "Team");
    assert_eq!(blocks[0].content(), &["Alice: windows export here".to_string()]);
}

#[test]
fn test_unterminated_front_matter_swallows_everything() {
    let blocks = parse("---\ntitle: broken\n## -- Team\n-- 2024-03-01\nhello everyone\n");
    assert!(blocks.is_empty());
}

#[test]
fn test_delimiter_after_body_is_content() {
    let blocks = parse("## -- Team\n-- 2024-03-01\nabove the rule\n---\nbelow the rule\n");
    assert_eq!(blocks[0].content(), &lines(&["above the rule", "---", "below the rule"])[..]);
}

#[test]
fn test_empty_file() {
    assert!(parse("").is_empty());
    assert!(parse("\n\n\n").is_empty());
}

// =========================================================================
// Marker boundaries
// =========================================================================

#[test]
fn test_lines_before_heading_are_dropped() {
    let blocks = parse("preamble text\n-- 2024-03-01\norphan line\n## -- Team\n-- 2024-03-02\nkept line\n");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].content(), &["kept line".to_string()]);
}

#[test]
fn test_empty_blocks_are_kept() {
    let blocks = parse("## -- Team\n-- 2024-03-01 10:00\n-- 11:00\n-- 12:00\nlast one\n");
    assert_eq!(tags(&blocks), vec!["2024-03-01 10:00", "2024-03-01 11:00", "2024-03-01 12:00"]);
    assert!(blocks[0].is_empty());
    assert!(blocks[1].is_empty());
}

#[test]
fn test_dash_lines_that_are_not_markers() {
    let blocks = parse("## -- Team\n-- 2024-03-01\n-- see you later\n- bullet\n--\n");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].content(), &lines(&["-- see you later", "- bullet", "--"])[..]);
}

#[test]
fn test_heading_resets_reference_year() {
    let err = parse_raw_str("## -- A\n-- 2024-03-01\nx\n## -- B\n-- 03-02\ny\n", "raw.md", None).unwrap_err();
    assert!(err.is_time_tag());

    let blocks = parse_raw_str("## -- A\n-- 2024-03-01\nx\n## -- B\n-- 03-02\ny\n", "raw.md", Some(2020))
        .unwrap()
        .blocks;
    assert_eq!(tags(&blocks), vec!["2024-03-01 00:00", "2020-03-02 00:00"]);
}

#[test]
fn test_year_rollover_is_not_inferred() {
    let blocks = parse("## -- Team\n-- 2024-12-31 23:50\nlate night\n-- 01-01 00:10\nhappy new year\n");
    assert_eq!(tags(&blocks), vec!["2024-12-31 23:50", "2024-01-01 00:10"]);
}

#[test]
fn test_leap_day() {
    let parser = BlockParser::new().with_fallback_year(2024);
    let doc = parser.parse_str("## -- Team\n-- 02-29\nleap\n", "raw.md").unwrap();
    assert_eq!(doc.blocks[0].time_tag().to_string(), "2024-02-29 00:00");

    let parser = BlockParser::new().with_fallback_year(2023);
    assert!(parser.parse_str("## -- Team\n-- 02-29\nleap\n", "raw.md").is_err());
}

#[test]
fn test_invalid_calendar_values() {
    for marker in ["-- 2024-02-30", "-- 2024-13-01", "-- 2024-03-01 24:00", "-- 2024-03-01 10:60"] {
        let content = format!("## -- Team\n{marker}\nhello\n");
        let err = parse_raw_str(&content, "raw.md", None).unwrap_err();
        assert!(err.is_time_tag(), "{marker} should be rejected");
        assert!(err.to_string().contains("line 2"));
    }
}

#[test]
fn test_unrecognized_marker_layout() {
    let err = parse_raw_str("## -- Team\n-- 2024\nhello\n", "raw.md", None).unwrap_err();
    assert!(err.to_string().contains("more complete tag"));
}

#[test]
fn test_single_digit_fields() {
    let blocks = parse("## -- Team\n-- 2024-3-5 9:05\nhello\n");
    assert_eq!(tags(&blocks), vec!["2024-03-05 09:05"]);
}

// =========================================================================
// Archives
// =========================================================================

#[test]
fn test_archive_with_two_conversations_is_rejected() {
    let err = parse_organized_str("## -- A\n-- 2024-03-01\nx\n## -- B\n-- 2024-03-02\ny\n", "org.md").unwrap_err();
    assert!(err.is_invariant_violation());
    assert!(err.to_string().contains("org.md"));
}

#[test]
fn test_unsorted_archive_is_sorted_on_read() {
    let doc = parse_organized_str("## -- A\n-- 2024-03-05\nlater\n-- 2024-03-01\nearlier\n", "org.md").unwrap();
    assert_eq!(tags(doc.blocks()), vec!["2024-03-01 00:00", "2024-03-05 00:00"]);
}

#[test]
fn test_noise_only_block_is_inserted_each_time() {
    let block = Block::new("Team", "2024-03-01 10:00".parse().unwrap(), lines(&["ok", "👍"]), "raw.md");
    let path = Path::new("Team/2024-03.md");
    let reconciler = Reconciler::new();

    let first = reconciler.plan(&block, path, None).unwrap();
    let second = reconciler.plan(&block, path, Some(first.lines.as_slice())).unwrap();
    assert_eq!(first.outcome.strategy(), MergeStrategy::NoMatch);
    assert_eq!(second.outcome.strategy(), MergeStrategy::NoMatch);
    assert_eq!(second.outcome.block_stats.hashable_lines, 0);
    assert_eq!(parse_organized_str(&second.lines.join("\n"), path).unwrap().len(), 2);
}

#[test]
fn test_window_larger_than_block() {
    let target = lines(&["## -- Team", "", "-- 2024-03-01 10:00", "", "Alice: only one real line here", ""]);
    let block = Block::new(
        "Team",
        TimeTag::from_ymd_hm(2024, 3, 1, 10, 0).unwrap(),
        lines(&["Alice: only one real line here"]),
        "raw.md",
    );
    let reconciler = Reconciler::with_config(MergeConfig::new().with_window_size(50));
    let plan = reconciler.plan(&block, Path::new("Team/2024-03.md"), Some(target.as_slice())).unwrap();
    assert_eq!(plan.outcome.strategy(), MergeStrategy::BothMatch);
    assert_eq!(plan.lines, target);
}
