//! Heuristic segmentation for prompts that carry no explicit markers.
//!
//! Three strategies run in strict order and the first non-empty result
//! wins: colon sections, then lists, then paragraphs.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{HeuristicSegment, ListStyle, SegmentCategory, SegmentMetadata, SegmentType};

// =============================================================================
// SEGMENTER TRAIT
// =============================================================================

/// Splits raw text into categorised fragments.
pub trait Segmenter: Send + Sync {
    /// Segment `text`. An empty vector means nothing usable was found.
    fn segment(&self, text: &str) -> Vec<HeuristicSegment>;

    /// Returns the name of this segmenter for debugging.
    fn name(&self) -> &'static str;
}

// =============================================================================
// CASCADES
// =============================================================================

/// Ordered `(keywords, category)` rows; the first row with a keyword
/// contained in the lower-cased text decides.
type Cascade = &'static [(&'static [&'static str], SegmentCategory)];

const COLON_PREFIX_CASCADE: Cascade = &[
    (
        &["rule", "requirement", "constraint", "guideline", "规则", "要求", "约束", "限制"],
        SegmentCategory::Rules,
    ),
    (
        &["example", "sample", "demonstration", "举例", "示例", "样例", "比如"],
        SegmentCategory::Examples,
    ),
    (
        &["output", "format", "response", "输出", "格式", "返回"],
        SegmentCategory::OutputFormat,
    ),
    (
        &["context", "background", "scenario", "背景", "上下文", "场景"],
        SegmentCategory::Context,
    ),
    (
        &["task", "instruction", "goal", "objective", "任务", "指令", "目标"],
        SegmentCategory::Task,
    ),
    (
        &["role", "system", "you are", "角色", "系统", "你是"],
        SegmentCategory::Introduction,
    ),
];

const CONTENT_CASCADE: Cascade = &[
    (&["must", "should", "必须", "应该", "不要"], SegmentCategory::Rules),
    (
        &["example", "e.g.", "举例", "比如", "input", "output", "输入", "输出"],
        SegmentCategory::Examples,
    ),
    (&["format", "return", "格式", "返回"], SegmentCategory::OutputFormat),
    (&["background", "context", "背景", "上下文"], SegmentCategory::Context),
];

fn categorize(text: &str, cascade: Cascade) -> SegmentCategory {
    let lower = text.to_lowercase();
    cascade
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lower.contains(keyword)))
        .map_or(SegmentCategory::Unknown, |(_, category)| *category)
}

static COLON_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:：\n]{1,50}?)[:：]\s*(.+)").expect("valid regex"));

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:[.)]\s+|[、．]\s*)(.+)").expect("valid regex"));

static BULLETED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*•]\s+(.+)").expect("valid regex"));

const COLON_CONFIDENCE: f32 = 0.7;
const LIST_CONFIDENCE: f32 = 0.6;
const PARAGRAPH_CONFIDENCE: f32 = 0.5;

// =============================================================================
// HEURISTIC SEGMENTER
// =============================================================================

/// Line-oriented fallback segmenter. Stateless; line numbers are 1-indexed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSegmenter;

impl HeuristicSegmenter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// `Label: content` headers, continued by following non-blank lines.
    #[must_use]
    pub fn colon_sections(&self, text: &str) -> Vec<HeuristicSegment> {
        let mut segments = Vec::new();
        let mut current: Option<HeuristicSegment> = None;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = line.trim();

            if let Some(caps) = COLON_LINE.captures(trimmed) {
                segments.extend(current.take());
                let prefix = caps.get(1).map_or("", |m| m.as_str()).trim();
                let content = caps.get(2).map_or("", |m| m.as_str()).trim();
                current = Some(HeuristicSegment {
                    content: content.to_string(),
                    start_line: line_no,
                    end_line: line_no,
                    segment_type: SegmentType::ColonSection,
                    suggested_category: categorize(prefix, COLON_PREFIX_CASCADE),
                    confidence: COLON_CONFIDENCE,
                    metadata: Some(SegmentMetadata {
                        colon_prefix: Some(prefix.to_string()),
                        ..SegmentMetadata::default()
                    }),
                });
            } else if trimmed.is_empty() {
                segments.extend(current.take());
            } else if let Some(segment) = current.as_mut() {
                segment.content.push('\n');
                segment.content.push_str(trimmed);
                segment.end_line = line_no;
            }
        }

        segments.extend(current);
        segments
    }

    /// Runs of numbered or bulleted items. Lines that are neither items nor
    /// blank are skipped without closing the open list.
    #[must_use]
    pub fn lists(&self, text: &str) -> Vec<HeuristicSegment> {
        let mut segments = Vec::new();
        let mut current: Option<HeuristicSegment> = None;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = line.trim();

            let item = NUMBERED_ITEM
                .captures(trimmed)
                .and_then(|caps| caps.get(2))
                .map(|m| (m.as_str(), ListStyle::Numbered))
                .or_else(|| {
                    BULLETED_ITEM
                        .captures(trimmed)
                        .and_then(|caps| caps.get(1))
                        .map(|m| (m.as_str(), ListStyle::Bulleted))
                });

            match item {
                Some((item, style)) => {
                    let item = item.trim();
                    let continues = current
                        .as_ref()
                        .and_then(|segment| segment.metadata.as_ref())
                        .is_some_and(|meta| meta.list_style == Some(style));
                    if continues {
                        if let Some(segment) = current.as_mut() {
                            segment.content.push('\n');
                            segment.content.push_str(item);
                            segment.end_line = line_no;
                            if let Some(meta) = segment.metadata.as_mut() {
                                meta.list_items.push(item.to_string());
                            }
                        }
                    } else {
                        segments.extend(current.take());
                        current = Some(HeuristicSegment {
                            content: item.to_string(),
                            start_line: line_no,
                            end_line: line_no,
                            segment_type: SegmentType::List,
                            suggested_category: categorize(item, CONTENT_CASCADE),
                            confidence: LIST_CONFIDENCE,
                            metadata: Some(SegmentMetadata {
                                list_style: Some(style),
                                list_items: vec![item.to_string()],
                                ..SegmentMetadata::default()
                            }),
                        });
                    }
                }
                None if trimmed.is_empty() => segments.extend(current.take()),
                None => {}
            }
        }

        segments.extend(current);
        segments
    }

    /// Runs of non-blank lines. The first paragraph is taken as the
    /// introduction; later ones go through the content cascade.
    #[must_use]
    pub fn paragraphs(&self, text: &str) -> Vec<HeuristicSegment> {
        let mut segments: Vec<HeuristicSegment> = Vec::new();
        let mut block: Vec<&str> = Vec::new();
        let mut start_line = 0;

        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                close_paragraph(&mut block, start_line, &mut segments);
            } else {
                if block.is_empty() {
                    start_line = index + 1;
                }
                block.push(line);
            }
        }
        close_paragraph(&mut block, start_line, &mut segments);

        segments
    }
}

fn close_paragraph(block: &mut Vec<&str>, start_line: usize, segments: &mut Vec<HeuristicSegment>) {
    if block.is_empty() {
        return;
    }
    let content = block.join("\n").trim().to_string();
    let suggested_category = if segments.is_empty() {
        SegmentCategory::Introduction
    } else {
        categorize(&content, CONTENT_CASCADE)
    };
    segments.push(HeuristicSegment {
        content,
        start_line,
        end_line: start_line + block.len() - 1,
        segment_type: SegmentType::Paragraph,
        suggested_category,
        confidence: PARAGRAPH_CONFIDENCE,
        metadata: None,
    });
    block.clear();
}

impl Segmenter for HeuristicSegmenter {
    fn segment(&self, text: &str) -> Vec<HeuristicSegment> {
        let colon = self.colon_sections(text);
        if !colon.is_empty() {
            return colon;
        }
        let lists = self.lists(text);
        if !lists.is_empty() {
            return lists;
        }
        self.paragraphs(text)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colon_sections_scenario() {
        let segments = HeuristicSegmenter.segment("规则: 必须使用中文\n举例: 输入 -> 输出");
        assert_eq!(segments.len(), 2);

        assert_eq!(segments[0].segment_type, SegmentType::ColonSection);
        assert_eq!(segments[0].suggested_category, SegmentCategory::Rules);
        assert_eq!(segments[0].content, "必须使用中文");
        assert_eq!((segments[0].start_line, segments[0].end_line), (1, 1));
        assert!((segments[0].confidence - 0.7).abs() < f32::EPSILON);

        assert_eq!(segments[1].suggested_category, SegmentCategory::Examples);
        assert_eq!(segments[1].content, "输入 -> 输出");
        assert_eq!(
            segments[1].metadata.as_ref().and_then(|m| m.colon_prefix.as_deref()),
            Some("举例")
        );
    }

    #[test]
    fn test_colon_section_continuation_and_blank_line() {
        let text = "Requirements: be fast\nand correct\n\nstray line\nGoal: ship it";
        let segments = HeuristicSegmenter.colon_sections(text);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].content, "be fast\nand correct");
        assert_eq!(segments[0].end_line, 2);
        assert_eq!(segments[1].suggested_category, SegmentCategory::Task);
        assert_eq!(segments[1].start_line, 5);
    }

    #[test]
    fn test_colon_prefix_cascade_order() {
        // "output rules" hits the rules row before the output row.
        assert_eq!(categorize("Output rules", COLON_PREFIX_CASCADE), SegmentCategory::Rules);
        assert_eq!(categorize("System", COLON_PREFIX_CASCADE), SegmentCategory::Introduction);
        assert_eq!(categorize("Misc", COLON_PREFIX_CASCADE), SegmentCategory::Unknown);
    }

    #[test]
    fn test_lists_accumulate_same_style() {
        let text = "1. You must be polite\n2. Keep it short\n- a bullet\n- another";
        let segments = HeuristicSegmenter.lists(text);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].suggested_category, SegmentCategory::Rules);
        assert_eq!(
            segments[0].list_items().map(<[String]>::len),
            Some(2)
        );
        assert_eq!((segments[0].start_line, segments[0].end_line), (1, 2));
        let meta = segments[1].metadata.as_ref().unwrap();
        assert_eq!(meta.list_style, Some(ListStyle::Bulleted));
        assert_eq!(meta.list_items, vec!["a bullet", "another"]);
    }

    #[test]
    fn test_list_category_is_lexical_not_positional() {
        let segments = HeuristicSegmenter.lists("• hello there\n• general");
        assert_eq!(segments[0].suggested_category, SegmentCategory::Unknown);
        assert!((segments[0].confidence - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_chinese_numbered_markers() {
        let segments = HeuristicSegmenter.lists("1、必须简洁\n2．不要编造");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].list_items().unwrap(), ["必须简洁", "不要编造"]);
    }

    #[test]
    fn test_blank_line_closes_list() {
        let segments = HeuristicSegmenter.lists("- one\n\n- two");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].start_line, 3);
    }

    #[test]
    fn test_paragraphs_first_is_introduction() {
        let text = "A helpful bot.\nVery friendly.\n\n\nAnswers must be brief.\n\nSee the background notes.";
        let segments = HeuristicSegmenter.paragraphs(text);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].suggested_category, SegmentCategory::Introduction);
        assert_eq!((segments[0].start_line, segments[0].end_line), (1, 2));
        assert_eq!(segments[1].suggested_category, SegmentCategory::Rules);
        assert_eq!(segments[1].start_line, 5);
        assert_eq!(segments[2].suggested_category, SegmentCategory::Context);
        assert!(segments.iter().all(|s| s.segment_type == SegmentType::Paragraph));
    }

    #[test]
    fn test_strategy_precedence() {
        // A colon header anywhere suppresses list detection.
        let segments = HeuristicSegmenter.segment("- item one\nNote: careful");
        assert!(segments.iter().all(|s| s.segment_type == SegmentType::ColonSection));

        let segments = HeuristicSegmenter.segment("just prose");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].segment_type, SegmentType::Paragraph);
    }

    #[test]
    fn test_empty_text() {
        assert!(HeuristicSegmenter.segment("").is_empty());
        assert!(HeuristicSegmenter.segment("\n \n").is_empty());
    }
}
