//! Core types shared by the detection pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PromptError;

/// One of the six canonical semantic roles a prompt fragment can play.
///
/// Variant order is the canonical section order, so `Ord` sorts sections
/// the way templates render them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    Introduction,
    Rules,
    Context,
    Examples,
    OutputFormat,
    Task,
}

impl SectionKind {
    /// All sections in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Introduction,
            Self::Rules,
            Self::Context,
            Self::Examples,
            Self::OutputFormat,
            Self::Task,
        ]
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Introduction => "introduction",
            Self::Rules => "rules",
            Self::Context => "context",
            Self::Examples => "examples",
            Self::OutputFormat => "outputFormat",
            Self::Task => "task",
        }
    }

    /// Canonical rank, introduction = 1 through task = 6.
    #[must_use]
    pub const fn priority(&self) -> u8 {
        match self {
            Self::Introduction => 1,
            Self::Rules => 2,
            Self::Context => 3,
            Self::Examples => 4,
            Self::OutputFormat => 5,
            Self::Task => 6,
        }
    }

    /// Singular sections hold at most one value; rules and examples are lists.
    #[must_use]
    pub const fn is_singular(&self) -> bool {
        !matches!(self, Self::Rules | Self::Examples)
    }

    /// Points this section contributes to the detection-quality gate.
    #[must_use]
    pub const fn quality_points(&self) -> u32 {
        match self {
            Self::Introduction | Self::Rules | Self::Examples | Self::Task => 2,
            Self::Context | Self::OutputFormat => 1,
        }
    }

    /// Confidence assigned when the value came from an explicit tag.
    #[must_use]
    pub const fn tag_confidence(&self) -> f32 {
        match self {
            Self::Introduction | Self::Task => 0.95,
            Self::Rules | Self::Context | Self::Examples | Self::OutputFormat => 0.9,
        }
    }

    /// Confidence assigned when the value came from a free-text expression.
    #[must_use]
    pub const fn pattern_confidence(&self) -> f32 {
        match self {
            Self::Introduction | Self::Rules | Self::Examples | Self::OutputFormat => 0.8,
            Self::Context => 0.75,
            Self::Task => 0.85,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "introduction" | "intro" | "role" => Ok(Self::Introduction),
            "rules" | "rule" => Ok(Self::Rules),
            "context" | "background" => Ok(Self::Context),
            "examples" | "example" => Ok(Self::Examples),
            "outputformat" | "output" | "format" => Ok(Self::OutputFormat),
            "task" | "instruction" => Ok(Self::Task),
            other => Err(PromptError::InvalidPattern(format!(
                "unknown section '{other}'"
            ))),
        }
    }
}

/// A single example, optionally split into an input/output pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Example {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            input: None,
            output: None,
        }
    }
}

/// The canonical detection output.
///
/// Every populated field originates from the pattern detector or the
/// heuristic segmenter. `raw_sections` mirrors the singular sections that
/// are present and is derived, not authoritative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedSections {
    pub introduction: Option<String>,
    pub rules: Vec<String>,
    pub context: Option<String>,
    pub examples: Vec<Example>,
    pub output_format: Option<String>,
    pub task: Option<String>,
    #[serde(default)]
    pub raw_sections: BTreeMap<SectionKind, String>,
}

impl DetectedSections {
    /// Value of a singular section. Always `None` for rules and examples.
    #[must_use]
    pub fn singular(&self, kind: SectionKind) -> Option<&str> {
        match kind {
            SectionKind::Introduction => self.introduction.as_deref(),
            SectionKind::Context => self.context.as_deref(),
            SectionKind::OutputFormat => self.output_format.as_deref(),
            SectionKind::Task => self.task.as_deref(),
            SectionKind::Rules | SectionKind::Examples => None,
        }
    }

    /// Fill a singular section only if it is still empty. Blank values are
    /// never stored. Returns whether the value was stored.
    pub(crate) fn fill_singular(&mut self, kind: SectionKind, value: &str) -> bool {
        if value.trim().is_empty() {
            return false;
        }
        let slot = match kind {
            SectionKind::Introduction => &mut self.introduction,
            SectionKind::Context => &mut self.context,
            SectionKind::OutputFormat => &mut self.output_format,
            SectionKind::Task => &mut self.task,
            SectionKind::Rules | SectionKind::Examples => return false,
        };
        if slot.as_deref().is_some_and(|current| !current.trim().is_empty()) {
            return false;
        }
        *slot = Some(value.to_string());
        self.raw_sections.insert(kind, value.to_string());
        true
    }

    /// Whether a section is present (non-blank singular, non-empty list).
    #[must_use]
    pub fn has(&self, kind: SectionKind) -> bool {
        match kind {
            SectionKind::Rules => !self.rules.is_empty(),
            SectionKind::Examples => !self.examples.is_empty(),
            _ => self.singular(kind).is_some_and(|value| !value.trim().is_empty()),
        }
    }

    /// Present sections in canonical order.
    #[must_use]
    pub fn present(&self) -> Vec<SectionKind> {
        SectionKind::all()
            .iter()
            .copied()
            .filter(|kind| self.has(*kind))
            .collect()
    }

    /// Number of present sections (0-6).
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.present().len()
    }
}

/// Structural shape of a heuristic segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentType {
    Paragraph,
    ColonSection,
    List,
    Unknown,
}

/// Category a heuristic segment is guessed to belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentCategory {
    Introduction,
    Rules,
    Context,
    Examples,
    OutputFormat,
    Task,
    Unknown,
}

impl SegmentCategory {
    #[must_use]
    pub const fn section(self) -> Option<SectionKind> {
        match self {
            Self::Introduction => Some(SectionKind::Introduction),
            Self::Rules => Some(SectionKind::Rules),
            Self::Context => Some(SectionKind::Context),
            Self::Examples => Some(SectionKind::Examples),
            Self::OutputFormat => Some(SectionKind::OutputFormat),
            Self::Task => Some(SectionKind::Task),
            Self::Unknown => None,
        }
    }
}

impl From<SectionKind> for SegmentCategory {
    fn from(kind: SectionKind) -> Self {
        match kind {
            SectionKind::Introduction => Self::Introduction,
            SectionKind::Rules => Self::Rules,
            SectionKind::Context => Self::Context,
            SectionKind::Examples => Self::Examples,
            SectionKind::OutputFormat => Self::OutputFormat,
            SectionKind::Task => Self::Task,
        }
    }
}

impl fmt::Display for SegmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.section() {
            Some(kind) => f.write_str(kind.as_str()),
            None => f.write_str("unknown"),
        }
    }
}

/// List marker style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    Numbered,
    Bulleted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMetadata {
    /// Text before the colon of a colon-section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colon_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_style: Option<ListStyle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list_items: Vec<String>,
}

/// A contiguous fragment produced by one heuristic segmentation pass.
///
/// Line numbers are 1-indexed and inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeuristicSegment {
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    #[serde(rename = "type")]
    pub segment_type: SegmentType,
    pub suggested_category: SegmentCategory,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SegmentMetadata>,
}

impl HeuristicSegment {
    /// Individual list items when the segment carries list metadata.
    #[must_use]
    pub fn list_items(&self) -> Option<&[String]> {
        self.metadata
            .as_ref()
            .map(|meta| meta.list_items.as_slice())
            .filter(|items| !items.is_empty())
    }

    /// Get the first N characters of content as a preview.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        let preview: String = self.content.chars().take(max_chars).collect();
        if self.content.chars().count() > max_chars {
            format!("{preview}...")
        } else {
            preview
        }
    }
}
