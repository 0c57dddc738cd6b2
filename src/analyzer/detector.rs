//! Tier-1 section detection: pattern matches resolved into section values.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::trace;

use super::matcher::{PatternMatch, extract_matches};
use super::patterns::PatternLibrary;
use super::types::{DetectedSections, Example, SectionKind};

static RULES_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<rules>([\s\S]*?)</rules>").expect("valid regex"));

static RULE_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<rule>([\s\S]*?)</rule>").expect("valid regex"));

static EXAMPLES_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<examples?>[\s\S]*?</examples?>").expect("valid regex"));

static EXAMPLE_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<example>([\s\S]*?)</example>").expect("valid regex"));

static EXAMPLE_INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:input|输入)[:：]\s*(.+?)(?:\n|(?:output|输出)[:：])").expect("valid regex")
});

static EXAMPLE_OUTPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:output|输出)[:：]\s*(.+?)(?:\n|$)").expect("valid regex"));

/// Tier-1 outcome for one singular section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionDetection<'t> {
    pub found: bool,
    pub content: Option<String>,
    pub matches: Vec<PatternMatch<'t>>,
    pub confidence: f32,
    /// The value came from an explicitly tagged match.
    pub via_tag: bool,
}

impl SectionDetection<'_> {
    const fn absent() -> Self {
        Self {
            found: false,
            content: None,
            matches: Vec::new(),
            confidence: 0.0,
            via_tag: false,
        }
    }
}

/// Pattern-based detector over an injected library.
#[derive(Debug, Clone)]
pub struct SectionDetector {
    library: Arc<PatternLibrary>,
}

impl Default for SectionDetector {
    fn default() -> Self {
        Self::new(PatternLibrary::baseline())
    }
}

impl SectionDetector {
    #[must_use]
    pub const fn new(library: Arc<PatternLibrary>) -> Self {
        Self { library }
    }

    #[must_use]
    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// Detect all six sections.
    #[must_use]
    pub fn detect(&self, text: &str) -> DetectedSections {
        let mut sections = DetectedSections {
            rules: self.detect_rules(text),
            examples: self.detect_examples(text),
            ..DetectedSections::default()
        };

        for kind in SectionKind::all().iter().copied().filter(SectionKind::is_singular) {
            if let Some(content) = self.detect_singular(text, kind).content {
                sections.fill_singular(kind, &content);
            }
        }

        trace!(
            present = sections.present_count(),
            rules = sections.rules.len(),
            examples = sections.examples.len(),
            "tier-1 detection complete"
        );
        sections
    }

    /// Resolve one singular section (introduction, context, outputFormat,
    /// task). List sections always come back absent here.
    #[must_use]
    pub fn detect_singular<'t>(&self, text: &'t str, kind: SectionKind) -> SectionDetection<'t> {
        if !kind.is_singular() {
            return SectionDetection::absent();
        }
        let definition = self.library.get(kind);
        let matches = extract_matches(text, definition);
        if matches.is_empty() {
            return SectionDetection::absent();
        }

        if let Some(tagged) = matches.iter().find(|m| definition.is_tagged(m.text)) {
            let content = tagged.inner().trim();
            if content.is_empty() {
                // An empty tag marks the section as missing.
                return SectionDetection {
                    matches,
                    via_tag: true,
                    ..SectionDetection::absent()
                };
            }
            let content = content.to_string();
            return SectionDetection {
                found: true,
                content: Some(content),
                confidence: kind.tag_confidence(),
                via_tag: true,
                matches,
            };
        }

        // Task instructions usually close the prompt, so the latest one wins.
        let chosen = if kind == SectionKind::Task {
            matches.iter().max_by_key(|m| m.start)
        } else {
            matches.first()
        };
        let content = chosen
            .map(|m| m.text.trim())
            .filter(|content| !content.is_empty())
            .map(str::to_string);
        let found = content.is_some();

        SectionDetection {
            found,
            content,
            confidence: if found { kind.pattern_confidence() } else { 0.0 },
            via_tag: false,
            matches,
        }
    }

    /// Rules: `<rule>` items of a `<rules>` block, else every rule match.
    ///
    /// Matches sharing the exact same span are reported once, so the result
    /// can be shorter than [`extract_matches`] for the rules definition.
    #[must_use]
    pub fn detect_rules(&self, text: &str) -> Vec<String> {
        let matches = extract_matches(text, self.library.get(SectionKind::Rules));
        if matches.is_empty() {
            return Vec::new();
        }

        if let Some(block) = RULES_BLOCK.captures(text).and_then(|caps| caps.get(1)) {
            let items: Vec<String> = RULE_ITEM
                .captures_iter(block.as_str())
                .filter_map(|caps| caps.get(1))
                .map(|item| item.as_str().trim().to_string())
                .collect();
            if !items.is_empty() {
                return items;
            }
        }

        distinct_spans(matches)
            .into_iter()
            .map(|m| m.text.trim())
            .filter(|rule| {
                let lower = rule.to_lowercase();
                !lower.starts_with("<rules>") && !lower.starts_with("</rules>")
            })
            .map(str::to_string)
            .collect()
    }

    /// Examples: `<example>` items of every examples block, else one record
    /// per distinct example match span.
    ///
    /// Two expressions hitting the same text (`Input: cat Output: 猫` is both
    /// an input label and an input/output pair) yield a single record, so the
    /// count can be lower than the raw match count.
    #[must_use]
    pub fn detect_examples(&self, text: &str) -> Vec<Example> {
        let matches = extract_matches(text, self.library.get(SectionKind::Examples));
        if matches.is_empty() {
            return Vec::new();
        }

        let items: Vec<Example> = EXAMPLES_BLOCK
            .find_iter(text)
            .flat_map(|block| EXAMPLE_ITEM.captures_iter(block.as_str()))
            .filter_map(|caps| caps.get(1))
            .map(|item| split_example(item.as_str().trim()))
            .collect();
        if !items.is_empty() {
            return items;
        }

        distinct_spans(matches)
            .into_iter()
            .map(|m| split_example(m.text.trim()))
            .collect()
    }
}

/// Build an example record, pulling out `input:` / `output:` parts.
#[must_use]
pub fn split_example(content: &str) -> Example {
    let grab = |re: &Regex| {
        re.captures(content)
            .and_then(|caps| caps.get(1))
            .map(|group| group.as_str().trim().to_string())
    };
    Example {
        input: grab(&EXAMPLE_INPUT),
        output: grab(&EXAMPLE_OUTPUT),
        content: content.to_string(),
    }
}

// Two expressions can hit the exact same span; keep the first occurrence.
fn distinct_spans(matches: Vec<PatternMatch<'_>>) -> Vec<PatternMatch<'_>> {
    let mut seen = HashSet::new();
    matches
        .into_iter()
        .filter(|m| seen.insert((m.start, m.end)))
        .collect()
}
