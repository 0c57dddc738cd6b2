//! Quality scoring and issue listing over detected sections.
//!
//! Everything here is a pure function of [`DetectedSections`]: repeated
//! calls on the same value give bit-identical results.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{DetectedSections, SectionKind};

/// Four scores in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub clarity_score: f64,
    pub completeness_score: f64,
    pub structure_score: f64,
    pub overall_score: f64,
}

/// Boolean inputs the scores are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityCriteria {
    pub has_introduction: bool,
    pub has_rules: bool,
    pub has_examples: bool,
    pub has_output_format: bool,
    pub has_task: bool,
    pub uses_standard_markers: bool,
    /// Not derived from the text; always assumed.
    pub has_section_separation: bool,
    pub structure_is_organized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    MissingContent,
    Ambiguity,
    Structure,
    Formatting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::Medium => f.write_str("medium"),
            Self::High => f.write_str("high"),
        }
    }
}

/// One detected deficiency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: IssueSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionKind>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Per-section issue text for absent sections. Context is not reported.
const MISSING_SECTION_ISSUES: &[(SectionKind, IssueSeverity, &str, &str)] = &[
    (
        SectionKind::Introduction,
        IssueSeverity::Medium,
        "No role or introduction section detected",
        "Add an introduction using 'You are...' or 'Act as...' to define the AI's role",
    ),
    (
        SectionKind::Rules,
        IssueSeverity::Medium,
        "No rules or constraints detected",
        "Add rules using 'Rule:', 'Must', 'Should', or 'Always' keywords",
    ),
    (
        SectionKind::Examples,
        IssueSeverity::Low,
        "No examples provided",
        "Add 1-2 examples to illustrate expected behavior using \"Example:\" or \"Input:/Output:\" format",
    ),
    (
        SectionKind::OutputFormat,
        IssueSeverity::Low,
        "No output format specified",
        "Add output format requirements using 'Output format:' or 'Return...' keywords",
    ),
    (
        SectionKind::Task,
        IssueSeverity::High,
        "No clear task or instruction detected",
        "Add a clear task using 'Task:', 'Please...', or action verbs like 'Translate', 'Analyze', etc.",
    ),
];

const INTRODUCTION_MARKERS: &[&str] = &["you are", "act as", "<introduction>"];
const RULE_MARKERS: &[&str] = &["must", "should", "<rule>"];
const EXAMPLE_MARKERS: &[&str] = &["example:", "input:", "<example>"];
const OUTPUT_MARKERS: &[&str] = &["output format:", "response format:", "<output"];

fn has_marker(text: &str, markers: &[&str]) -> bool {
    let lower = text.to_lowercase();
    markers.iter().any(|marker| lower.contains(marker))
}

/// Scores detected sections and lists what is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityEvaluator;

impl QualityEvaluator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn criteria(&self, sections: &DetectedSections) -> QualityCriteria {
        let has_introduction = sections.has(SectionKind::Introduction);
        let has_rules = sections.has(SectionKind::Rules);
        let has_task = sections.has(SectionKind::Task);
        QualityCriteria {
            has_introduction,
            has_rules,
            has_examples: sections.has(SectionKind::Examples),
            has_output_format: sections.has(SectionKind::OutputFormat),
            has_task,
            uses_standard_markers: uses_standard_markers(sections),
            has_section_separation: true,
            structure_is_organized: has_task && (has_introduction || has_rules),
        }
    }

    #[must_use]
    pub fn evaluate(&self, sections: &DetectedSections) -> QualityMetrics {
        let c = self.criteria(sections);
        let weight = |flag: bool, w: f64| if flag { w } else { 0.0 };

        let clarity = weight(c.uses_standard_markers, 0.5)
            + weight(c.has_section_separation, 0.25)
            + weight(c.structure_is_organized, 0.25);

        let completeness = weight(c.has_introduction, 0.2)
            + weight(c.has_rules, 0.25)
            + weight(c.has_examples, 0.2)
            + weight(c.has_output_format, 0.15)
            + weight(c.has_task, 0.2);

        let rule_bonus = (0.05 * sections.rules.len() as f64).min(0.2);
        let structure = weight(c.structure_is_organized, 0.4)
            + weight(c.has_introduction, 0.2)
            + weight(c.has_task, 0.2)
            + rule_bonus;

        let overall = 0.3f64.mul_add(clarity, 0.4f64.mul_add(completeness, 0.3 * structure));

        QualityMetrics {
            clarity_score: clarity.clamp(0.0, 1.0),
            completeness_score: completeness.clamp(0.0, 1.0),
            structure_score: structure.clamp(0.0, 1.0),
            overall_score: overall.clamp(0.0, 1.0),
        }
    }

    /// One issue per absent section (context excepted).
    #[must_use]
    pub fn identify_issues(&self, sections: &DetectedSections) -> Vec<PromptIssue> {
        MISSING_SECTION_ISSUES
            .iter()
            .filter(|(kind, ..)| !sections.has(*kind))
            .map(|(kind, severity, description, suggestion)| PromptIssue {
                issue_type: IssueType::MissingContent,
                severity: *severity,
                section: Some(*kind),
                description: (*description).to_string(),
                suggestion: Some((*suggestion).to_string()),
            })
            .collect()
    }

    /// Absent sections in canonical order.
    #[must_use]
    pub fn identify_missing_sections(&self, sections: &DetectedSections) -> Vec<SectionKind> {
        SectionKind::all()
            .iter()
            .copied()
            .filter(|kind| !sections.has(*kind))
            .collect()
    }

    #[must_use]
    pub fn generate_suggestions(&self, sections: &DetectedSections) -> Vec<String> {
        let mut suggestions: Vec<String> = self
            .identify_issues(sections)
            .into_iter()
            .filter_map(|issue| issue.suggestion)
            .collect();

        if sections.has(SectionKind::Introduction) {
            suggestions.push("Good: Role definition is present and helps set context".to_string());
        }
        if sections.rules.len() >= 3 {
            suggestions.push(format!(
                "Good: Multiple rules defined for clear guidance ({} rules)",
                sections.rules.len()
            ));
        }
        if sections.examples.len() >= 2 {
            suggestions.push(format!(
                "Good: Multiple examples provided ({} examples)",
                sections.examples.len()
            ));
        }
        suggestions
    }
}

// Fraction of present sections (introduction, rules, examples, output
// format) that carry a canonical marker must reach one half.
fn uses_standard_markers(sections: &DetectedSections) -> bool {
    let checks = [
        sections
            .introduction
            .as_deref()
            .map(|intro| has_marker(intro, INTRODUCTION_MARKERS)),
        (!sections.rules.is_empty()).then(|| {
            sections.rules.iter().any(|rule| {
                rule.to_lowercase().starts_with("rule:") || has_marker(rule, RULE_MARKERS)
            })
        }),
        (!sections.examples.is_empty()).then(|| {
            sections
                .examples
                .iter()
                .any(|example| has_marker(&example.content, EXAMPLE_MARKERS))
        }),
        sections
            .output_format
            .as_deref()
            .map(|format| has_marker(format, OUTPUT_MARKERS)),
    ];

    let present = checks.iter().flatten().count();
    let marked = checks.iter().flatten().filter(|hit| **hit).count();
    present > 0 && marked * 2 >= present
}
