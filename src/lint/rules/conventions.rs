//! The six prompt-writing conventions.

use std::sync::LazyLock;

use regex::Regex;

use crate::keyword_rule;
use crate::lint::config::ValidationContext;
use crate::lint::diagnostic::{RuleCategory, Severity, SourceSpan};
use crate::lint::rule::{BoxedRule, ConventionRule, ValidationCheck};

// =============================================================================
// ROLE DEFINITION
// =============================================================================

const ROLE_MARKERS: &[&str] = &["you are", "act as", "your role", "<introduction>", "你是", "角色"];

// Tried in order; the first hit is reported as evidence.
static ROLE_EVIDENCE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)you are (?:a |an )?[^\n.!]+",
        r"(?i)act as (?:a |an )?[^\n.!]+",
        r"(?i)<introduction>[\s\S]*?</introduction>",
        r"你是[^\n。！]+",
    ]
    .iter()
    .map(|source| Regex::new(source).expect("valid regex"))
    .collect()
});

/// Prompt opens with (or contains) a role for the model.
pub struct RoleDefinitionRule;

impl ConventionRule for RoleDefinitionRule {
    fn id(&self) -> &str {
        "role-definition"
    }

    fn name(&self) -> &str {
        "Has clear role definition"
    }

    fn description(&self) -> &str {
        "Checks for a role phrase such as 'You are...' or 'Act as...'"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Structure
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> ValidationCheck {
        if !ctx.contains_any(ROLE_MARKERS) {
            return ValidationCheck::fail(
                self.name(),
                "Start with a role definition using 'You are...' or 'Act as...'",
            );
        }

        let evidence = ROLE_EVIDENCE.iter().find_map(|re| re.find(ctx.text));
        match evidence {
            Some(m) => ValidationCheck::pass(self.name(), m.as_str())
                .with_span(SourceSpan::from_offsets(ctx.text, m.start(), m.end())),
            None => ValidationCheck::pass(self.name(), "Role definition found"),
        }
    }
}

// =============================================================================
// KEYWORD RULES
// =============================================================================

keyword_rule!(
    RuleMarkersRule,
    id: "rule-markers",
    name: "Rules use standard markers",
    description: "Checks for rule keywords such as 'Rule:', 'Must' or 'Never'",
    category: RuleCategory::Markers,
    severity: Severity::Warning,
    markers: &["rule:", "rules:", "must", "should", "always", "never", "<rule>", "必须", "规则"],
    found: "Standard rule markers detected",
    suggestion: "Use 'Rule:', 'Must', 'Should', 'Always', or 'Never' keywords for rules"
);

keyword_rule!(
    OutputFormatRule,
    id: "output-format",
    name: "Specifies output format",
    description: "Checks that the expected response shape is stated",
    category: RuleCategory::Structure,
    severity: Severity::Warning,
    markers: &["output format:", "response format:", "format the output", "return", "<output", "输出格式"],
    found: "Output format specification detected",
    suggestion: "Add output format requirements using 'Output format:' or 'Return...' keywords"
);

keyword_rule!(
    TaskInstructionRule,
    id: "task-instruction",
    name: "Has clear task instruction",
    description: "Checks for an explicit task or an action verb",
    category: RuleCategory::Structure,
    severity: Severity::Error,
    markers: &["task:", "please", "translate", "analyze", "generate", "create", "<task>", "任务", "请"],
    found: "Task instruction detected",
    suggestion: "Add a clear task using 'Task:', 'Please...', or action verbs"
);

// =============================================================================
// EXAMPLE MARKERS
// =============================================================================

const EXAMPLE_MARKERS: &[&str] = &[
    "example:", "examples:", "for example", "e.g.", "input:", "<example>", "举例", "示例", "输入：",
];

/// Arrow-style examples must be labelled. Prompts with no examples pass.
pub struct ExampleMarkersRule;

impl ConventionRule for ExampleMarkersRule {
    fn id(&self) -> &str {
        "example-markers"
    }

    fn name(&self) -> &str {
        "Examples are marked clearly"
    }

    fn description(&self) -> &str {
        "Checks that input/output demonstrations carry an explicit label"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Markers
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> ValidationCheck {
        if ctx.contains_any(EXAMPLE_MARKERS) {
            return ValidationCheck::pass(self.name(), "Example markers detected");
        }
        if ctx.text.contains('→') || ctx.text.contains("-->") {
            return ValidationCheck::fail(
                self.name(),
                "Mark examples explicitly with 'Example:' or 'Input:/Output:' format",
            );
        }
        ValidationCheck::pass(self.name(), "No examples needed or examples not detected")
    }
}

// =============================================================================
// SECTION SEPARATION
// =============================================================================

/// Prompts longer than this many lines need blank-line separation.
const SHORT_PROMPT_LINES: usize = 5;

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

pub struct SectionSeparationRule;

impl ConventionRule for SectionSeparationRule {
    fn id(&self) -> &str {
        "section-separation"
    }

    fn name(&self) -> &str {
        "Uses blank lines to separate sections"
    }

    fn description(&self) -> &str {
        "Checks for blank lines between sections in longer prompts"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Layout
    }

    fn default_severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, ctx: &ValidationContext<'_>) -> ValidationCheck {
        if BLANK_LINE.is_match(ctx.text) {
            return ValidationCheck::pass(self.name(), "Blank lines detected for section separation");
        }
        if ctx.text.split('\n').count() <= SHORT_PROMPT_LINES {
            return ValidationCheck::pass(self.name(), "Prompt is short, separation not critical");
        }
        ValidationCheck::fail(
            self.name(),
            "Add blank lines between different sections for better readability",
        )
        .with_span(SourceSpan::from_offsets(ctx.text, 0, ctx.text.len()))
    }
}

/// All convention rules in reporting order.
#[must_use]
pub fn convention_rules() -> Vec<BoxedRule> {
    vec![
        Box::new(RoleDefinitionRule),
        Box::new(RuleMarkersRule),
        Box::new(ExampleMarkersRule),
        Box::new(SectionSeparationRule),
        Box::new(OutputFormatRule),
        Box::new(TaskInstructionRule),
    ]
}
