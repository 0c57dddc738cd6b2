//! Analysis façade: detection, scoring, issues and an optimisation brief.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::orchestrator::{DetectionConfig, DetectionOrchestrator, DetectionProfile};
use super::quality::{PromptIssue, QualityEvaluator, QualityMetrics};
use super::types::{DetectedSections, SectionKind};
use crate::error::PromptError;

/// Model family the optimisation brief is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetModel {
    Claude,
    Gpt,
    #[default]
    Generic,
}

impl fmt::Display for TargetModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Claude => f.write_str("claude"),
            Self::Gpt => f.write_str("gpt"),
            Self::Generic => f.write_str("generic"),
        }
    }
}

impl FromStr for TargetModel {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(Self::Claude),
            "gpt" => Ok(Self::Gpt),
            "generic" => Ok(Self::Generic),
            other => Err(PromptError::ValidationFailed(format!(
                "unknown target model '{other}' (expected claude, gpt or generic)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub sections: DetectedSections,
    pub quality: QualityMetrics,
    pub issues: Vec<PromptIssue>,
    pub missing_sections: Vec<SectionKind>,
    pub suggestions: Vec<String>,
    pub optimization_prompt: String,
}

/// Quick pass/fail summary over detected sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConventionSummary {
    pub score: f64,
    pub passed_checks: Vec<String>,
    pub failed_checks: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ContentAnalyzer {
    orchestrator: DetectionOrchestrator,
    evaluator: QualityEvaluator,
}

impl ContentAnalyzer {
    #[must_use]
    pub fn new(config: DetectionConfig) -> Self {
        Self::with_orchestrator(DetectionOrchestrator::new(config))
    }

    #[must_use]
    pub fn from_profile(profile: DetectionProfile) -> Self {
        Self::with_orchestrator(DetectionOrchestrator::from_profile(profile))
    }

    #[must_use]
    pub const fn with_orchestrator(orchestrator: DetectionOrchestrator) -> Self {
        Self {
            orchestrator,
            evaluator: QualityEvaluator::new(),
        }
    }

    #[must_use]
    pub const fn orchestrator(&self) -> &DetectionOrchestrator {
        &self.orchestrator
    }

    #[must_use]
    pub fn analyze(&self, text: &str, target: TargetModel) -> AnalysisResult {
        let sections = self.orchestrator.detect(text);
        let quality = self.evaluator.evaluate(&sections);
        let issues = self.evaluator.identify_issues(&sections);
        let missing_sections = self.evaluator.identify_missing_sections(&sections);
        let suggestions = self.evaluator.generate_suggestions(&sections);
        let optimization_prompt =
            optimization_prompt(&sections, &quality, &missing_sections, target);

        info!(
            target_model = %target,
            overall = quality.overall_score,
            detected = sections.present_count(),
            "analysis complete"
        );

        AnalysisResult {
            sections,
            quality,
            issues,
            missing_sections,
            suggestions,
            optimization_prompt,
        }
    }

    /// Role, rule markers, example markers and task, each pass/fail.
    /// Rule and example checks only apply when those sections exist.
    #[must_use]
    pub fn check_conventions(&self, text: &str) -> ConventionSummary {
        let sections = self.orchestrator.detect(text);
        let mut passed = Vec::new();
        let mut failed = Vec::new();
        let mut record = |ok: bool, pass: &str, fail: &str| {
            if ok {
                passed.push(pass.to_string());
            } else {
                failed.push(fail.to_string());
            }
        };

        record(
            sections.has(SectionKind::Introduction),
            "Has clear role definition",
            "Missing role definition",
        );
        if !sections.rules.is_empty() {
            let marked = sections.rules.iter().any(|rule| {
                let lower = rule.to_lowercase();
                lower.starts_with("rule:") || lower.contains("must") || lower.contains("should")
            });
            record(
                marked,
                "Rules use standard markers",
                "Rules could use standard markers (Rule:, Must, etc.)",
            );
        }
        if !sections.examples.is_empty() {
            let marked = sections.examples.iter().any(|example| {
                let lower = example.content.to_lowercase();
                ["example:", "input:", "<example>"]
                    .iter()
                    .any(|marker| lower.contains(marker))
            });
            record(
                marked,
                "Examples are clearly marked",
                "Examples could be marked more clearly",
            );
        }
        record(
            sections.has(SectionKind::Task),
            "Has clear task instruction",
            "Missing clear task instruction",
        );

        let total = passed.len() + failed.len();
        #[allow(clippy::cast_precision_loss)]
        let score = passed.len() as f64 / total as f64;
        ConventionSummary {
            score,
            passed_checks: passed,
            failed_checks: failed,
        }
    }
}

fn missing_section_hint(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::Introduction => "Add a role definition (e.g., \"You are a professional...\")",
        SectionKind::Rules => "Add clear rules and constraints",
        SectionKind::Context => "Add background context if relevant to the task",
        SectionKind::Examples => "Add 1-2 examples showing expected input/output",
        SectionKind::OutputFormat => "Specify the desired output format",
        SectionKind::Task => "Add a clear task instruction at the end",
    }
}

/// Brief an agent can follow to improve the prompt.
#[must_use]
pub fn optimization_prompt(
    sections: &DetectedSections,
    quality: &QualityMetrics,
    missing: &[SectionKind],
    target: TargetModel,
) -> String {
    let mut out = format!("To improve this prompt for {target}:\n\n");

    match target {
        TargetModel::Claude => {
            out.push_str("Claude-specific recommendations:\n");
            out.push_str("- Use XML tags for better structure (<introduction>, <rules>, <examples>)\n");
            out.push_str("- Include thinking tags <thinking> for complex reasoning tasks\n");
            out.push_str("- Provide clear examples with input/output pairs\n\n");
        }
        TargetModel::Gpt => {
            out.push_str("GPT-specific recommendations:\n");
            out.push_str("- Use Markdown formatting with clear headers (# Role, ## Rules, etc.)\n");
            out.push_str("- Separate system prompt from user prompt where applicable\n");
            out.push_str("- Use numbered lists for rules and steps\n\n");
        }
        TargetModel::Generic => {}
    }

    if !missing.is_empty() {
        out.push_str("Missing sections to add:\n");
        for kind in missing {
            let _ = writeln!(out, "- {}", missing_section_hint(*kind));
        }
        out.push('\n');
    }

    if quality.clarity_score < 0.7 {
        out.push_str("- Improve clarity by using standard markers (Rule:, Example:, etc.)\n");
    }
    if quality.structure_score < 0.7 {
        out.push_str("- Improve structure by organizing content in a logical order\n");
    }
    if (1..3).contains(&sections.rules.len()) {
        out.push_str("- Consider adding more specific rules for better guidance\n");
    }
    if sections.examples.is_empty() {
        out.push_str("- Add examples to illustrate expected behavior and improve model performance\n");
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSLATOR: &str = "You are a translator. Rules: Keep formatting. Task: Translate this text.";

    #[test]
    fn test_translator_scenario() {
        let result = ContentAnalyzer::default().analyze(TRANSLATOR, TargetModel::Generic);
        let intro = result.sections.introduction.as_deref().unwrap();
        assert!(intro.starts_with("You are a translator"));
        assert!(result.sections.rules.iter().any(|r| r.contains("Keep formatting")));
        assert!(result.sections.task.as_deref().unwrap().contains("Translate this text"));
        assert!(result.quality.overall_score > 0.4);
    }

    #[test]
    fn test_unmarked_imperative_scenario() {
        let result = ContentAnalyzer::default().analyze("翻译这段话", TargetModel::Generic);
        assert_eq!(result.sections, DetectedSections::default());
        assert_eq!(result.missing_sections.len(), 6);
        assert!(result.quality.overall_score < 0.2);
    }

    #[test]
    fn test_optimization_prompt_for_claude() {
        let result = ContentAnalyzer::default().analyze(TRANSLATOR, TargetModel::Claude);
        let brief = &result.optimization_prompt;
        assert!(brief.starts_with("To improve this prompt for claude:"));
        assert!(brief.contains("Claude-specific recommendations:"));
        assert!(brief.contains("- Add background context if relevant to the task"));
        assert!(brief.contains("- Consider adding more specific rules"));
        assert!(brief.ends_with("improve model performance"));
        assert!(!brief.contains("Add a clear task instruction"));
    }

    #[test]
    fn test_optimization_prompt_for_gpt_lists_markdown_advice() {
        let brief = ContentAnalyzer::default().analyze("hello", TargetModel::Gpt).optimization_prompt;
        assert!(brief.contains("GPT-specific recommendations:"));
        assert!(brief.contains("Missing sections to add:"));
        assert!(brief.contains("- Improve clarity"));
    }

    #[test]
    fn test_check_conventions() {
        let summary = ContentAnalyzer::default().check_conventions(TRANSLATOR);
        assert_eq!(summary.passed_checks, vec!["Has clear role definition", "Has clear task instruction"]);
        assert_eq!(
            summary.failed_checks,
            vec!["Rules could use standard markers (Rule:, Must, etc.)"]
        );
        assert!((summary.score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_model_parse() {
        assert_eq!("GPT".parse::<TargetModel>().unwrap(), TargetModel::Gpt);
        assert!("llama".parse::<TargetModel>().is_err());
    }

    #[test]
    fn test_analysis_serializes_camel_case() {
        let result = ContentAnalyzer::default().analyze(TRANSLATOR, TargetModel::Generic);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["quality"]["overallScore"].as_f64().unwrap() > 0.4);
        assert!(json["missingSections"].as_array().unwrap().contains(&"outputFormat".into()));
        assert!(json["optimizationPrompt"].is_string());
    }
}
