//! Validation engine for running convention rules against prompt text.

use serde::Serialize;
use tracing::{debug, info};

use super::config::{ValidationConfig, ValidationContext};
use super::diagnostic::{Diagnostic, RuleCategory, Severity};
use super::rule::{BoxedRule, ValidationCheck};
use super::rules::convention_rules;

const ALL_PASSED_NOTE: &str = "Good! Your prompt follows the recommended conventions";
const FAILED_NOTE: &str =
    "Address the failed checks above, then re-run validation to confirm the prompt follows the conventions";

/// Result of validation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Share of enabled checks that passed (0-1)
    pub compliance_score: f64,
    pub checks: Vec<ValidationCheck>,
    pub recommendations: Vec<String>,
    /// One diagnostic per failed check
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn by_category(&self, category: RuleCategory) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.category == category)
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}

/// Runs registered rules and scores the outcome
pub struct ValidationEngine {
    rules: Vec<BoxedRule>,
    config: ValidationConfig,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ValidationEngine {
    /// Engine with no rules registered
    #[must_use]
    pub const fn new(config: ValidationConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    /// Engine with the built-in convention rules and default config
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::with_config(ValidationConfig::default())
    }

    /// Engine with the built-in convention rules
    #[must_use]
    pub fn with_config(config: ValidationConfig) -> Self {
        let mut engine = Self::new(config);
        for rule in convention_rules() {
            engine.register(rule);
        }
        engine
    }

    pub fn register(&mut self, rule: BoxedRule) {
        self.rules.push(rule);
    }

    #[must_use]
    pub fn with_rule(mut self, rule: BoxedRule) -> Self {
        self.register(rule);
        self
    }

    #[must_use]
    pub fn rules(&self) -> &[BoxedRule] {
        &self.rules
    }

    #[must_use]
    pub const fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate raw prompt text
    #[must_use]
    pub fn validate(&self, text: &str) -> ValidationResult {
        let ctx = ValidationContext::new(text, &self.config);
        self.validate_with_context(&ctx)
    }

    #[must_use]
    pub fn validate_with_context(&self, ctx: &ValidationContext<'_>) -> ValidationResult {
        let mut checks = Vec::new();
        let mut diagnostics = Vec::new();

        for rule in &self.rules {
            if self.config.is_rule_disabled(rule.id()) {
                debug!(rule = rule.id(), "rule disabled");
                continue;
            }

            let check = rule.check(ctx);
            if !check.passed {
                let severity = self
                    .config
                    .effective_severity(rule.id(), rule.default_severity());
                let mut diag = Diagnostic::new(rule.id(), severity, format!("{} failed", check.check))
                    .with_category(rule.category());
                if let Some(suggestion) = &check.suggestion {
                    diag = diag.with_suggestion(suggestion.clone());
                }
                if let Some(span) = &check.span {
                    diag = diag.with_span(span.clone());
                }
                diagnostics.push(diag);
            }
            checks.push(check);
        }

        let passed = checks.iter().filter(|c| c.passed).count();
        #[allow(clippy::cast_precision_loss)]
        let compliance_score = if checks.is_empty() {
            0.0
        } else {
            passed as f64 / checks.len() as f64
        };

        let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
        let is_valid =
            compliance_score >= self.config.pass_threshold && !(self.config.strict && has_errors);

        let mut recommendations: Vec<String> = checks
            .iter()
            .filter(|c| !c.passed)
            .filter_map(|c| c.suggestion.clone())
            .collect();
        recommendations.push(if recommendations.is_empty() {
            ALL_PASSED_NOTE.to_string()
        } else {
            FAILED_NOTE.to_string()
        });

        info!(
            passed,
            total = checks.len(),
            compliance = compliance_score,
            is_valid,
            "validation complete"
        );

        ValidationResult {
            is_valid,
            compliance_score,
            checks,
            recommendations,
            diagnostics,
        }
    }

    /// Registered rules with their effective state
    #[must_use]
    pub fn list_rules(&self) -> Vec<RuleInfo> {
        self.rules
            .iter()
            .map(|r| RuleInfo {
                id: r.id().to_string(),
                name: r.name().to_string(),
                description: r.description().to_string(),
                category: r.category(),
                severity: self.config.effective_severity(r.id(), r.default_severity()),
                disabled: self.config.is_rule_disabled(r.id()),
            })
            .collect()
    }
}

/// Information about a registered rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: RuleCategory,
    pub severity: Severity,
    pub disabled: bool,
}
