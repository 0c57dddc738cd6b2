//! Validation configuration.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::diagnostic::Severity;

/// Share of checks that must pass for a prompt to be valid.
pub const DEFAULT_PASS_THRESHOLD: f64 = 0.6;

/// Configuration for convention validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Rules to disable by ID
    pub disabled_rules: HashSet<String>,

    /// Severity overrides by rule ID
    pub severity_overrides: HashMap<String, Severity>,

    /// Treat warnings as errors; any error makes the result invalid
    pub strict: bool,

    /// Minimum compliance score for `is_valid`
    pub pass_threshold: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            disabled_rules: HashSet::new(),
            severity_overrides: HashMap::new(),
            strict: false,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        }
    }
}

impl ValidationConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    #[must_use]
    pub const fn with_pass_threshold(mut self, threshold: f64) -> Self {
        self.pass_threshold = threshold;
        self
    }

    #[must_use]
    pub fn disable_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.disabled_rules.insert(rule_id.into());
        self
    }

    #[must_use]
    pub fn override_severity(mut self, rule_id: impl Into<String>, severity: Severity) -> Self {
        self.severity_overrides.insert(rule_id.into(), severity);
        self
    }

    #[must_use]
    pub fn is_rule_disabled(&self, rule_id: &str) -> bool {
        self.disabled_rules.contains(rule_id)
    }

    /// Severity after overrides and strict mode
    #[must_use]
    pub fn effective_severity(&self, rule_id: &str, default: Severity) -> Severity {
        let severity = self
            .severity_overrides
            .get(rule_id)
            .copied()
            .unwrap_or(default);

        if self.strict && severity == Severity::Warning {
            Severity::Error
        } else {
            severity
        }
    }
}

/// Context provided to convention rules
pub struct ValidationContext<'a> {
    /// Raw prompt text
    pub text: &'a str,

    /// Lower-cased copy for keyword checks
    pub lower: String,

    pub config: &'a ValidationConfig,
}

impl<'a> ValidationContext<'a> {
    #[must_use]
    pub fn new(text: &'a str, config: &'a ValidationConfig) -> Self {
        Self {
            text,
            lower: text.to_lowercase(),
            config,
        }
    }

    /// Whether the lower-cased text contains any of `needles`.
    #[must_use]
    pub fn contains_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|needle| self.lower.contains(needle))
    }
}
