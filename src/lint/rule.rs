//! Convention rule trait and the keyword-rule macro.

use serde::{Deserialize, Serialize};

use super::config::ValidationContext;
use super::diagnostic::{RuleCategory, Severity, SourceSpan};

/// Outcome of one convention check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCheck {
    /// Human-readable check label
    pub check: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Where the evidence was found, when it can be pinned down
    #[serde(skip)]
    pub span: Option<SourceSpan>,
}

impl ValidationCheck {
    pub fn pass(check: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            passed: true,
            found: Some(found.into()),
            suggestion: None,
            span: None,
        }
    }

    pub fn fail(check: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            passed: false,
            found: None,
            suggestion: Some(suggestion.into()),
            span: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }
}

/// A lexical check over raw prompt text.
///
/// Rules are stateless; everything they need comes through the context.
pub trait ConventionRule: Send + Sync {
    /// Unique identifier (e.g. "role-definition")
    fn id(&self) -> &str;

    /// Check label reported in results
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn category(&self) -> RuleCategory;

    /// Severity of the diagnostic raised when the check fails
    fn default_severity(&self) -> Severity;

    fn check(&self, ctx: &ValidationContext<'_>) -> ValidationCheck;
}

/// A boxed convention rule for dynamic dispatch
pub type BoxedRule = Box<dyn ConventionRule>;

/// Declares a rule that passes when the lower-cased text contains any of
/// the given markers.
#[macro_export]
macro_rules! keyword_rule {
    (
        $struct_name:ident,
        id: $id:expr,
        name: $name:expr,
        description: $desc:expr,
        category: $cat:expr,
        severity: $sev:expr,
        markers: $markers:expr,
        found: $found:expr,
        suggestion: $suggestion:expr
    ) => {
        pub struct $struct_name;

        impl $crate::lint::rule::ConventionRule for $struct_name {
            fn id(&self) -> &str {
                $id
            }

            fn name(&self) -> &str {
                $name
            }

            fn description(&self) -> &str {
                $desc
            }

            fn category(&self) -> $crate::lint::diagnostic::RuleCategory {
                $cat
            }

            fn default_severity(&self) -> $crate::lint::diagnostic::Severity {
                $sev
            }

            fn check(
                &self,
                ctx: &$crate::lint::config::ValidationContext<'_>,
            ) -> $crate::lint::rule::ValidationCheck {
                if ctx.contains_any($markers) {
                    $crate::lint::rule::ValidationCheck::pass($name, $found)
                } else {
                    $crate::lint::rule::ValidationCheck::fail($name, $suggestion)
                }
            }
        }
    };
}

pub use keyword_rule;
