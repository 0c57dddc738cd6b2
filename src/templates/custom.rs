//! User-supplied templates.

use serde::{Deserialize, Serialize};

use super::builtin::{Fragments, Template};
use crate::error::{PromptError, Result};

const CONTENT: &str = "{{content}}";
const RULES: &str = "{{rules}}";
const EXAMPLES: &str = "{{examples}}";

/// Fragments a caller can provide. Anything omitted falls back to a bare
/// `{{content}}` line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomTemplate {
    pub introduction: Option<String>,
    /// Wrapper around the rendered rules; must contain `{{rules}}`
    pub rules_section: Option<String>,
    pub rule_item: Option<String>,
    pub context_section: Option<String>,
    /// Wrapper around the rendered examples; must contain `{{examples}}`
    pub examples_section: Option<String>,
    pub example_item: Option<String>,
    pub output_section: Option<String>,
    pub task_section: Option<String>,
}

impl CustomTemplate {
    /// A plain-text starting point for users writing their own template.
    #[must_use]
    pub fn starter() -> Self {
        Self {
            introduction: Some("{{content}}\n\n".into()),
            rules_section: Some("{{rules}}\n".into()),
            rule_item: Some("- {{content}}\n".into()),
            context_section: Some("{{content}}\n\n".into()),
            examples_section: Some("{{examples}}\n".into()),
            example_item: Some("{{content}}\n".into()),
            output_section: Some("{{content}}\n\n".into()),
            task_section: Some("{{content}}\n".into()),
        }
    }

    /// Every problem with the provided fragments, in field order.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let content_fields = [
            ("introduction", &self.introduction),
            ("rule_item", &self.rule_item),
            ("context_section", &self.context_section),
            ("example_item", &self.example_item),
            ("output_section", &self.output_section),
            ("task_section", &self.task_section),
        ];

        let mut problems: Vec<String> = content_fields
            .iter()
            .filter(|(_, value)| value.as_deref().is_some_and(|v| !v.contains(CONTENT)))
            .map(|(field, _)| format!("{field} must include {CONTENT} placeholder"))
            .collect();

        if self.rules_section.as_deref().is_some_and(|v| !v.contains(RULES)) {
            problems.push(format!("rules_section must include {RULES} placeholder"));
        }
        if self.examples_section.as_deref().is_some_and(|v| !v.contains(EXAMPLES)) {
            problems.push(format!("examples_section must include {EXAMPLES} placeholder"));
        }
        problems
    }

    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(PromptError::InvalidTemplate(problems.join(", ")))
        }
    }

    /// Validate and convert into a renderable template.
    pub fn to_template(&self, name: impl Into<String>) -> Result<Template> {
        self.validate()?;

        let item = |value: &Option<String>| value.clone().unwrap_or_else(|| format!("{CONTENT}\n"));
        let (rules_start, rules_end) = split_wrapper(self.rules_section.as_deref(), RULES);
        let (examples_start, examples_end) = split_wrapper(self.examples_section.as_deref(), EXAMPLES);

        Ok(Template::text(
            name,
            "User-defined custom template",
            Fragments {
                introduction: item(&self.introduction),
                rules_start,
                rules_end,
                rule_item: item(&self.rule_item),
                context_section: item(&self.context_section),
                examples_start,
                examples_end,
                example_item: item(&self.example_item),
                output_section: item(&self.output_section),
                task_section: item(&self.task_section),
            },
        ))
    }
}

fn split_wrapper(wrapper: Option<&str>, marker: &str) -> (String, String) {
    wrapper
        .and_then(|w| w.split_once(marker))
        .map(|(start, end)| (start.to_string(), end.to_string()))
        .unwrap_or_default()
}
