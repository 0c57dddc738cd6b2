//! Built-in templates.

use serde::Serialize;

use crate::analyzer::SectionKind;

/// How a template turns sections into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    /// Concatenated fragments with `{{placeholder}}` expansion
    #[default]
    Text,
    /// A serialised JSON document; fragments are unused
    Json,
}

/// Text fragments, one per rendering slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragments {
    pub introduction: String,
    pub rules_start: String,
    pub rules_end: String,
    pub rule_item: String,
    pub context_section: String,
    pub examples_start: String,
    pub examples_end: String,
    pub example_item: String,
    pub output_section: String,
    pub task_section: String,
}

impl Fragments {
    /// Fragment wrapping a singular section. Empty for rules and examples.
    #[must_use]
    pub fn section(&self, kind: SectionKind) -> &str {
        match kind {
            SectionKind::Introduction => &self.introduction,
            SectionKind::Context => &self.context_section,
            SectionKind::OutputFormat => &self.output_section,
            SectionKind::Task => &self.task_section,
            SectionKind::Rules | SectionKind::Examples => "",
        }
    }
}

/// A named rendering recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub name: String,
    pub description: String,
    pub style: RenderStyle,
    #[serde(skip)]
    pub fragments: Fragments,
}

impl Template {
    pub fn text(name: impl Into<String>, description: impl Into<String>, fragments: Fragments) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            style: RenderStyle::Text,
            fragments,
        }
    }
}

// ===== CLAUDE =====

fn xml_fragments(example_item: &str) -> Fragments {
    Fragments {
        introduction: "<introduction>\n{{content}}\n</introduction>\n".into(),
        rules_start: "<rules>\n".into(),
        rules_end: "</rules>\n".into(),
        rule_item: "  <rule>{{content}}</rule>\n".into(),
        context_section: "<context>\n{{content}}\n</context>\n".into(),
        examples_start: "<examples>\n".into(),
        examples_end: "</examples>\n".into(),
        example_item: example_item.into(),
        output_section: "<output_format>\n{{content}}\n</output_format>\n".into(),
        task_section: "<task>\n{{content}}\n</task>\n".into(),
    }
}

#[must_use]
pub fn claude_xml() -> Template {
    Template::text(
        "claude_xml",
        "XML-structured template optimized for Claude models with semantic tags",
        xml_fragments("  <example>\n{{content}}\n  </example>\n"),
    )
}

#[must_use]
pub fn claude_xml_advanced() -> Template {
    Template::text(
        "claude_xml_advanced",
        "Advanced XML template with input/output breakdown for examples",
        xml_fragments(concat!(
            "  <example>\n",
            "    <description>{{description}}</description>\n",
            "{{#if input}}    <input>{{input}}</input>\n{{/if}}",
            "{{#if output}}    <output>{{output}}</output>\n{{/if}}",
            "  </example>\n",
        )),
    )
}

// ===== GPT =====

fn markdown_fragments(rule_item: &str, example_item: &str) -> Fragments {
    Fragments {
        introduction: "# Role\n\n{{content}}\n\n".into(),
        rules_start: "## Rules\n\n".into(),
        rules_end: "\n".into(),
        rule_item: rule_item.into(),
        context_section: "## Context\n\n{{content}}\n\n".into(),
        examples_start: "## Examples\n\n".into(),
        examples_end: "\n".into(),
        example_item: example_item.into(),
        output_section: "## Output Format\n\n{{content}}\n\n".into(),
        task_section: "## Task\n\n{{content}}\n".into(),
    }
}

#[must_use]
pub fn gpt_markdown() -> Template {
    Template::text(
        "gpt_markdown",
        "Markdown-structured template optimized for GPT models",
        markdown_fragments("- {{content}}\n", "### Example\n\n{{content}}\n\n"),
    )
}

#[must_use]
pub fn gpt_markdown_numbered() -> Template {
    Template::text(
        "gpt_markdown_numbered",
        "Markdown template with numbered rules and examples",
        markdown_fragments("{{index}}. {{content}}\n", "**Example {{index}}:**\n\n{{content}}\n\n"),
    )
}

// ===== JSON =====

#[must_use]
pub fn json() -> Template {
    Template {
        name: "json".into(),
        description: "JSON-structured template for schema-based prompts".into(),
        style: RenderStyle::Json,
        fragments: Fragments::default(),
    }
}

/// Every built-in template.
#[must_use]
pub fn builtin_templates() -> Vec<Template> {
    vec![
        claude_xml(),
        claude_xml_advanced(),
        gpt_markdown(),
        gpt_markdown_numbered(),
        json(),
    ]
}
