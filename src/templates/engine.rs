//! Template registry and renderer.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::builtin::{RenderStyle, Template, builtin_templates};
use super::custom::CustomTemplate;
use crate::analyzer::{DetectedSections, Example, SectionKind};
use crate::error::{PromptError, Result};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex")
});

static CONDITIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{#if\s+([A-Za-z_][A-Za-z0-9_]*)\s*\}\}(.*?)\{\{/if\}\}")
        .expect("valid regex")
});

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Options for a single render call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Render absent sections with empty content instead of skipping them
    pub include_empty_sections: bool,
    /// Keep section content exactly as detected
    pub preserve_whitespace: bool,
    /// Extra `{{name}}` values available to every fragment
    pub custom_variables: BTreeMap<String, String>,
}

/// Placeholder values for one fragment. Built-ins shadow custom variables.
struct Vars<'a> {
    builtin: Vec<(&'static str, String)>,
    custom: &'a BTreeMap<String, String>,
}

impl<'a> Vars<'a> {
    fn new(custom: &'a BTreeMap<String, String>) -> Self {
        Self {
            builtin: Vec::new(),
            custom,
        }
    }

    fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.builtin.push((name, value.into()));
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.builtin
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
            .or_else(|| self.custom.get(name).map(String::as_str))
    }

    /// Resolve conditionals, then substitute placeholders in one pass so
    /// substituted text is never re-expanded. Unknown placeholders are kept.
    fn expand(&self, fragment: &str) -> String {
        let resolved = CONDITIONAL.replace_all(fragment, |caps: &Captures<'_>| {
            if self.get(&caps[1]).is_some_and(|v| !v.is_empty()) {
                caps[2].to_string()
            } else {
                String::new()
            }
        });
        PLACEHOLDER
            .replace_all(&resolved, |caps: &Captures<'_>| {
                self.get(&caps[1])
                    .map_or_else(|| caps[0].to_string(), ToString::to_string)
            })
            .into_owned()
    }
}

/// Strip trailing whitespace per line and collapse runs of blank lines.
#[must_use]
pub fn normalize_whitespace(content: &str) -> String {
    let trimmed: Vec<&str> = content.lines().map(str::trim_end).collect();
    BLANK_RUN
        .replace_all(trimmed.join("\n").trim(), "\n\n")
        .into_owned()
}

/// Named templates plus the rendering logic
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    templates: BTreeMap<String, Template>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    /// Engine with every built-in template registered
    #[must_use]
    pub fn new() -> Self {
        let mut engine = Self::empty();
        for template in builtin_templates() {
            engine.register(template);
        }
        engine
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// Register a template, replacing any with the same name
    pub fn register(&mut self, template: Template) {
        if self.templates.contains_key(&template.name) {
            debug!(template = %template.name, "replacing template");
        }
        self.templates.insert(template.name.clone(), template);
    }

    /// Validate and register a user template under `name`
    pub fn register_custom(&mut self, name: &str, custom: &CustomTemplate) -> Result<()> {
        let template = custom.to_template(name)?;
        self.register(template);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Registered templates, ordered by name
    #[must_use]
    pub fn list(&self) -> Vec<&Template> {
        self.templates.values().collect()
    }

    pub fn render(
        &self,
        name: &str,
        sections: &DetectedSections,
        options: &RenderOptions,
    ) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| PromptError::TemplateNotFound(name.to_string()))?;
        render_with(template, sections, options)
    }
}

/// Render `sections` with an explicit template
pub fn render_with(
    template: &Template,
    sections: &DetectedSections,
    options: &RenderOptions,
) -> Result<String> {
    let sections = if options.preserve_whitespace {
        sections.clone()
    } else {
        normalized(sections)
    };

    match template.style {
        RenderStyle::Text => Ok(render_text(template, &sections, options)),
        RenderStyle::Json => render_json(&sections, options),
    }
}

fn normalized(sections: &DetectedSections) -> DetectedSections {
    let norm = |value: &Option<String>| value.as_deref().map(normalize_whitespace);
    DetectedSections {
        introduction: norm(&sections.introduction),
        rules: sections.rules.iter().map(|r| normalize_whitespace(r)).collect(),
        context: norm(&sections.context),
        examples: sections
            .examples
            .iter()
            .map(|e| Example {
                content: normalize_whitespace(&e.content),
                input: norm(&e.input),
                output: norm(&e.output),
            })
            .collect(),
        output_format: norm(&sections.output_format),
        task: norm(&sections.task),
        raw_sections: sections.raw_sections.clone(),
    }
}

fn render_text(template: &Template, sections: &DetectedSections, options: &RenderOptions) -> String {
    let fragments = &template.fragments;
    let custom = &options.custom_variables;
    let mut out = String::new();

    for &kind in SectionKind::all() {
        match kind {
            SectionKind::Rules => {
                if sections.rules.is_empty() && !options.include_empty_sections {
                    continue;
                }
                out.push_str(&Vars::new(custom).expand(&fragments.rules_start));
                for (i, rule) in sections.rules.iter().enumerate() {
                    let vars = Vars::new(custom)
                        .with("content", rule.as_str())
                        .with("index", (i + 1).to_string());
                    out.push_str(&vars.expand(&fragments.rule_item));
                }
                out.push_str(&Vars::new(custom).expand(&fragments.rules_end));
            }
            SectionKind::Examples => {
                if sections.examples.is_empty() && !options.include_empty_sections {
                    continue;
                }
                out.push_str(&Vars::new(custom).expand(&fragments.examples_start));
                for (i, example) in sections.examples.iter().enumerate() {
                    let vars = Vars::new(custom)
                        .with("content", example.content.as_str())
                        .with("description", example.content.as_str())
                        .with("input", example.input.clone().unwrap_or_default())
                        .with("output", example.output.clone().unwrap_or_default())
                        .with("index", (i + 1).to_string());
                    out.push_str(&vars.expand(&fragments.example_item));
                }
                out.push_str(&Vars::new(custom).expand(&fragments.examples_end));
            }
            _ => {
                let content = match sections.singular(kind) {
                    Some(content) => content,
                    None if options.include_empty_sections => "",
                    None => continue,
                };
                let vars = Vars::new(custom).with("content", content);
                out.push_str(&vars.expand(fragments.section(kind)));
            }
        }
    }
    out
}

/// Shape of the JSON rendering; field order is the section order.
#[derive(Serialize)]
struct JsonDocument<'a> {
    prompt: JsonPrompt<'a>,
}

#[derive(Serialize)]
struct JsonPrompt<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    introduction: Option<Option<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rules: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<Option<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    examples: Option<&'a [Example]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_format: Option<Option<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<Option<&'a str>>,
}

// Outer None skips the key; Some(None) renders null.
fn json_singular(value: Option<&str>, include_empty: bool) -> Option<Option<&str>> {
    match value {
        Some(v) => Some(Some(v)),
        None if include_empty => Some(None),
        None => None,
    }
}

fn render_json(sections: &DetectedSections, options: &RenderOptions) -> Result<String> {
    let include = options.include_empty_sections;
    let singular = |kind| json_singular(sections.singular(kind), include);
    let list = |present: bool| present || include;

    let doc = JsonDocument {
        prompt: JsonPrompt {
            introduction: singular(SectionKind::Introduction),
            rules: list(!sections.rules.is_empty()).then_some(sections.rules.as_slice()),
            context: singular(SectionKind::Context),
            examples: list(!sections.examples.is_empty()).then_some(sections.examples.as_slice()),
            output_format: singular(SectionKind::OutputFormat),
            task: singular(SectionKind::Task),
        },
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}
