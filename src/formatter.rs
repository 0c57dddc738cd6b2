//! Turning a raw prompt into a structured one.
//!
//! Formatting is analysis followed by rendering: sections are detected with
//! the configured profile, then rendered through a built-in or caller-supplied
//! template. The result carries a confidence score and warnings for every
//! section that could not be found.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analyzer::{ContentAnalyzer, DetectedSections, DetectionConfig, DetectionProfile, TargetModel};
use crate::error::{PromptError, Result};
use crate::templates::{
    CUSTOM_TEMPLATE_NAME, CustomTemplate, DEFAULT_TEMPLATE, RenderOptions, TemplateEngine,
    render_with,
};

/// Target name that selects the caller-supplied custom template.
pub const CUSTOM_TARGET: &str = "custom";

/// Overall quality below this adds a warning.
const LOW_QUALITY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatOptions {
    pub preserve_whitespace: bool,
    /// Fail when the task section cannot be detected
    pub strict_mode: bool,
    pub include_metadata: bool,
}

/// Which sections made it into the formatted prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub introduction: bool,
    pub rules: usize,
    pub examples: usize,
    pub output_format: bool,
    pub task: bool,
}

impl From<&DetectedSections> for SectionSummary {
    fn from(sections: &DetectedSections) -> Self {
        Self {
            introduction: sections.introduction.is_some(),
            rules: sections.rules.len(),
            examples: sections.examples.len(),
            output_format: sections.output_format.is_some(),
            task: sections.task.is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatMetadata {
    /// Length in characters
    pub original_length: usize,
    /// Length in characters
    pub formatted_length: usize,
    pub sections_detected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatResult {
    pub formatted_prompt: String,
    pub detected_sections: SectionSummary,
    pub confidence_score: f64,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FormatMetadata>,
}

/// Score in [0, 1] reflecting how much of the prompt was recognised.
#[must_use]
pub fn confidence_score(sections: &DetectedSections) -> f64 {
    let mut score = 0.0;
    if sections.introduction.is_some() {
        score += 0.2;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        score += (0.05 * sections.rules.len() as f64).min(0.2);
        score += (0.1 * sections.examples.len() as f64).min(0.2);
    }
    if sections.output_format.is_some() {
        score += 0.2;
    }
    if sections.task.is_some() {
        score += 0.2;
    }
    score
}

fn format_warnings(sections: &DetectedSections, overall: f64) -> Vec<String> {
    let checks = [
        (sections.introduction.is_none(), "No introduction/role definition detected"),
        (sections.rules.is_empty(), "No rules detected - consider adding guidelines"),
        (
            sections.examples.is_empty(),
            "No examples detected - adding examples can improve model performance",
        ),
        (sections.output_format.is_none(), "No output format specification detected"),
        (sections.task.is_none(), "No clear task instruction detected"),
        (
            overall < LOW_QUALITY_THRESHOLD,
            "Overall prompt quality is low - consider reviewing and improving",
        ),
    ];
    checks
        .iter()
        .filter(|(missing, _)| *missing)
        .map(|(_, warning)| (*warning).to_string())
        .collect()
}

/// Analysis plus template rendering.
#[derive(Debug)]
pub struct PromptFormatter {
    analyzer: ContentAnalyzer,
    templates: TemplateEngine,
    default_template: String,
}

impl Default for PromptFormatter {
    fn default() -> Self {
        Self::with_parts(ContentAnalyzer::default(), TemplateEngine::new())
    }
}

impl PromptFormatter {
    #[must_use]
    pub fn new(config: DetectionConfig) -> Self {
        Self::with_parts(ContentAnalyzer::new(config), TemplateEngine::new())
    }

    #[must_use]
    pub fn from_profile(profile: DetectionProfile) -> Self {
        Self::with_parts(ContentAnalyzer::from_profile(profile), TemplateEngine::new())
    }

    #[must_use]
    pub fn with_parts(analyzer: ContentAnalyzer, templates: TemplateEngine) -> Self {
        Self {
            analyzer,
            templates,
            default_template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Template used when `format` is called without a target.
    #[must_use]
    pub fn with_default_template(mut self, name: impl Into<String>) -> Self {
        self.default_template = name.into();
        self
    }

    #[must_use]
    pub const fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    #[must_use]
    pub fn default_template(&self) -> &str {
        &self.default_template
    }

    /// Format `prompt` into the `target` template.
    ///
    /// `target` is any registered template name, or `"custom"` together with
    /// a `custom` definition. A custom definition is validated and rendered
    /// under the name `user_custom`; it is ignored for every other target.
    ///
    /// # Errors
    ///
    /// - [`PromptError::MissingSections`] in strict mode when no task is found
    /// - [`PromptError::InvalidTemplate`] when the custom definition is invalid
    /// - [`PromptError::TemplateNotFound`] for an unknown target
    pub fn format(
        &self,
        prompt: &str,
        target: Option<&str>,
        custom: Option<&CustomTemplate>,
        options: &FormatOptions,
    ) -> Result<FormatResult> {
        let target = target.unwrap_or(&self.default_template);
        info!(target, "formatting prompt");

        let analysis = self.analyzer.analyze(prompt, TargetModel::Generic);
        let sections = &analysis.sections;

        if options.strict_mode && sections.task.is_none() {
            warn!("strict mode: no task detected");
            return Err(PromptError::MissingSections("task".to_string()));
        }

        let render_options = RenderOptions {
            preserve_whitespace: options.preserve_whitespace,
            ..RenderOptions::default()
        };
        let formatted_prompt = match (target, custom) {
            (CUSTOM_TARGET, Some(custom)) => {
                let template = custom.to_template(CUSTOM_TEMPLATE_NAME)?;
                debug!(template = CUSTOM_TEMPLATE_NAME, "using custom template");
                render_with(&template, sections, &render_options)?
            }
            (name, _) => self.templates.render(name, sections, &render_options)?,
        };

        let confidence_score = confidence_score(sections);
        let warnings = format_warnings(sections, analysis.quality.overall_score);
        let metadata = options.include_metadata.then(|| FormatMetadata {
            original_length: prompt.chars().count(),
            formatted_length: formatted_prompt.chars().count(),
            sections_detected: sections.present_count(),
        });

        info!(
            confidence = confidence_score,
            warnings = warnings.len(),
            "formatting complete"
        );

        Ok(FormatResult {
            formatted_prompt,
            detected_sections: SectionSummary::from(sections),
            confidence_score,
            warnings,
            metadata,
        })
    }
}
