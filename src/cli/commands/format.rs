//! promptfmt format - Rewrite a prompt into a structured template

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;

use crate::analyzer::DetectionProfile;
use crate::app::AppContext;
use crate::cli::commands::{PromptInput, parse_profile};
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_structured, percent};
use crate::error::{PromptError, Result};
use crate::formatter::{CUSTOM_TARGET, FormatResult};
use crate::templates::CustomTemplate;

#[derive(Args, Debug)]
pub struct FormatArgs {
    #[command(flatten)]
    pub input: PromptInput,

    /// Template name (defaults to format.default_template)
    #[arg(long, short = 't')]
    pub template: Option<String>,

    /// Custom template definition (TOML or JSON); implies --template custom
    #[arg(long, value_name = "PATH", conflicts_with = "template")]
    pub custom: Option<PathBuf>,

    /// Keep section whitespace exactly as detected
    #[arg(long)]
    pub preserve_whitespace: bool,

    /// Fail when no task section is detected
    #[arg(long)]
    pub strict: bool,

    /// Include length and section-count metadata
    #[arg(long)]
    pub metadata: bool,

    /// Detection profile (standard, enhanced)
    #[arg(long, value_parser = parse_profile)]
    pub profile: Option<DetectionProfile>,

    /// Print only the formatted prompt
    #[arg(long)]
    pub raw: bool,
}

pub fn run(ctx: &AppContext, args: &FormatArgs) -> Result<()> {
    let prompt = args.input.read()?;
    let custom = args.custom.as_deref().map(load_custom_template).transpose()?;
    let target = if custom.is_some() {
        Some(CUSTOM_TARGET)
    } else {
        args.template.as_deref()
    };

    let mut options = ctx.format_options();
    options.preserve_whitespace |= args.preserve_whitespace;
    options.strict_mode = args.strict;
    options.include_metadata |= args.metadata;

    let result = ctx
        .formatter(args.profile)?
        .format(&prompt, target, custom.as_ref(), &options)?;

    if ctx.output_format != OutputFormat::Human {
        let warnings = result.warnings.clone();
        return emit_structured(ctx, &result, warnings);
    }

    if args.raw {
        println!("{}", result.formatted_prompt);
        return Ok(());
    }

    emit_human(render_human(&result));
    Ok(())
}

/// Read a custom template, choosing the parser by file extension.
pub fn load_custom_template(path: &Path) -> Result<CustomTemplate> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        PromptError::ValidationFailed(format!("read template {}: {err}", path.display()))
    })?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let custom = if is_json {
        serde_json::from_str(&raw).map_err(|err| {
            PromptError::InvalidTemplate(format!("parse {}: {err}", path.display()))
        })?
    } else {
        toml::from_str(&raw).map_err(|err| {
            PromptError::InvalidTemplate(format!("parse {}: {err}", path.display()))
        })?
    };
    Ok(custom)
}

fn render_human(result: &FormatResult) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.push_line(result.formatted_prompt.trim_end());
    layout.section("Summary");
    layout.kv("Confidence", &percent(result.confidence_score));

    let detected = &result.detected_sections;
    layout.kv("Rules", &detected.rules.to_string());
    layout.kv("Examples", &detected.examples.to_string());
    if let Some(metadata) = &result.metadata {
        layout.kv(
            "Length",
            &format!("{} -> {} chars", metadata.original_length, metadata.formatted_length),
        );
        layout.kv("Sections", &metadata.sections_detected.to_string());
    }

    if !result.warnings.is_empty() {
        layout.section("Warnings");
        for warning in &result.warnings {
            layout.bullet(&style(warning).yellow().to_string());
        }
    }
    layout
}
