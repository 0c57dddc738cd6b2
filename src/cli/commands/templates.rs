//! promptfmt templates - List and inspect templates

use clap::Args;
use serde::Serialize;

use crate::analyzer::{DetectedSections, Example};
use crate::app::AppContext;
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_structured};
use crate::error::{PromptError, Result};
use crate::templates::{
    CustomTemplate, Fragments, RenderOptions, Template, TemplateEngine, render_with,
};

#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Show one template's fragments and a sample rendering
    #[arg(long, value_name = "NAME", conflicts_with = "starter")]
    pub show: Option<String>,

    /// Print a starter custom template (TOML)
    #[arg(long)]
    pub starter: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateDetail<'a> {
    #[serde(flatten)]
    template: &'a Template,
    fragments: &'a Fragments,
    sample: String,
}

pub fn run(ctx: &AppContext, args: &TemplatesArgs) -> Result<()> {
    let engine = TemplateEngine::new();

    if args.starter {
        return print_starter(ctx);
    }
    if let Some(name) = &args.show {
        return show_template(ctx, &engine, name);
    }

    let templates = engine.list();
    if ctx.output_format != OutputFormat::Human {
        return emit_structured(ctx, &templates, Vec::new());
    }

    let mut layout = HumanLayout::new();
    layout.title("Templates");
    for template in templates {
        let marker = if template.name == ctx.config.format.default_template {
            " (default)"
        } else {
            ""
        };
        layout.kv(&template.name, &format!("{}{marker}", template.description));
    }
    emit_human(layout);
    Ok(())
}

fn show_template(ctx: &AppContext, engine: &TemplateEngine, name: &str) -> Result<()> {
    let template = engine
        .get(name)
        .ok_or_else(|| PromptError::TemplateNotFound(name.to_string()))?;
    let sample = render_with(template, &sample_sections(), &RenderOptions::default())?;

    if ctx.output_format != OutputFormat::Human {
        let detail = TemplateDetail {
            template,
            fragments: &template.fragments,
            sample,
        };
        return emit_structured(ctx, &detail, Vec::new());
    }

    let mut layout = HumanLayout::new();
    layout.title(&format!("Template: {}", template.name));
    layout.kv("Description", &template.description);
    layout.kv("Style", &format!("{:?}", template.style).to_lowercase());
    layout.section("Sample");
    for line in sample.lines() {
        layout.push_line(line);
    }
    emit_human(layout);
    Ok(())
}

fn print_starter(ctx: &AppContext) -> Result<()> {
    let starter = CustomTemplate::starter();
    if ctx.output_format != OutputFormat::Human {
        return emit_structured(ctx, &starter, Vec::new());
    }
    let raw = toml::to_string_pretty(&starter)
        .map_err(|err| PromptError::InvalidTemplate(format!("serialize starter: {err}")))?;
    print!("{raw}");
    Ok(())
}

/// Sections used for sample renderings.
fn sample_sections() -> DetectedSections {
    DetectedSections {
        introduction: Some("You are a meticulous technical editor.".into()),
        rules: vec![
            "Keep the author's voice".into(),
            "Never invent facts".into(),
        ],
        examples: vec![Example {
            content: "Input: teh cat\nOutput: the cat".into(),
            input: Some("teh cat".into()),
            output: Some("the cat".into()),
        }],
        output_format: Some("Return the corrected text only.".into()),
        task: Some("Edit the following paragraph.".into()),
        ..DetectedSections::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_renders_the_sample() {
        let engine = TemplateEngine::new();
        for template in engine.list() {
            let sample = render_with(template, &sample_sections(), &RenderOptions::default()).unwrap();
            assert!(sample.contains("Never invent facts"), "{}", template.name);
        }
    }

    #[test]
    fn test_detail_serializes_fragments() {
        let engine = TemplateEngine::new();
        let template = engine.get("gpt_markdown").unwrap();
        let detail = TemplateDetail {
            template,
            fragments: &template.fragments,
            sample: String::new(),
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "gpt_markdown");
        assert_eq!(json["fragments"]["ruleItem"], "- {{content}}\n");
    }

    #[test]
    fn test_starter_round_trips_through_toml() {
        let raw = toml::to_string_pretty(&CustomTemplate::starter()).unwrap();
        let parsed: CustomTemplate = toml::from_str(&raw).unwrap();
        assert_eq!(parsed, CustomTemplate::starter());
    }
}
