//! promptfmt analyze - Score a prompt and explain how to improve it

use clap::Args;
use console::style;

use crate::analyzer::{AnalysisResult, DetectionProfile, IssueSeverity, TargetModel};
use crate::app::AppContext;
use crate::cli::commands::{PromptInput, parse_profile};
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_structured, percent};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: PromptInput,

    /// Model family for the optimisation brief (claude, gpt, generic)
    #[arg(long, short = 'm', default_value = "generic")]
    pub target_model: String,

    /// Detection profile (standard, enhanced)
    #[arg(long, value_parser = parse_profile)]
    pub profile: Option<DetectionProfile>,

    /// Also print the optimisation brief
    #[arg(long)]
    pub brief: bool,
}

pub fn run(ctx: &AppContext, args: &AnalyzeArgs) -> Result<()> {
    let target: TargetModel = args.target_model.parse()?;
    let prompt = args.input.read()?;
    let result = ctx.analyzer(args.profile)?.analyze(&prompt, target);

    if ctx.output_format != OutputFormat::Human {
        return emit_structured(ctx, &result, Vec::new());
    }

    emit_human(render_human(&result, args.brief));
    Ok(())
}

fn render_human(result: &AnalysisResult, brief: bool) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.title("Prompt Analysis");

    let quality = &result.quality;
    layout.kv("Overall", &percent(quality.overall_score));
    layout.kv("Clarity", &percent(quality.clarity_score));
    layout.kv("Completeness", &percent(quality.completeness_score));
    layout.kv("Structure", &percent(quality.structure_score));

    let present = result.sections.present();
    layout.kv(
        "Sections",
        &if present.is_empty() {
            "none".to_string()
        } else {
            present.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        },
    );

    if !result.issues.is_empty() {
        layout.section("Issues");
        for issue in &result.issues {
            let label = match issue.severity {
                IssueSeverity::High => style("high").red().bold(),
                IssueSeverity::Medium => style("medium").yellow(),
                IssueSeverity::Low => style("low").dim(),
            };
            layout.bullet(&format!("[{label}] {}", issue.description));
        }
    }

    if !result.suggestions.is_empty() {
        layout.section("Suggestions");
        for suggestion in &result.suggestions {
            layout.bullet(suggestion);
        }
    }

    if brief {
        layout.section("Optimisation Brief");
        for line in result.optimization_prompt.lines() {
            layout.push_line(line);
        }
    }

    layout
}
