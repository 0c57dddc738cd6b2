//! promptfmt validate - Check a prompt against the writing conventions

use clap::Args;
use console::style;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::commands::PromptInput;
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_structured, percent};
use crate::error::{PromptError, Result};
use crate::lint::{Diagnostic, RuleCategory, Severity, ValidationEngine, ValidationResult};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: PromptInput,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,

    /// Compliance score required to pass (0-1)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Skip specific rules (comma-separated IDs)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// List all available rules
    #[arg(long)]
    pub list_rules: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateOutput<'a> {
    #[serde(flatten)]
    result: &'a ValidationResult,
    diagnostics: &'a [Diagnostic],
}

pub fn run(ctx: &AppContext, args: &ValidateArgs) -> Result<()> {
    let engine = build_engine(ctx, args)?;

    if args.list_rules {
        return list_rules(ctx, &engine);
    }

    let prompt = args.input.read()?;
    let result = engine.validate(&prompt);

    if ctx.output_format == OutputFormat::Human {
        emit_human(render_human(&result));
    } else {
        let output = ValidateOutput {
            result: &result,
            diagnostics: &result.diagnostics,
        };
        emit_structured(ctx, &output, Vec::new())?;
    }

    if result.is_valid {
        Ok(())
    } else {
        Err(PromptError::ValidationFailed(format!(
            "compliance {} with {} error(s)",
            percent(result.compliance_score),
            result.error_count()
        )))
    }
}

fn build_engine(ctx: &AppContext, args: &ValidateArgs) -> Result<ValidationEngine> {
    let mut config = ctx.config.validation.validation_config();
    if args.strict {
        config = config.strict();
    }
    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PromptError::ValidationFailed(format!(
                "--threshold must be between 0 and 1, got {threshold}"
            )));
        }
        config = config.with_pass_threshold(threshold);
    }
    for rule_id in &args.skip {
        config = config.disable_rule(rule_id);
    }
    Ok(ValidationEngine::with_config(config))
}

fn list_rules(ctx: &AppContext, engine: &ValidationEngine) -> Result<()> {
    let rules = engine.list_rules();

    if ctx.output_format != OutputFormat::Human {
        return emit_structured(ctx, &rules, Vec::new());
    }

    let mut layout = HumanLayout::new();
    layout.title("Convention Rules");

    let categories = [
        (RuleCategory::Structure, "Structure"),
        (RuleCategory::Markers, "Markers"),
        (RuleCategory::Layout, "Layout"),
    ];
    for (category, name) in categories {
        let in_category: Vec<_> = rules.iter().filter(|r| r.category == category).collect();
        if in_category.is_empty() {
            continue;
        }
        layout.section(name);
        for rule in in_category {
            let disabled = if rule.disabled { " [disabled]" } else { "" };
            layout.bullet(&format!("{} - {} ({}){disabled}", rule.id, rule.name, rule.severity));
        }
    }

    emit_human(layout);
    Ok(())
}

fn render_human(result: &ValidationResult) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.title("Convention Check");

    for check in &result.checks {
        if check.passed {
            layout.push_line(format!("{} {}", style("✓").green(), check.check));
        } else {
            layout.push_line(format!("{} {}", style("✗").red(), style(&check.check).bold()));
        }
    }

    layout.blank();
    layout.kv("Compliance", &percent(result.compliance_score));
    let status = if result.is_valid {
        style("valid").green().to_string()
    } else {
        style("invalid").red().bold().to_string()
    };
    layout.kv("Status", &status);

    if !result.diagnostics.is_empty() {
        layout.section("Diagnostics");
        for diag in &result.diagnostics {
            let severity = match diag.severity {
                Severity::Error => style("error").red().bold(),
                Severity::Warning => style("warning").yellow(),
                Severity::Info => style("info").blue(),
            };
            let location = diag
                .span
                .as_ref()
                .map(|span| format!(" at {span}"))
                .unwrap_or_default();
            layout.bullet(&format!("{severity}[{}]{location}: {}", diag.rule_id, diag.message));
        }
    }

    layout.section("Recommendations");
    for recommendation in &result.recommendations {
        layout.bullet(recommendation);
    }
    layout
}
