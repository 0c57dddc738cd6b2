//! promptfmt detect - Show the sections found in a prompt

use clap::Args;
use serde::Serialize;

use crate::analyzer::{
    DetectedSections, DetectionProfile, DetectionReport, HeuristicSegment, HeuristicSegmenter,
    SectionKind, Segmenter,
};
use crate::app::AppContext;
use crate::cli::commands::{PromptInput, parse_profile};
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_structured};
use crate::error::Result;

const PREVIEW_CHARS: usize = 72;

#[derive(Args, Debug)]
pub struct DetectArgs {
    #[command(flatten)]
    pub input: PromptInput,

    /// Detection profile (standard, enhanced)
    #[arg(long, value_parser = parse_profile)]
    pub profile: Option<DetectionProfile>,

    /// Also run the heuristic segmenter and list its segments
    #[arg(long)]
    pub segments: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectOutput {
    profile: DetectionProfile,
    #[serde(flatten)]
    report: DetectionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    heuristic_segments: Option<Vec<HeuristicSegment>>,
}

pub fn run(ctx: &AppContext, args: &DetectArgs) -> Result<()> {
    let prompt = args.input.read()?;
    let orchestrator = ctx.orchestrator(args.profile)?;
    let report = orchestrator.detect_with_report(&prompt);
    let heuristic_segments = args
        .segments
        .then(|| HeuristicSegmenter::new().segment(&prompt));

    let output = DetectOutput {
        profile: args.profile.unwrap_or(ctx.config.detection.profile),
        report,
        heuristic_segments,
    };

    if ctx.output_format != OutputFormat::Human {
        return emit_structured(ctx, &output, Vec::new());
    }

    emit_human(render_human(&output));
    Ok(())
}

fn render_human(output: &DetectOutput) -> HumanLayout {
    let report = &output.report;
    let mut layout = HumanLayout::new();
    layout.title("Detected Sections");
    layout.kv("Profile", &output.profile.to_string());
    layout.kv("Quality points", &report.quality_points.to_string());
    layout.kv(
        "Heuristics",
        &if report.heuristics_applied {
            format!("applied ({} segments merged)", report.segments_merged)
        } else {
            "not needed".to_string()
        },
    );

    for kind in SectionKind::all() {
        section_lines(&mut layout, &report.sections, *kind);
    }

    if let Some(segments) = &output.heuristic_segments {
        layout.section("Heuristic Segments");
        if segments.is_empty() {
            layout.bullet("none");
        }
        for segment in segments {
            layout.bullet(&format!(
                "lines {}-{} {:?} -> {} ({:.2}): {}",
                segment.start_line,
                segment.end_line,
                segment.segment_type,
                segment.suggested_category,
                segment.confidence,
                segment.preview(PREVIEW_CHARS)
            ));
        }
    }

    layout
}

fn section_lines(layout: &mut HumanLayout, sections: &DetectedSections, kind: SectionKind) {
    match kind {
        SectionKind::Rules => {
            layout.section(&format!("rules ({})", sections.rules.len()));
            for rule in &sections.rules {
                layout.bullet(rule);
            }
        }
        SectionKind::Examples => {
            layout.section(&format!("examples ({})", sections.examples.len()));
            for example in &sections.examples {
                layout.bullet(&example.content);
                if let Some(input) = &example.input {
                    layout.push_line(format!("  input:  {input}"));
                }
                if let Some(output) = &example.output {
                    layout.push_line(format!("  output: {output}"));
                }
            }
        }
        _ => {
            layout.section(kind.as_str());
            match sections.singular(kind) {
                Some(value) => {
                    for line in value.lines() {
                        layout.push_line(line);
                    }
                }
                None => {
                    layout.push_line("(not detected)");
                }
            }
        }
    }
}
