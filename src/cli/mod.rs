//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;

pub use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "promptfmt", version, about = "Detect, score and reformat prompt sections")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file layered over the global and project config
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// JSON envelopes on stdout and JSON logs on stderr
    #[arg(long, global = true)]
    pub robot: bool,

    /// Output format
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

impl Cli {
    /// Robot mode always implies JSON.
    #[must_use]
    pub const fn output_format(&self) -> OutputFormat {
        if self.robot {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a prompt and list its issues
    Analyze(commands::analyze::AnalyzeArgs),

    /// Show the sections detected in a prompt
    Detect(commands::detect::DetectArgs),

    /// Rewrite a prompt into a structured template
    #[command(name = "format")]
    Format(commands::format::FormatArgs),

    /// Check a prompt against the writing conventions
    Validate(commands::validate::ValidateArgs),

    /// List and inspect templates
    Templates(commands::templates::TemplatesArgs),

    /// MCP server over stdio
    Mcp(commands::mcp::McpArgs),
}
