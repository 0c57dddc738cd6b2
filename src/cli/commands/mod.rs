//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use std::io::Read;
use std::path::PathBuf;

use clap::Args;

pub mod analyze;
pub mod detect;
pub mod format;
pub mod mcp;
pub mod templates;
pub mod validate;

use crate::analyzer::DetectionProfile;
use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::{PromptError, Result};

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Analyze(args) => analyze::run(ctx, args),
        Commands::Detect(args) => detect::run(ctx, args),
        Commands::Format(args) => format::run(ctx, args),
        Commands::Validate(args) => validate::run(ctx, args),
        Commands::Templates(args) => templates::run(ctx, args),
        Commands::Mcp(args) => mcp::run(ctx, args),
    }
}

/// Where the prompt text comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct PromptInput {
    /// Prompt text (reads stdin when neither this nor --file is given)
    #[arg(value_name = "PROMPT")]
    pub prompt: Option<String>,

    /// Read the prompt from a file
    #[arg(long, short = 'f', value_name = "PATH", conflicts_with = "prompt")]
    pub file: Option<PathBuf>,
}

impl PromptInput {
    pub fn read(&self) -> Result<String> {
        if let Some(prompt) = &self.prompt {
            return Ok(prompt.clone());
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path).map_err(|err| {
                PromptError::ValidationFailed(format!("read {}: {err}", path.display()))
            });
        }
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

/// clap value parser for `--profile`.
pub fn parse_profile(value: &str) -> Result<DetectionProfile> {
    value.parse()
}
