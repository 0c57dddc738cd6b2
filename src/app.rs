use std::path::PathBuf;

use crate::analyzer::{ContentAnalyzer, DetectionConfig, DetectionOrchestrator, DetectionProfile};
use crate::cli::{Cli, OutputFormat};
use crate::config::{Config, DetectionSettings, PROJECT_CONFIG_FILE};
use crate::error::Result;
use crate::formatter::{FormatOptions, PromptFormatter};
use crate::lint::ValidationEngine;
use crate::templates::TemplateEngine;

pub struct AppContext {
    pub project_root: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
    /// Deprecated: use output_format instead
    pub robot_mode: bool,
    pub output_format: OutputFormat,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_root = std::env::current_dir()?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| project_root.join(PROJECT_CONFIG_FILE));
        let config = Config::load(cli.config.as_deref(), &project_root)?;

        Ok(Self::new(config, project_root, config_path)
            .with_output(cli.output_format(), cli.robot, cli.verbose))
    }

    /// Context over an already-loaded configuration.
    #[must_use]
    pub fn new(config: Config, project_root: PathBuf, config_path: PathBuf) -> Self {
        Self {
            project_root,
            config_path,
            config,
            robot_mode: false,
            output_format: OutputFormat::Human,
            verbosity: 0,
        }
    }

    #[must_use]
    pub const fn with_output(mut self, format: OutputFormat, robot: bool, verbosity: u8) -> Self {
        self.output_format = format;
        self.robot_mode = robot;
        self.verbosity = verbosity;
        self
    }

    /// Detection config from `[detection]`. A `profile` override replaces
    /// the configured profile together with its library and fallback
    /// overrides; the gate and extra patterns still apply.
    pub fn detection_config(&self, profile: Option<DetectionProfile>) -> Result<DetectionConfig> {
        match profile {
            Some(profile) => DetectionSettings {
                profile,
                library: None,
                heuristic_fallback: None,
                ..self.config.detection.clone()
            }
            .detection_config(),
            None => self.config.detection.detection_config(),
        }
    }

    pub fn orchestrator(&self, profile: Option<DetectionProfile>) -> Result<DetectionOrchestrator> {
        Ok(DetectionOrchestrator::new(self.detection_config(profile)?))
    }

    pub fn analyzer(&self, profile: Option<DetectionProfile>) -> Result<ContentAnalyzer> {
        Ok(ContentAnalyzer::new(self.detection_config(profile)?))
    }

    pub fn formatter(&self, profile: Option<DetectionProfile>) -> Result<PromptFormatter> {
        Ok(
            PromptFormatter::with_parts(self.analyzer(profile)?, TemplateEngine::new())
                .with_default_template(&self.config.format.default_template),
        )
    }

    /// Format options seeded from `[format]`.
    #[must_use]
    pub const fn format_options(&self) -> FormatOptions {
        FormatOptions {
            preserve_whitespace: self.config.format.preserve_whitespace,
            strict_mode: false,
            include_metadata: self.config.format.include_metadata,
        }
    }

    #[must_use]
    pub fn validation_engine(&self) -> ValidationEngine {
        ValidationEngine::with_config(self.config.validation.validation_config())
    }
}
