use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::{DetectionConfig, DetectionProfile, LibraryTier, PatternLibrary, SectionKind};
use crate::analyzer::orchestrator::DEFAULT_QUALITY_GATE;
use crate::error::{PromptError, Result};
use crate::lint::ValidationConfig;
use crate::lint::config::DEFAULT_PASS_THRESHOLD;
use crate::templates::DEFAULT_TEMPLATE;

/// Project-level config file, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".promptfmt.toml";

/// Environment lookup, injectable so tests never touch the process env.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detection: DetectionSettings,
    #[serde(default)]
    pub format: FormatSettings,
    #[serde(default)]
    pub validation: ValidationSettings,
}

impl Config {
    /// Defaults, then the global file, the project file, the explicit file
    /// (`--config` or `PROMPTFMT_CONFIG`) and finally env overrides.
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let global = dirs::config_dir().map(|dir| dir.join("promptfmt/config.toml"));
        Self::load_from(
            explicit_path,
            global.as_deref(),
            project_root,
            &|key: &str| std::env::var(key).ok(),
        )
    }

    pub fn load_from(
        explicit_path: Option<&Path>,
        global_path: Option<&Path>,
        project_root: &Path,
        env: EnvLookup<'_>,
    ) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global) = global_path {
            if let Some(patch) = Self::load_patch(global)? {
                config.merge_patch(patch);
            }
        }
        if let Some(project) = Self::load_patch(&project_root.join(PROJECT_CONFIG_FILE))? {
            config.merge_patch(project);
        }

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| env("PROMPTFMT_CONFIG").map(PathBuf::from));
        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                PromptError::Config(format!("config file {} not found", path.display()))
            })?;
            config.merge_patch(patch);
        }

        config.apply_env_overrides(env)?;
        config.check()?;

        debug!(profile = %config.detection.profile, template = %config.format.default_template, "config loaded");
        Ok(config)
    }

    /// Parse a single TOML document on top of the defaults.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| PromptError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.check()?;
        Ok(config)
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| PromptError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| PromptError::Config(format!("parse config {}: {err}", path.display())))?;
        debug!(path = %path.display(), "loaded config layer");
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.detection {
            self.detection.merge(patch);
        }
        if let Some(patch) = patch.format {
            self.format.merge(patch);
        }
        if let Some(patch) = patch.validation {
            self.validation.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self, env: EnvLookup<'_>) -> Result<()> {
        if let Some(value) = env_parse::<DetectionProfile>(env, "PROMPTFMT_DETECTION_PROFILE")? {
            self.detection.profile = value;
        }
        if let Some(value) = env_bool(env, "PROMPTFMT_HEURISTIC_FALLBACK") {
            self.detection.heuristic_fallback = Some(value);
        }
        if let Some(value) = env_parse::<u32>(env, "PROMPTFMT_QUALITY_GATE")? {
            self.detection.quality_gate = value;
        }
        if let Some(value) = env("PROMPTFMT_DEFAULT_TEMPLATE") {
            self.format.default_template = value;
        }
        if let Some(value) = env_parse::<f64>(env, "PROMPTFMT_VALIDATION_THRESHOLD")? {
            self.validation.pass_threshold = value;
        }
        Ok(())
    }

    fn check(&self) -> Result<()> {
        let threshold = self.validation.pass_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PromptError::Config(format!(
                "validation.pass_threshold must be between 0 and 1, got {threshold}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSettings {
    #[serde(default)]
    pub profile: DetectionProfile,
    /// Overrides the profile's library
    #[serde(default)]
    pub library: Option<LibraryTier>,
    /// Overrides the profile's fallback setting
    #[serde(default)]
    pub heuristic_fallback: Option<bool>,
    #[serde(default = "default_quality_gate")]
    pub quality_gate: u32,
    /// Extra expressions appended to a section's definition
    #[serde(default)]
    pub extra_patterns: BTreeMap<SectionKind, Vec<String>>,
}

const fn default_quality_gate() -> u32 {
    DEFAULT_QUALITY_GATE
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            profile: DetectionProfile::default(),
            library: None,
            heuristic_fallback: None,
            quality_gate: DEFAULT_QUALITY_GATE,
            extra_patterns: BTreeMap::new(),
        }
    }
}

impl DetectionSettings {
    fn merge(&mut self, patch: DetectionPatch) {
        if let Some(value) = patch.profile {
            self.profile = value;
        }
        if let Some(value) = patch.library {
            self.library = Some(value);
        }
        if let Some(value) = patch.heuristic_fallback {
            self.heuristic_fallback = Some(value);
        }
        if let Some(value) = patch.quality_gate {
            self.quality_gate = value;
        }
        if let Some(extra) = patch.extra_patterns {
            for (kind, patterns) in extra {
                let existing = self.extra_patterns.entry(kind).or_default();
                *existing = merge_unique(existing.clone(), &patterns);
            }
        }
    }

    /// Resolve the profile and individual overrides into a detection config.
    ///
    /// Fails when an extra pattern does not compile.
    pub fn detection_config(&self) -> Result<DetectionConfig> {
        let tier = self.library.unwrap_or_else(|| self.profile.library_tier());
        let mut library = PatternLibrary::for_tier(tier);
        if !self.extra_patterns.is_empty() {
            library = Arc::new(library.with_extra_patterns(&self.extra_patterns)?);
        }

        Ok(DetectionConfig {
            library,
            heuristic_fallback: self
                .heuristic_fallback
                .unwrap_or_else(|| self.profile.heuristic_fallback()),
            quality_gate: self.quality_gate,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatSettings {
    #[serde(default = "default_template")]
    pub default_template: String,
    #[serde(default)]
    pub preserve_whitespace: bool,
    #[serde(default)]
    pub include_metadata: bool,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            default_template: default_template(),
            preserve_whitespace: false,
            include_metadata: false,
        }
    }
}

impl FormatSettings {
    fn merge(&mut self, patch: FormatPatch) {
        if let Some(value) = patch.default_template {
            self.default_template = value;
        }
        if let Some(value) = patch.preserve_whitespace {
            self.preserve_whitespace = value;
        }
        if let Some(value) = patch.include_metadata {
            self.include_metadata = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    #[serde(default)]
    pub disabled_rules: Vec<String>,
    #[serde(default)]
    pub strict: bool,
}

const fn default_pass_threshold() -> f64 {
    DEFAULT_PASS_THRESHOLD
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            disabled_rules: Vec::new(),
            strict: false,
        }
    }
}

impl ValidationSettings {
    fn merge(&mut self, patch: ValidationPatch) {
        if let Some(value) = patch.pass_threshold {
            self.pass_threshold = value;
        }
        if let Some(values) = patch.disabled_rules {
            self.disabled_rules = merge_unique(values, &self.disabled_rules);
        }
        if let Some(value) = patch.strict {
            self.strict = value;
        }
    }

    #[must_use]
    pub fn validation_config(&self) -> ValidationConfig {
        let mut config = self
            .disabled_rules
            .iter()
            .fold(ValidationConfig::new(), |config, rule| config.disable_rule(rule.clone()))
            .with_pass_threshold(self.pass_threshold);
        config.strict = self.strict;
        config
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub detection: Option<DetectionPatch>,
    pub format: Option<FormatPatch>,
    pub validation: Option<ValidationPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DetectionPatch {
    pub profile: Option<DetectionProfile>,
    pub library: Option<LibraryTier>,
    pub heuristic_fallback: Option<bool>,
    pub quality_gate: Option<u32>,
    pub extra_patterns: Option<BTreeMap<SectionKind, Vec<String>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FormatPatch {
    pub default_template: Option<String>,
    pub preserve_whitespace: Option<bool>,
    pub include_metadata: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ValidationPatch {
    pub pass_threshold: Option<f64>,
    pub disabled_rules: Option<Vec<String>>,
    pub strict: Option<bool>,
}

fn merge_unique(values: Vec<String>, existing: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values.into_iter().chain(existing.iter().cloned()) {
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

fn env_bool(env: EnvLookup<'_>, key: &str) -> Option<bool> {
    env(key).map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_parse<T>(env: EnvLookup<'_>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match env(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| PromptError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}
