use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::app::AppContext;
use crate::config::{Config, PROJECT_CONFIG_FILE};

/// Labelled English prompt touching every section.
pub const TRANSLATOR_PROMPT: &str = "You are a professional translator.

Rules:
- Keep the original tone
- Never translate proper nouns

Example:
Input: Good morning
Output: Bonjour

Output format: Return only the translated text.

Task: Translate the following paragraph into French.";

/// Fully tagged prompt.
pub const TAGGED_PROMPT: &str = "<role>You are a code reviewer.</role>
<rules>
- Point out bugs first
- Be concise
</rules>
<output_format>A bullet list of findings</output_format>
<task>Review the diff below.</task>";

/// Chinese prompt that only the enhanced profile recognises fully.
pub const CHINESE_PROMPT: &str = "你是一位专业的翻译。

规则: 保持原文的语气

举例: 你好 -> Hello

任务: 翻译这段话";

/// Project directory with an optional `.promptfmt.toml`.
pub struct ProjectFixture {
    pub temp_dir: TempDir,
}

impl ProjectFixture {
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Project whose config file holds `toml`.
    #[must_use]
    pub fn with_config(toml: &str) -> Self {
        let fixture = Self::new();
        fixture.create_file(PROJECT_CONFIG_FILE, toml);
        fixture
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file relative to the project root.
    #[must_use]
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.root().join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Context built from this project's config, ignoring the global file
    /// and the process environment.
    #[must_use]
    pub fn context(&self) -> AppContext {
        let config = Config::load_from(None, None, self.root(), &|_: &str| None)
            .expect("Failed to load fixture config");
        AppContext::new(config, self.root().to_path_buf(), self.root().join(PROJECT_CONFIG_FILE))
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}
