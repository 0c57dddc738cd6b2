//! Rendering detected sections through named templates.
//!
//! Built-ins target Claude (XML tags), GPT (Markdown headers) and JSON.
//! Callers can add their own through [`CustomTemplate`].

pub mod builtin;
pub mod custom;
pub mod engine;

pub use builtin::{Fragments, RenderStyle, Template, builtin_templates};
pub use custom::CustomTemplate;
pub use engine::{RenderOptions, TemplateEngine, normalize_whitespace, render_with};

/// Template used when none is requested.
pub const DEFAULT_TEMPLATE: &str = "claude_xml";

/// Name a caller-supplied custom template is registered under.
pub const CUSTOM_TEMPLATE_NAME: &str = "user_custom";
