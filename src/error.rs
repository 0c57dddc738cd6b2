//! Error types for promptfmt.
//!
//! Absence of a prompt section is never an error. Everything here reports
//! caller-supplied data that violates an invariant (bad pattern tables,
//! unknown templates, unreadable configuration) so that misconfiguration
//! surfaces immediately instead of looking like "nothing detected".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid pattern definition: {0}")]
    InvalidPattern(String),

    #[error("template '{0}' not found")]
    TemplateNotFound(String),

    #[error("custom template validation failed: {0}")]
    InvalidTemplate(String),

    #[error("missing required sections: {0}")]
    MissingSections(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

impl PromptError {
    /// Stable machine-readable code used in robot-mode error envelopes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
            Self::InvalidPattern(_) => "invalid_pattern",
            Self::TemplateNotFound(_) => "template_not_found",
            Self::InvalidTemplate(_) => "invalid_template",
            Self::MissingSections(_) => "missing_sections",
            Self::ValidationFailed(_) => "validation_failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, PromptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PromptError::TemplateNotFound("fancy".to_string());
        assert_eq!(err.to_string(), "template 'fancy' not found");

        let err = PromptError::InvalidPattern("task has no expressions".to_string());
        assert!(err.to_string().contains("task has no expressions"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(PromptError::Config(String::new()).code(), "config");
        assert_eq!(
            PromptError::MissingSections("task".to_string()).code(),
            "missing_sections"
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(PromptError::from(io).code(), "io");
    }
}
