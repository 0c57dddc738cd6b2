//! Convention validation for prompt text.
//!
//! - `ConventionRule` trait for lexical checks over the raw prompt
//! - `ValidationEngine` for running rules and scoring compliance
//! - `Diagnostic` types for failed checks, with spans where known
//! - `ValidationConfig` for disabling rules and tuning the pass threshold
//!
//! # Example
//!
//! ```
//! use promptfmt::lint::{ValidationConfig, ValidationEngine};
//!
//! let engine = ValidationEngine::with_config(ValidationConfig::new().disable_rule("section-separation"));
//! let result = engine.validate("You are a translator.\nTask: translate 'cat' into French.");
//!
//! assert_eq!(result.checks.len(), 5);
//! for diag in result.warnings() {
//!     eprintln!("{diag}");
//! }
//! ```

pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod rule;
pub mod rules;

pub use config::{ValidationConfig, ValidationContext};
pub use diagnostic::{Diagnostic, RuleCategory, Severity, SourceSpan};
pub use engine::{RuleInfo, ValidationEngine, ValidationResult};
pub use rule::{BoxedRule, ConventionRule, ValidationCheck};

pub use rules::all_rules;
