//! Built-in convention rules.
//!
//! ```
//! use promptfmt::lint::ValidationEngine;
//! use promptfmt::lint::rules::all_rules;
//!
//! let mut engine = ValidationEngine::new(Default::default());
//! for rule in all_rules() {
//!     engine.register(rule);
//! }
//! assert_eq!(engine.rules().len(), 6);
//! ```

pub mod conventions;

use crate::lint::rule::BoxedRule;

pub use conventions::{
    ExampleMarkersRule, OutputFormatRule, RoleDefinitionRule, RuleMarkersRule,
    SectionSeparationRule, TaskInstructionRule, convention_rules,
};

/// Returns all built-in rules.
pub fn all_rules() -> Vec<BoxedRule> {
    convention_rules()
}
