//! promptfmt - prompt section detection, scoring and formatting.
//!
//! The [`analyzer`] module holds the detection pipeline. Everything else
//! ([`templates`], [`lint`], [`formatter`], [`cli`]) consumes its
//! [`analyzer::DetectedSections`] read-only.

pub mod analyzer;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod formatter;
pub mod lint;
pub mod templates;
#[cfg(test)]
pub mod test_utils;

pub use error::{PromptError, Result};
