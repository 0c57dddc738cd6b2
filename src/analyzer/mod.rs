//! Prompt section detection and quality analysis.
//!
//! The pipeline, leaves first:
//!
//! - [`patterns`]: per-section expression tables (baseline and enhanced)
//! - [`matcher`]: runs one section's expressions over a text
//! - [`detector`]: Tier-1 resolution of matches into section values
//! - [`segmenter`]: colon/list/paragraph fallback for unmarked prompts
//! - [`orchestrator`]: quality gate plus heuristic merge
//! - [`quality`]: scores, issues and suggestions
//! - [`content`]: the analysis façade used by the CLI and MCP tools

pub mod content;
pub mod detector;
pub mod matcher;
pub mod orchestrator;
pub mod patterns;
pub mod quality;
pub mod segmenter;
pub mod types;

pub use content::{AnalysisResult, ContentAnalyzer, ConventionSummary, TargetModel};
pub use detector::{SectionDetection, SectionDetector};
pub use matcher::{PatternMatch, extract_matches};
pub use orchestrator::{
    DetectionConfig, DetectionOrchestrator, DetectionProfile, DetectionReport, quality_points,
};
pub use patterns::{LibraryTier, PatternDefinition, PatternExpr, PatternLibrary, Scan};
pub use quality::{IssueSeverity, IssueType, PromptIssue, QualityEvaluator, QualityMetrics};
pub use segmenter::{HeuristicSegmenter, Segmenter};
pub use types::{
    DetectedSections, Example, HeuristicSegment, ListStyle, SectionKind, SegmentCategory,
    SegmentMetadata, SegmentType,
};
