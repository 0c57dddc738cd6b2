//! Detection orchestration: Tier-1 patterns, a quality gate, and an
//! optional heuristic merge for prompts the patterns could not place.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::detector::SectionDetector;
use super::patterns::{LibraryTier, PatternLibrary};
use super::segmenter::{HeuristicSegmenter, Segmenter};
use super::types::{DetectedSections, Example, HeuristicSegment, SectionKind, SegmentCategory};
use crate::error::PromptError;

/// Default number of quality points at which Tier-1 output is trusted.
pub const DEFAULT_QUALITY_GATE: u32 = 3;

/// Segments below this confidence never add rules or examples.
const MIN_LIST_CONFIDENCE: f32 = 0.5;

/// Named pipeline presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionProfile {
    /// Baseline library, no heuristic fallback.
    #[default]
    Standard,
    /// Enhanced multilingual library with heuristic fallback.
    Enhanced,
}

impl DetectionProfile {
    #[must_use]
    pub const fn library_tier(self) -> LibraryTier {
        match self {
            Self::Standard => LibraryTier::Baseline,
            Self::Enhanced => LibraryTier::Enhanced,
        }
    }

    #[must_use]
    pub const fn heuristic_fallback(self) -> bool {
        matches!(self, Self::Enhanced)
    }
}

impl fmt::Display for DetectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Enhanced => f.write_str("enhanced"),
        }
    }
}

impl FromStr for DetectionProfile {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "basic" | "baseline" => Ok(Self::Standard),
            "enhanced" | "multilingual" => Ok(Self::Enhanced),
            other => Err(PromptError::Config(format!(
                "unknown detection profile '{other}' (expected standard or enhanced)"
            ))),
        }
    }
}

/// Orchestrator knobs.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub library: Arc<PatternLibrary>,
    pub heuristic_fallback: bool,
    pub quality_gate: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self::from_profile(DetectionProfile::default())
    }
}

impl DetectionConfig {
    #[must_use]
    pub fn from_profile(profile: DetectionProfile) -> Self {
        Self {
            library: PatternLibrary::for_tier(profile.library_tier()),
            heuristic_fallback: profile.heuristic_fallback(),
            quality_gate: DEFAULT_QUALITY_GATE,
        }
    }
}

/// Everything one detection pass decided, for inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub sections: DetectedSections,
    /// Tier-1 quality points before any merge.
    pub quality_points: u32,
    pub heuristics_applied: bool,
    /// Segments that changed the result.
    pub segments_merged: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<HeuristicSegment>,
}

/// Weighted presence score of a detection result (0-10).
#[must_use]
pub fn quality_points(sections: &DetectedSections) -> u32 {
    sections
        .present()
        .iter()
        .map(SectionKind::quality_points)
        .sum()
}

/// Merge heuristic segments into `sections`. Existing values are never
/// replaced. Returns how many segments contributed.
pub fn merge_segments(sections: &mut DetectedSections, segments: &[HeuristicSegment]) -> usize {
    let mut merged = 0;
    for segment in segments {
        let contributed = match segment.suggested_category {
            SegmentCategory::Unknown => false,
            SegmentCategory::Rules => {
                if segment.confidence < MIN_LIST_CONFIDENCE {
                    false
                } else {
                    match segment.list_items() {
                        Some(items) => sections.rules.extend(items.iter().cloned()),
                        None => sections.rules.push(segment.content.clone()),
                    }
                    true
                }
            }
            SegmentCategory::Examples => {
                if segment.confidence < MIN_LIST_CONFIDENCE {
                    false
                } else {
                    sections.examples.push(Example::new(segment.content.clone()));
                    true
                }
            }
            category => category
                .section()
                .is_some_and(|kind| sections.fill_singular(kind, &segment.content)),
        };
        if contributed {
            merged += 1;
        }
    }
    merged
}

/// Runs Tier-1 detection and, when the gate is not met and fallback is
/// enabled, merges heuristic segments.
pub struct DetectionOrchestrator {
    detector: SectionDetector,
    segmenter: Box<dyn Segmenter>,
    heuristic_fallback: bool,
    quality_gate: u32,
}

impl fmt::Debug for DetectionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectionOrchestrator")
            .field("library", &self.detector.library().tier())
            .field("segmenter", &self.segmenter.name())
            .field("heuristic_fallback", &self.heuristic_fallback)
            .field("quality_gate", &self.quality_gate)
            .finish()
    }
}

impl Default for DetectionOrchestrator {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

impl DetectionOrchestrator {
    #[must_use]
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            detector: SectionDetector::new(config.library),
            segmenter: Box::new(HeuristicSegmenter::new()),
            heuristic_fallback: config.heuristic_fallback,
            quality_gate: config.quality_gate,
        }
    }

    #[must_use]
    pub fn from_profile(profile: DetectionProfile) -> Self {
        Self::new(DetectionConfig::from_profile(profile))
    }

    /// Replace the fallback segmenter.
    #[must_use]
    pub fn with_segmenter(mut self, segmenter: Box<dyn Segmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    #[must_use]
    pub const fn detector(&self) -> &SectionDetector {
        &self.detector
    }

    #[must_use]
    pub const fn heuristic_fallback(&self) -> bool {
        self.heuristic_fallback
    }

    #[must_use]
    pub const fn quality_gate(&self) -> u32 {
        self.quality_gate
    }

    /// Final sections for `text`.
    #[must_use]
    pub fn detect(&self, text: &str) -> DetectedSections {
        self.detect_with_report(text).sections
    }

    /// Final sections plus how they were reached.
    #[must_use]
    pub fn detect_with_report(&self, text: &str) -> DetectionReport {
        let mut sections = self.detector.detect(text);
        let points = quality_points(&sections);

        if points >= self.quality_gate || !self.heuristic_fallback {
            debug!(points, gate = self.quality_gate, "tier-1 result accepted");
            return DetectionReport {
                sections,
                quality_points: points,
                heuristics_applied: false,
                segments_merged: 0,
                segments: Vec::new(),
            };
        }

        let segments = self.segmenter.segment(text);
        let merged = merge_segments(&mut sections, &segments);
        debug!(
            points,
            gate = self.quality_gate,
            segmenter = self.segmenter.name(),
            segments = segments.len(),
            merged,
            "heuristic fallback applied"
        );

        DetectionReport {
            sections,
            quality_points: points,
            heuristics_applied: true,
            segments_merged: merged,
            segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::analyzer::quality::QualityEvaluator;
    use crate::analyzer::types::{SegmentMetadata, SegmentType};

    /// Records every call and answers with a fixed context paragraph, so
    /// any invocation shows up in the detected sections.
    struct CountingSegmenter {
        calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<String>>>,
        reply: Vec<HeuristicSegment>,
    }

    impl Default for CountingSegmenter {
        fn default() -> Self {
            Self {
                calls: Arc::default(),
                seen: Arc::default(),
                reply: vec![segment(SegmentCategory::Context, "Segmented background", 0.5)],
            }
        }
    }

    impl Segmenter for CountingSegmenter {
        fn segment(&self, text: &str) -> Vec<HeuristicSegment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(text.to_string());
            self.reply.clone()
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn segment(category: SegmentCategory, content: &str, confidence: f32) -> HeuristicSegment {
        HeuristicSegment {
            content: content.to_string(),
            start_line: 1,
            end_line: 1,
            segment_type: SegmentType::Paragraph,
            suggested_category: category,
            confidence,
            metadata: None,
        }
    }

    #[test]
    fn test_quality_points_weights() {
        let sections = DetectedSections {
            introduction: Some("You are a bot".into()),
            context: Some("Background: x".into()),
            ..Default::default()
        };
        assert_eq!(quality_points(&sections), 3);
        assert_eq!(quality_points(&DetectedSections::default()), 0);
    }

    #[test]
    fn test_fallback_skipped_when_gate_met() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counting = CountingSegmenter {
            calls: Arc::clone(&calls),
            ..Default::default()
        };
        let orchestrator = DetectionOrchestrator::from_profile(DetectionProfile::Enhanced)
            .with_segmenter(Box::new(counting));

        let text = "You are a chef.\nTask: Write a soup recipe.";
        let report = orchestrator.detect_with_report(text);
        assert!(report.quality_points >= 3);
        assert!(!report.heuristics_applied);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.sections, SectionDetector::new(PatternLibrary::enhanced()).detect(text));
        assert!(report.sections.context.is_none());
    }

    #[test]
    fn test_fallback_runs_below_gate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let counting = CountingSegmenter {
            calls: Arc::clone(&calls),
            seen: Arc::clone(&seen),
            ..Default::default()
        };
        let orchestrator = DetectionOrchestrator::from_profile(DetectionProfile::Enhanced)
            .with_segmenter(Box::new(counting));

        let report = orchestrator.detect_with_report("plain words");
        assert!(report.heuristics_applied);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(seen.lock().unwrap().as_slice(), ["plain words"]);
        assert_eq!(report.sections.context.as_deref(), Some("Segmented background"));
        assert_eq!(report.segments_merged, 1);
    }

    #[test]
    fn test_empty_tags_count_as_missing() {
        let text = "<introduction>  </introduction>\n<task> </task>\nbackground notes only";
        let counting = CountingSegmenter {
            reply: vec![
                segment(SegmentCategory::Introduction, "You are a note taker.", 0.5),
                segment(SegmentCategory::Task, "Summarize the notes.", 0.5),
            ],
            ..Default::default()
        };
        let calls = Arc::clone(&counting.calls);
        let orchestrator = DetectionOrchestrator::from_profile(DetectionProfile::Enhanced)
            .with_segmenter(Box::new(counting));

        let tier_one = orchestrator.detector().detect(text);
        assert!(tier_one.introduction.is_none());
        assert!(tier_one.task.is_none());
        assert_eq!(quality_points(&tier_one), 0);

        let report = orchestrator.detect_with_report(text);
        assert_eq!(report.quality_points, 0);
        assert!(report.heuristics_applied);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.sections.introduction.as_deref(), Some("You are a note taker."));
        assert_eq!(report.sections.task.as_deref(), Some("Summarize the notes."));
        assert_eq!(report.segments_merged, 2);

        let missing = QualityEvaluator.identify_missing_sections(&tier_one);
        assert!(missing.contains(&SectionKind::Introduction));
        assert!(missing.contains(&SectionKind::Task));
        assert_eq!(missing.len(), 6);
    }

    #[test]
    fn test_blank_values_are_not_present() {
        let mut sections = DetectedSections {
            task: Some("   ".into()),
            ..Default::default()
        };
        assert!(!sections.has(SectionKind::Task));
        assert_eq!(quality_points(&sections), 0);
        assert!(!sections.fill_singular(SectionKind::Context, " \n "));
        assert!(sections.fill_singular(SectionKind::Task, "Task: write"));
        assert_eq!(sections.task.as_deref(), Some("Task: write"));
    }

    #[test]
    fn test_standard_profile_never_falls_back() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counting = CountingSegmenter {
            calls: Arc::clone(&calls),
            ..Default::default()
        };
        let orchestrator = DetectionOrchestrator::default().with_segmenter(Box::new(counting));
        let sections = orchestrator.detect("翻译这段话");
        assert_eq!(sections, DetectedSections::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_merge_never_overwrites_tier_one() {
        let mut sections = DetectedSections::default();
        sections.fill_singular(SectionKind::Task, "Task: original");
        let segments = vec![
            segment(SegmentCategory::Task, "replacement", 0.7),
            segment(SegmentCategory::Context, "a shop", 0.5),
            segment(SegmentCategory::Unknown, "noise", 0.9),
        ];
        let merged = merge_segments(&mut sections, &segments);
        assert_eq!(merged, 1);
        assert_eq!(sections.task.as_deref(), Some("Task: original"));
        assert_eq!(sections.context.as_deref(), Some("a shop"));
        assert_eq!(sections.raw_sections.get(&SectionKind::Context).map(String::as_str), Some("a shop"));
    }

    #[test]
    fn test_merge_lists_respect_confidence_floor() {
        let mut sections = DetectedSections {
            rules: vec!["Tier-1 rule".into()],
            ..Default::default()
        };
        let mut list = segment(SegmentCategory::Rules, "one\ntwo", 0.6);
        list.metadata = Some(SegmentMetadata {
            list_items: vec!["one".into(), "two".into()],
            ..SegmentMetadata::default()
        });
        let segments = vec![
            list,
            segment(SegmentCategory::Rules, "weak", 0.4),
            segment(SegmentCategory::Examples, "sample text", 0.5),
        ];
        merge_segments(&mut sections, &segments);
        assert_eq!(sections.rules, vec!["Tier-1 rule", "one", "two"]);
        assert_eq!(sections.examples, vec![Example::new("sample text")]);
    }

    #[test]
    fn test_enhanced_colon_fallback() {
        let orchestrator = DetectionOrchestrator::from_profile(DetectionProfile::Enhanced);
        let report = orchestrator.detect_with_report("Persona: a calm librarian\nGoal words here");
        assert!(report.heuristics_applied);
        assert_eq!(report.segments.len(), 1);
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!("Enhanced".parse::<DetectionProfile>().unwrap(), DetectionProfile::Enhanced);
        assert_eq!("standard".parse::<DetectionProfile>().unwrap(), DetectionProfile::Standard);
        assert!("fancy".parse::<DetectionProfile>().is_err());
        assert_eq!(DetectionProfile::default().to_string(), "standard");
    }
}
