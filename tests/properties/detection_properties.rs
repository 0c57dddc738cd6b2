use proptest::prelude::*;

use promptfmt::analyzer::{
    ContentAnalyzer, DetectionOrchestrator, DetectionProfile, QualityEvaluator, SectionKind,
    TargetModel,
};
use promptfmt::formatter::{FormatOptions, PromptFormatter};
use promptfmt::lint::ValidationEngine;

fn plain_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,.]{1,60}".prop_filter("non-blank", |s| !s.trim().is_empty())
}

fn profile() -> impl Strategy<Value = DetectionProfile> {
    prop_oneof![Just(DetectionProfile::Standard), Just(DetectionProfile::Enhanced)]
}

proptest! {
    #[test]
    fn test_tagged_task_is_always_detected(body in plain_text(), profile in profile()) {
        let orchestrator = DetectionOrchestrator::from_profile(profile);
        let sections = orchestrator.detect(&format!("<task>{body}</task>"));
        prop_assert_eq!(sections.task.as_deref(), Some(body.trim()));
    }

    #[test]
    fn test_digits_never_yield_a_task(text in "[0-9 \n]{0,120}") {
        let sections = DetectionOrchestrator::default().detect(&text);
        prop_assert!(sections.task.is_none());
    }

    #[test]
    fn test_detection_is_deterministic(text in ".{0,200}", profile in profile()) {
        let orchestrator = DetectionOrchestrator::from_profile(profile);
        prop_assert_eq!(orchestrator.detect(&text), orchestrator.detect(&text));
    }

    #[test]
    fn test_evaluation_is_pure_and_bounded(text in ".{0,200}") {
        let sections = DetectionOrchestrator::default().detect(&text);
        let evaluator = QualityEvaluator::new();
        let first = evaluator.evaluate(&sections);
        prop_assert_eq!(&first, &evaluator.evaluate(&sections));
        for score in [
            first.clarity_score,
            first.completeness_score,
            first.structure_score,
            first.overall_score,
        ] {
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn test_adding_a_task_never_lowers_quality(text in ".{0,200}") {
        let evaluator = QualityEvaluator::new();
        let mut sections = DetectionOrchestrator::default().detect(&text);
        sections.task = None;
        let without = evaluator.evaluate(&sections);
        sections.task = Some("Summarize the document.".to_string());
        let with = evaluator.evaluate(&sections);
        prop_assert!(with.overall_score >= without.overall_score);
        prop_assert!(with.completeness_score >= without.completeness_score);
    }

    #[test]
    fn test_adding_a_rule_line_never_lowers_completeness(text in "[A-Za-z ,.\n]{0,200}") {
        let analyzer = ContentAnalyzer::from_profile(DetectionProfile::Standard);
        let before = analyzer.analyze(&text, TargetModel::Generic).quality;
        let after = analyzer
            .analyze(&format!("{text}\nMust always cite sources."), TargetModel::Generic)
            .quality;
        prop_assert!(after.completeness_score >= before.completeness_score);
        prop_assert!(after.structure_score >= before.structure_score);
    }

    #[test]
    fn test_missing_sections_complement_present(text in ".{0,200}") {
        let result = ContentAnalyzer::default().analyze(&text, TargetModel::Generic);
        let present = result.sections.present();
        for kind in SectionKind::all() {
            prop_assert_ne!(present.contains(kind), result.missing_sections.contains(kind));
        }
    }

    #[test]
    fn test_format_confidence_is_bounded(text in ".{0,200}") {
        let result = PromptFormatter::default()
            .format(&text, Some("gpt_markdown"), None, &FormatOptions::default())
            .unwrap();
        prop_assert!((0.0..=1.0).contains(&result.confidence_score));
    }

    #[test]
    fn test_compliance_is_bounded(text in ".{0,200}") {
        let result = ValidationEngine::default().validate(&text);
        prop_assert!((0.0..=1.0).contains(&result.compliance_score));
        prop_assert_eq!(result.checks.len(), 6);
    }
}
