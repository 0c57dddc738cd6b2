//! Runs a section's expression list over a text.

use super::patterns::{PatternDefinition, Scan};

/// One regex hit. Borrows from the scanned text.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch<'t> {
    /// Full matched text.
    pub text: &'t str,
    /// First capture group, when the expression has one and it participated.
    pub capture: Option<&'t str>,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
    /// Index of the producing expression within the definition.
    pub expression: usize,
}

impl PatternMatch<'_> {
    /// Capture group 1 when present, otherwise the whole match.
    #[must_use]
    pub fn inner(&self) -> &str {
        self.capture.unwrap_or(self.text)
    }
}

/// Collect matches for every expression of `definition`, concatenated in
/// expression order. Within one expression, matches are in document order.
#[must_use]
pub fn extract_matches<'t>(text: &'t str, definition: &PatternDefinition) -> Vec<PatternMatch<'t>> {
    let mut matches = Vec::new();
    if text.is_empty() {
        return matches;
    }

    for (index, expr) in definition.expressions().iter().enumerate() {
        let limit = match expr.scan() {
            Scan::First => 1,
            Scan::All => usize::MAX,
        };
        for caps in expr.regex().captures_iter(text).take(limit) {
            let Some(whole) = caps.get(0) else { continue };
            let matched = whole.as_str();
            let confidence = if definition.is_tagged(matched) {
                definition.kind().tag_confidence()
            } else {
                definition.kind().pattern_confidence()
            };
            matches.push(PatternMatch {
                text: matched,
                capture: caps.get(1).map(|group| group.as_str()),
                start: whole.start(),
                end: whole.end(),
                confidence,
                expression: index,
            });
        }
    }

    matches
}

/// Whether any expression of `definition` matches `text`.
#[must_use]
pub fn matches_pattern(text: &str, definition: &PatternDefinition) -> bool {
    definition.matches_pattern(text)
}

/// Whether `text` contains any keyword of `definition`, ignoring case.
#[must_use]
pub fn contains_keyword(text: &str, definition: &PatternDefinition) -> bool {
    definition.contains_keyword(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::patterns::{PatternExpr, PatternLibrary};
    use crate::analyzer::types::SectionKind;

    fn definition(kind: SectionKind, rows: &[(&str, Scan)]) -> PatternDefinition {
        let exprs = rows
            .iter()
            .map(|(source, scan)| PatternExpr::new(source, *scan).unwrap())
            .collect();
        PatternDefinition::new(kind, exprs).unwrap()
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let def = PatternLibrary::baseline().get(SectionKind::Rules).clone();
        assert!(extract_matches("", &def).is_empty());
    }

    #[test]
    fn test_first_scan_takes_single_match() {
        let def = definition(SectionKind::Context, &[(r"^context:\s*.+", Scan::First)]);
        let text = "Context: one\nContext: two";
        let matches = extract_matches(text, &def);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "Context: one");
        assert_eq!(matches[0].start, 0);
    }

    #[test]
    fn test_all_scan_collects_in_document_order() {
        let def = definition(SectionKind::Rules, &[(r"^must\s+.+", Scan::All)]);
        let text = "Must be short\nhello\nmust be kind";
        let found: Vec<&str> = extract_matches(text, &def).iter().map(|m| m.text).collect();
        assert_eq!(found, vec!["Must be short", "must be kind"]);
    }

    #[test]
    fn test_results_follow_expression_order_not_offsets() {
        let def = definition(
            SectionKind::Rules,
            &[(r"^never\s+.+", Scan::All), (r"^always\s+.+", Scan::All)],
        );
        let text = "Always be polite\nNever lie";
        let matches = extract_matches(text, &def);
        assert_eq!(matches[0].text, "Never lie");
        assert_eq!(matches[0].expression, 0);
        assert_eq!(matches[1].text, "Always be polite");
        assert_eq!(matches[1].expression, 1);
        assert!(matches[0].start > matches[1].start);
    }

    #[test]
    fn test_tagged_match_gets_tag_confidence() {
        let library = PatternLibrary::baseline();
        let task = library.get(SectionKind::Task);
        let matches = extract_matches("<task>\n  Summarize it\n</task>", task);
        assert_eq!(matches.len(), 1);
        assert!((matches[0].confidence - 0.95).abs() < f32::EPSILON);
        assert_eq!(matches[0].inner().trim(), "Summarize it");

        let matches = extract_matches("Task: Summarize it", task);
        assert!((matches[0].confidence - 0.85).abs() < f32::EPSILON);
        assert!(matches[0].capture.is_none());
        assert_eq!(matches[0].inner(), "Task: Summarize it");
    }

    #[test]
    fn test_helpers_delegate_to_definition() {
        let library = PatternLibrary::baseline();
        let context = library.get(SectionKind::Context);
        assert!(matches_pattern("Background: a small shop", context));
        assert!(contains_keyword("GIVEN THAT it rains", context));
        assert!(!contains_keyword("sunny", context));
    }
}
