//! Completeness: structural completeness, content coverage and explanation depth
//!
//! Unlike the other analyzers, most of the vocabulary here is matched as plain
//! lower-cased substrings, so short markers such as "as" or "is" fire inside
//! longer words. That leniency is part of the scoring formula.

use super::{capped, clamp_unit, TextAnalyzer};
use crate::patterns::{
    count_contained, paragraphs, section_count, PatternLibrary, DETAIL_MARKERS,
    EXPLANATION_PATTERNS, MAIN_CONTENT_MARKERS,
};
use crate::types::Metric;

#[derive(Debug, Clone, Copy, Default)]
pub struct CompletenessAnalyzer;

impl TextAnalyzer for CompletenessAnalyzer {
    fn metric(&self) -> Metric {
        Metric::Completeness
    }

    fn evaluate(&self, text: &str, patterns: &PatternLibrary) -> f64 {
        let lowered = text.to_lowercase();

        let structure = structure(text, &lowered, patterns);
        let content = content(text, &lowered);
        let depth = depth(text, &lowered, patterns);

        tracing::trace!(structure, content, depth, "completeness sub-scores");
        clamp_unit(structure * 0.3 + content * 0.4 + depth * 0.3)
    }
}

/// Opening, body and closing markers
fn structure(text: &str, lowered: &str, p: &PatternLibrary) -> f64 {
    let mut score = 0.3;

    if p.opener.is_match(text) {
        score += 0.2;
    }
    if MAIN_CONTENT_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        score += 0.2;
    }
    if p.closing.is_match(text) {
        score += 0.2;
    }
    if paragraphs(text).len() >= 2 {
        score += 0.1;
    }

    clamp_unit(score)
}

/// Code coverage, explanations and number of sections
fn content(text: &str, lowered: &str) -> f64 {
    let mut score = 0.3;

    if lowered.contains("code") || lowered.contains("implementation") {
        score += if text.contains("```") { 0.3 } else { 0.1 };
    }

    score += capped(count_contained(lowered, EXPLANATION_PATTERNS), 0.05, 0.3);
    score += capped(section_count(text), 0.05, 0.2);

    clamp_unit(score)
}

/// Detail markers, examples and breadth of technical syntax
fn depth(text: &str, lowered: &str, p: &PatternLibrary) -> f64 {
    let mut score = 0.3;

    score += capped(count_contained(lowered, DETAIL_MARKERS), 0.05, 0.2);
    score += capped(p.example_phrase.find_iter(text).count(), 0.1, 0.2);

    let categories = p
        .technical_elements
        .iter()
        .filter(|re| re.is_match(text))
        .count();
    score += capped(categories, 0.05, 0.3);

    clamp_unit(score)
}
