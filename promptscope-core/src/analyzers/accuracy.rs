//! Accuracy: factual, technical and code-correctness signals
//!
//! The three sub-scores carry their own caps and are simply summed; the sum is
//! clamped to `[0, 1]`.

use super::{capped, clamp_unit, TextAnalyzer};
use crate::patterns::PatternLibrary;
use crate::types::Metric;

#[derive(Debug, Clone, Copy, Default)]
pub struct AccuracyAnalyzer;

impl TextAnalyzer for AccuracyAnalyzer {
    fn metric(&self) -> Metric {
        Metric::Accuracy
    }

    fn evaluate(&self, text: &str, patterns: &PatternLibrary) -> f64 {
        let factual = factual_content(text, patterns);
        let technical = technical_accuracy(text, patterns);
        let code = code_correctness(text, patterns);

        tracing::trace!(factual, technical, code, "accuracy sub-scores");
        clamp_unit(factual + technical + code)
    }
}

/// Measurements, citations and "X is ..." definitions
fn factual_content(text: &str, p: &PatternLibrary) -> f64 {
    let mut score = 0.0;

    if p.measurement.is_match(text) {
        score += 0.2;
    }
    if p.citation.is_match(text) {
        score += 0.2;
    }

    let definitions = p.term_definition.find_iter(text).count();
    if definitions > 0 {
        score += capped(definitions, 0.1, 0.3);
    }

    score
}

/// Technical vocabulary density and inline code spans
fn technical_accuracy(text: &str, p: &PatternLibrary) -> f64 {
    let mut score = 0.0;

    score += capped(p.accuracy_terms.find_iter(text).count(), 0.05, 0.3);
    if p.inline_code.is_match(text) {
        score += 0.2;
    }

    score
}

/// Averaged per-block checks over fenced code blocks; 0 without blocks
fn code_correctness(text: &str, p: &PatternLibrary) -> f64 {
    let blocks: Vec<&str> = p.code_block.find_iter(text).map(|m| m.as_str()).collect();
    if blocks.is_empty() {
        return 0.0;
    }

    let checks = [
        &p.code_language,
        &p.code_keyword,
        &p.code_terminator,
        &p.code_error_handling,
        &p.code_comment,
    ];

    let mut score = 0.0;
    for block in &blocks {
        for check in checks {
            if check.is_match(block) {
                score += 0.1;
            }
        }
    }

    (score / blocks.len() as f64).min(0.4)
}
