//! Relevancy: topical alignment, answer structure and context adherence

use super::{capped, clamp_unit, TextAnalyzer};
use crate::patterns::{count_contained, paragraphs, PatternLibrary, RELEVANCY_TERMS};
use crate::types::Metric;

const CONTENT_WEIGHT: f64 = 0.4;
const STRUCTURE_WEIGHT: f64 = 0.3;
const CONTEXT_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, Default)]
pub struct RelevancyAnalyzer;

impl TextAnalyzer for RelevancyAnalyzer {
    fn metric(&self) -> Metric {
        Metric::Relevancy
    }

    fn evaluate(&self, text: &str, patterns: &PatternLibrary) -> f64 {
        let content = content_relevance(text, patterns);
        let structure = structure(text, patterns);
        let context = context_adherence(text, patterns);

        tracing::trace!(content, structure, context, "relevancy sub-scores");

        let weighted = [
            (content, CONTENT_WEIGHT),
            (structure, STRUCTURE_WEIGHT),
            (context, CONTEXT_WEIGHT),
        ]
        .iter()
        .fold(0.0, |sum, (score, weight)| sum + score * weight);

        clamp_unit(weighted)
    }
}

fn content_relevance(text: &str, p: &PatternLibrary) -> f64 {
    let mut score = 0.3;

    if p.direct_answer.is_match(text) {
        score += 0.2;
    }

    let lowered = text.to_lowercase();
    score += capped(count_contained(&lowered, RELEVANCY_TERMS), 0.05, 0.4);

    clamp_unit(score)
}

fn structure(text: &str, p: &PatternLibrary) -> f64 {
    let mut score = 0.2;

    if p.heading_line.is_match(text) {
        score += 0.2;
    }
    if p.bullet_line.is_match(text) {
        score += 0.15;
    }
    if p.code_block.is_match(text) {
        score += 0.15;
    }
    if paragraphs(text).len() >= 2 {
        score += 0.1;
    }
    if p.sentence_count(text) >= 2 {
        score += 0.1;
    }

    clamp_unit(score)
}

fn context_adherence(text: &str, p: &PatternLibrary) -> f64 {
    let mut score = 0.2;

    if p.topic_preface.is_match(text) {
        score += 0.2;
    }
    if p.elaboration.is_match(text) {
        score += 0.15;
    }
    if p.example_marker.is_match(text) {
        score += 0.15;
    }
    if p.deictic.is_match(text) {
        score += 0.1;
    }

    clamp_unit(score)
}
