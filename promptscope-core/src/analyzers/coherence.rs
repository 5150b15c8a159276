//! Coherence: logical flow, transitions and thematic consistency

use std::collections::HashSet;

use super::{capped, clamp_unit, TextAnalyzer};
use crate::patterns::{paragraphs, PatternLibrary};
use crate::types::Metric;

#[derive(Debug, Clone, Copy, Default)]
pub struct CoherenceAnalyzer;

impl TextAnalyzer for CoherenceAnalyzer {
    fn metric(&self) -> Metric {
        Metric::Coherence
    }

    fn evaluate(&self, text: &str, patterns: &PatternLibrary) -> f64 {
        let paragraphs = paragraphs(text);

        let flow = logical_flow(text, &paragraphs, patterns);
        let transitions = transitions(text, patterns);
        let consistency = consistency(text, &paragraphs, patterns);

        tracing::trace!(flow, transitions, consistency, "coherence sub-scores");
        clamp_unit(flow * 0.4 + transitions * 0.3 + consistency * 0.3)
    }
}

fn logical_flow(text: &str, paragraphs: &[&str], p: &PatternLibrary) -> f64 {
    let mut score = 0.3;

    let first = paragraphs.first().copied().unwrap_or_default();
    let last = paragraphs.last().copied().unwrap_or_default();

    if p.intro_marker.is_match(first) {
        score += 0.2;
    }
    if p.conclusion_marker.is_match(last) {
        score += 0.2;
    }

    score += capped(p.sequential_marker.find_iter(text).count(), 0.1, 0.3);

    if paragraphs.len() >= 2 {
        score += 0.1;
    }

    clamp_unit(score)
}

fn transitions(text: &str, p: &PatternLibrary) -> f64 {
    let mut score = 0.2;

    let present = p.transitions.iter().filter(|re| re.is_match(text)).count();
    score += capped(present, 0.05, 0.6);

    if p.sentence_count(text) >= 2 {
        score += 0.2;
    }

    clamp_unit(score)
}

fn consistency(text: &str, paragraphs: &[&str], p: &PatternLibrary) -> f64 {
    let mut score = 0.3;

    let lowered: Vec<String> = paragraphs.iter().map(|para| para.to_lowercase()).collect();

    let overlapping_pairs = lowered
        .windows(2)
        .filter(|pair| {
            let previous: HashSet<&str> = p.words(&pair[0]).collect();
            p.words(&pair[1]).any(|word| previous.contains(word))
        })
        .count();

    let pairs = paragraphs.len().saturating_sub(1).max(1);
    score += (overlapping_pairs as f64 / pairs as f64 * 0.4).min(0.4);

    let terms: HashSet<String> = p
        .consistency_terms
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    score += capped(terms.len(), 0.05, 0.3);

    clamp_unit(score)
}
