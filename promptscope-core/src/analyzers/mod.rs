//! Heuristic analyzers
//!
//! Each analyzer turns response text into a single score in `[0, 1]` by summing
//! capped bonuses over a small set of private sub-scores. Analyzers hold no state
//! and can run in any order or concurrently.

pub mod accuracy;
pub mod coherence;
pub mod completeness;
pub mod relevancy;

pub use accuracy::AccuracyAnalyzer;
pub use coherence::CoherenceAnalyzer;
pub use completeness::CompletenessAnalyzer;
pub use relevancy::RelevancyAnalyzer;

use crate::patterns::PatternLibrary;
use crate::types::{Metric, Result};

/// A scorer for one metric
pub trait TextAnalyzer: Send + Sync {
    /// The metric this analyzer produces
    fn metric(&self) -> Metric;

    /// Score non-empty `text` using the compiled `patterns`
    fn evaluate(&self, text: &str, patterns: &PatternLibrary) -> f64;

    /// Score `text`, reporting pattern-library failures. Empty text scores 0.
    fn try_analyze(&self, text: &str) -> Result<f64> {
        if text.is_empty() {
            return Ok(0.0);
        }
        let patterns = PatternLibrary::global()?;
        Ok(self.evaluate(text, patterns))
    }

    /// Score `text`; any failure scores 0
    fn analyze(&self, text: &str) -> f64 {
        self.try_analyze(text).unwrap_or(0.0)
    }
}

/// `count` occurrences worth `per` each, capped at `cap`
pub(crate) fn capped(count: usize, per: f64, cap: f64) -> f64 {
    (count as f64 * per).min(cap)
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capped() {
        assert_eq!(capped(0, 0.05, 0.3), 0.0);
        assert_eq!(capped(2, 0.1, 0.3), 0.2);
        assert_eq!(capped(10, 0.1, 0.3), 0.3);
    }

    #[test]
    fn test_empty_text_scores_zero_everywhere() {
        let analyzers: [&dyn TextAnalyzer; 4] = [
            &AccuracyAnalyzer,
            &RelevancyAnalyzer,
            &CoherenceAnalyzer,
            &CompletenessAnalyzer,
        ];
        for analyzer in analyzers {
            assert_eq!(analyzer.analyze(""), 0.0, "{}", analyzer.metric());
            assert_eq!(analyzer.try_analyze(""), Ok(0.0));
        }
    }
}
