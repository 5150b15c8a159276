//! PromptScope - heuristic metrics for language-model responses
//!
//! Scores raw response text along four dimensions (accuracy, relevancy,
//! coherence, completeness). Every score is a deterministic function of the text
//! and lies in `[0, 1]`.
//!
//! # Example
//!
//! ```rust
//! use promptscope::{Metric, MetricsCalculator};
//!
//! let calc = MetricsCalculator::new();
//! let record = calc.calculate("Here's how it works: the server caches each response.");
//!
//! let accuracy = record.get(Metric::Accuracy).unwrap();
//! assert!((0.0..=1.0).contains(&accuracy));
//!
//! // empty text scores zero, it is not treated as missing
//! assert_eq!(calc.calculate("").coherence_score, Some(0.0));
//! ```

pub mod analyzers;
pub mod patterns;

mod calculator;
mod types;

pub use analyzers::{
    AccuracyAnalyzer, CoherenceAnalyzer, CompletenessAnalyzer, RelevancyAnalyzer, TextAnalyzer,
};
pub use calculator::{validate_score, MetricsCalculator};
pub use patterns::PatternLibrary;
pub use types::{Metric, MetricsError, Result, ScoreRecord};

/// Score `text` with a default calculator
pub fn calculate(text: &str) -> ScoreRecord {
    MetricsCalculator::new().calculate(text)
}
