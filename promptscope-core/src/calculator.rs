//! Metrics calculator: runs the four analyzers and assembles a [`ScoreRecord`]

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::analyzers::{
    AccuracyAnalyzer, CoherenceAnalyzer, CompletenessAnalyzer, RelevancyAnalyzer, TextAnalyzer,
};
use crate::types::{Metric, MetricsError, Result, ScoreRecord};

/// Stateless scorer combining the four analyzers.
///
/// Every call re-derives the record from the text; nothing is cached between
/// calls. The calculator is `Copy` and can be shared freely across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCalculator {
    accuracy: AccuracyAnalyzer,
    relevancy: RelevancyAnalyzer,
    coherence: CoherenceAnalyzer,
    completeness: CompletenessAnalyzer,
}

impl MetricsCalculator {
    pub const fn new() -> Self {
        Self {
            accuracy: AccuracyAnalyzer,
            relevancy: RelevancyAnalyzer,
            coherence: CoherenceAnalyzer,
            completeness: CompletenessAnalyzer,
        }
    }

    /// The registered analyzers, in [`Metric::ALL`] order
    pub fn analyzers(&self) -> [&dyn TextAnalyzer; 4] {
        [
            &self.accuracy,
            &self.relevancy,
            &self.coherence,
            &self.completeness,
        ]
    }

    pub fn analyzer(&self, metric: Metric) -> &dyn TextAnalyzer {
        match metric {
            Metric::Accuracy => &self.accuracy,
            Metric::Relevancy => &self.relevancy,
            Metric::Coherence => &self.coherence,
            Metric::Completeness => &self.completeness,
        }
    }

    /// Score a single metric; failures score 0
    pub fn score_metric(&self, metric: Metric, text: &str) -> f64 {
        guarded(self.analyzer(metric), text)
            .map(validate_score)
            .unwrap_or(0.0)
    }

    /// Score `text`. Never panics; an internal failure yields an all-null record.
    pub fn calculate(&self, text: &str) -> ScoreRecord {
        self.try_calculate(text).unwrap_or_else(fold_error)
    }

    /// Score possibly absent text; `None` yields an all-null record
    pub fn calculate_optional(&self, text: Option<&str>) -> ScoreRecord {
        match text {
            Some(text) => self.calculate(text),
            None => fold_error(MetricsError::InvalidInput("no response text".to_string())),
        }
    }

    /// Score raw bytes; input that is not UTF-8 yields an all-null record
    pub fn calculate_bytes(&self, bytes: &[u8]) -> ScoreRecord {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.calculate(text),
            Err(e) => fold_error(MetricsError::InvalidInput(format!(
                "response is not valid UTF-8: {}",
                e
            ))),
        }
    }

    /// Score `text`, surfacing internal failures instead of folding them
    pub fn try_calculate(&self, text: &str) -> Result<ScoreRecord> {
        let mut record = ScoreRecord::zeroed();
        for analyzer in self.analyzers() {
            let score = guarded(analyzer, text)?;
            record.set(analyzer.metric(), validate_score(score));
        }

        tracing::debug!(
            accuracy = record.accuracy_score,
            relevancy = record.relevancy_score,
            coherence = record.coherence_score,
            completeness = record.completeness_score,
            chars = text.len(),
            "calculated metrics"
        );
        Ok(record)
    }

    /// Same result as [`calculate`](Self::calculate), with one scoped thread per analyzer
    pub fn calculate_concurrent(&self, text: &str) -> ScoreRecord {
        let outcome = std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .analyzers()
                .into_iter()
                .map(|analyzer| scope.spawn(move || (analyzer.metric(), guarded(analyzer, text))))
                .collect();

            let mut record = ScoreRecord::zeroed();
            for handle in handles {
                let (metric, score) = handle.join().map_err(|payload| {
                    MetricsError::InternalComputationFailure(panic_message(payload.as_ref()))
                })?;
                record.set(metric, validate_score(score?));
            }
            Ok(record)
        });

        outcome.unwrap_or_else(fold_error)
    }
}

/// NaN becomes 0; everything else is clamped to `[0, 1]`
pub fn validate_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Run one analyzer, converting a panic into an internal failure
fn guarded(analyzer: &dyn TextAnalyzer, text: &str) -> Result<f64> {
    panic::catch_unwind(AssertUnwindSafe(|| analyzer.try_analyze(text))).unwrap_or_else(|payload| {
        Err(MetricsError::InternalComputationFailure(format!(
            "{} analyzer panicked: {}",
            analyzer.metric(),
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn fold_error(error: MetricsError) -> ScoreRecord {
    tracing::warn!(%error, "metrics unavailable, returning empty record");
    ScoreRecord::all_null()
}
