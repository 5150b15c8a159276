//! Cross-provider comparison and per-model statistics

use indexmap::IndexMap;
use promptscope::{Metric, ScoreRecord};
use serde::{Deserialize, Serialize};

use crate::experiments::{Experiment, ResponseRecord};

/// Score for a provider within one experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderScore {
    pub provider: String,
    pub composite_score: f64,
    pub scores: ScoreRecord,
    pub response_time_ms: u64,
}

/// Result of comparing the responses of one experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub providers_ranked: Vec<String>,
    pub scores_by_provider: Vec<ProviderScore>,
    /// Providers whose call failed or produced no score
    pub unscored: Vec<String>,
    pub winner: Option<String>,
    pub margin: Option<f64>,
}

/// Running totals for one model across experiments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub total_responses: u64,
    pub total_time_ms: u64,
    pub valid_time_responses: u64,
    pub total_accuracy: f64,
    pub total_relevancy: f64,
    pub total_coherence: f64,
    pub total_completeness: f64,
    /// Responses carrying at least one valid metric
    pub successful_responses: u64,
}

impl ModelStats {
    pub fn record(&mut self, response: &ResponseRecord) {
        self.total_responses += 1;
        self.total_time_ms += response.response_time_ms;
        self.valid_time_responses += 1;

        let Some(metrics) = &response.metrics else {
            return;
        };

        let mut has_valid = false;
        for (metric, value) in metrics.iter() {
            let Some(value) = value.filter(|v| v.is_finite()) else {
                continue;
            };
            *self.total_mut(metric) += value;
            has_valid = true;
        }
        if has_valid {
            self.successful_responses += 1;
        }
    }

    pub fn total(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Accuracy => self.total_accuracy,
            Metric::Relevancy => self.total_relevancy,
            Metric::Coherence => self.total_coherence,
            Metric::Completeness => self.total_completeness,
        }
    }

    fn total_mut(&mut self, metric: Metric) -> &mut f64 {
        match metric {
            Metric::Accuracy => &mut self.total_accuracy,
            Metric::Relevancy => &mut self.total_relevancy,
            Metric::Coherence => &mut self.total_coherence,
            Metric::Completeness => &mut self.total_completeness,
        }
    }

    /// Metric total over successful responses, `None` when there are none
    pub fn average(&self, metric: Metric) -> Option<f64> {
        (self.successful_responses > 0)
            .then(|| self.total(metric) / self.successful_responses as f64)
    }

    pub fn avg_time_ms(&self) -> Option<f64> {
        (self.valid_time_responses > 0)
            .then(|| self.total_time_ms as f64 / self.valid_time_responses as f64)
    }
}

/// Comparison engine for scored responses
#[derive(Debug, Default)]
pub struct ComparisonEngine;

impl ComparisonEngine {
    pub fn new() -> Self {
        Self
    }

    /// Rank the scored responses of one experiment by composite score
    pub fn compare(&self, responses: &[ResponseRecord]) -> ComparisonResult {
        let mut unscored = Vec::new();
        let mut provider_scores: Vec<ProviderScore> = Vec::new();

        for response in responses {
            let composite = response.metrics.as_ref().and_then(ScoreRecord::composite);
            match (response.metrics, composite) {
                (Some(scores), Some(composite_score)) => provider_scores.push(ProviderScore {
                    provider: response.llm_name.clone(),
                    composite_score,
                    scores,
                    response_time_ms: response.response_time_ms,
                }),
                _ => unscored.push(response.llm_name.clone()),
            }
        }

        // Stable sort keeps provider order among ties
        provider_scores.sort_by(|a, b| {
            b.composite_score
                .partial_cmp(&a.composite_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let providers_ranked: Vec<String> =
            provider_scores.iter().map(|s| s.provider.clone()).collect();
        let winner = provider_scores.first().map(|s| s.provider.clone());
        let margin = match provider_scores.as_slice() {
            [first, second, ..] => Some(first.composite_score - second.composite_score),
            _ => None,
        };

        ComparisonResult {
            providers_ranked,
            scores_by_provider: provider_scores,
            unscored,
            winner,
            margin,
        }
    }

    /// Per-model statistics across experiments, in first-seen order
    pub fn aggregate(&self, experiments: &[Experiment]) -> IndexMap<String, ModelStats> {
        let mut stats: IndexMap<String, ModelStats> = IndexMap::new();

        for experiment in experiments {
            for response in &experiment.responses {
                stats
                    .entry(response.llm_name.clone())
                    .or_default()
                    .record(response);
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiments::NewExperiment;
    use chrono::Utc;

    fn scored(name: &str, scores: ScoreRecord, ms: u64) -> ResponseRecord {
        ResponseRecord {
            llm_name: name.to_string(),
            model: None,
            response_text: "text".to_string(),
            response_time_ms: ms,
            error: None,
            metrics: Some(scores),
        }
    }

    fn failed(name: &str) -> ResponseRecord {
        ResponseRecord {
            llm_name: name.to_string(),
            model: None,
            response_text: "API error".to_string(),
            response_time_ms: 0,
            error: Some("API error".to_string()),
            metrics: None,
        }
    }

    fn uniform(value: f64) -> ScoreRecord {
        ScoreRecord {
            accuracy_score: Some(value),
            relevancy_score: Some(value),
            coherence_score: Some(value),
            completeness_score: Some(value),
        }
    }

    #[test]
    fn test_compare_ranks_by_composite() {
        let engine = ComparisonEngine::new();
        let result = engine.compare(&[
            scored("gemini", uniform(0.4), 100),
            failed("groq"),
            scored("anthropic", uniform(0.7), 200),
        ]);

        assert_eq!(result.providers_ranked, vec!["anthropic", "gemini"]);
        assert_eq!(result.winner.as_deref(), Some("anthropic"));
        assert!((result.margin.unwrap() - 0.3).abs() < 1e-9);
        assert_eq!(result.unscored, vec!["groq"]);
    }

    #[test]
    fn test_compare_single_response_has_no_margin() {
        let result = ComparisonEngine::new().compare(&[scored("gemini", uniform(0.5), 1)]);
        assert_eq!(result.winner.as_deref(), Some("gemini"));
        assert!(result.margin.is_none());
    }

    #[test]
    fn test_aggregate_averages() {
        let partial = ScoreRecord {
            accuracy_score: Some(0.2),
            ..ScoreRecord::all_null()
        };
        let experiment = NewExperiment::new("p")
            .with_responses(vec![
                scored("gemini", uniform(0.5), 100),
                scored("gemini", partial, 300),
                failed("gemini"),
                scored("groq", ScoreRecord::all_null(), 50),
            ])
            .into_experiment(1, Utc::now());

        let stats = ComparisonEngine::new().aggregate(&[experiment]);
        let names: Vec<&String> = stats.keys().collect();
        assert_eq!(names, vec!["gemini", "groq"]);

        let gemini = &stats["gemini"];
        assert_eq!(gemini.total_responses, 3);
        assert_eq!(gemini.valid_time_responses, 3);
        assert_eq!(gemini.successful_responses, 2);
        // failures keep their zero latency in the time average
        assert!((gemini.avg_time_ms().unwrap() - 400.0 / 3.0).abs() < 1e-9);
        assert!((gemini.average(Metric::Accuracy).unwrap() - 0.35).abs() < 1e-9);
        // totals are divided by every successful response, not per metric
        assert!((gemini.average(Metric::Relevancy).unwrap() - 0.25).abs() < 1e-9);

        let groq = &stats["groq"];
        assert_eq!(groq.successful_responses, 0);
        assert!(groq.average(Metric::Accuracy).is_none());
        assert_eq!(groq.avg_time_ms(), Some(50.0));
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(ComparisonEngine::new().aggregate(&[]).is_empty());
    }
}
