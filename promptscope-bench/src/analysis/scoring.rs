//! Scoring glue between provider outcomes and the metrics calculator

use promptscope::{MetricsCalculator, ScoreRecord};

use crate::experiments::ResponseRecord;
use crate::runner::ProviderOutcome;

/// Score one outcome; failures carry no metrics
pub fn score_outcome(calculator: &MetricsCalculator, outcome: ProviderOutcome) -> ResponseRecord {
    let metrics = outcome
        .response_text
        .as_deref()
        .filter(|_| outcome.error_message.is_none())
        .map(|text| calculator.calculate(text));
    ResponseRecord::from_outcome(outcome, metrics)
}

/// Score every outcome on the blocking pool, one job per response.
///
/// Records come back in the order of `outcomes`.
pub async fn score_outcomes(outcomes: Vec<ProviderOutcome>) -> Vec<ResponseRecord> {
    let calculator = MetricsCalculator::new();

    let handles: Vec<_> = outcomes
        .into_iter()
        .map(|outcome| {
            let name = outcome.provider_name.clone();
            let succeeded = outcome.error_message.is_none();
            let handle =
                tokio::task::spawn_blocking(move || score_outcome(&calculator, outcome));
            (name, succeeded, handle)
        })
        .collect();

    let mut records = Vec::with_capacity(handles.len());
    for (name, succeeded, handle) in handles {
        match handle.await {
            Ok(record) => {
                if let Some(metrics) = &record.metrics {
                    tracing::debug!(
                        provider = %name,
                        composite = ?metrics.composite(),
                        "Scored response"
                    );
                }
                records.push(record);
            }
            Err(e) => {
                tracing::warn!("Scoring job for {} failed: {}", name, e);
                records.push(scoring_failure(name, succeeded, e));
            }
        }
    }

    records
}

/// Record for a response whose scoring job did not complete.
///
/// A successful response keeps its success with all-null scores; the
/// response itself went down with the job.
fn scoring_failure(
    provider: String,
    succeeded: bool,
    error: impl std::fmt::Display,
) -> ResponseRecord {
    if succeeded {
        ResponseRecord {
            llm_name: provider,
            model: None,
            response_text: String::new(),
            response_time_ms: 0,
            error: None,
            metrics: Some(ScoreRecord::all_null()),
        }
    } else {
        let outcome = ProviderOutcome::failure(provider, format!("scoring failed: {}", error));
        ResponseRecord::from_outcome(outcome, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(name: &str, text: &str, ms: u64) -> ProviderOutcome {
        ProviderOutcome {
            provider_name: name.to_string(),
            model: Some("m".to_string()),
            response_text: Some(text.to_string()),
            elapsed_ms: ms,
            error_message: None,
        }
    }

    #[test]
    fn test_score_outcome_matches_calculator() {
        let calculator = MetricsCalculator::new();
        let text = "First, install the toolchain.\n\nThen, run the build. However, check the logs.";
        let record = score_outcome(&calculator, ok("gemini", text, 10));

        assert_eq!(record.metrics, Some(calculator.calculate(text)));
    }

    #[test]
    fn test_failed_outcome_is_not_scored() {
        let calculator = MetricsCalculator::new();
        let record = score_outcome(&calculator, ProviderOutcome::failure("groq", "boom"));
        assert!(record.metrics.is_none());
        assert_eq!(record.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_failed_scoring_job_keeps_provider() {
        let handle = tokio::task::spawn_blocking(|| -> ResponseRecord { panic!("analyzer blew up") });
        let error = handle.await.unwrap_err();

        let scored = scoring_failure("gemini".to_string(), true, &error);
        assert_eq!(scored.llm_name, "gemini");
        assert!(scored.is_success());
        assert_eq!(scored.metrics, Some(ScoreRecord::all_null()));

        let failed = scoring_failure("groq".to_string(), false, &error);
        assert_eq!(failed.llm_name, "groq");
        assert!(!failed.is_success());
        assert!(failed.metrics.is_none());
        assert!(failed.response_text.starts_with("scoring failed:"));
        assert_eq!(failed.error.as_deref(), Some(failed.response_text.as_str()));
    }

    #[tokio::test]
    async fn test_score_outcomes_keeps_order() {
        let outcomes = vec![
            ok("a", "Short answer.", 5),
            ProviderOutcome::failure("b", "timeout"),
            ok("c", "", 7),
        ];

        let records = score_outcomes(outcomes).await;
        let names: Vec<&str> = records.iter().map(|r| r.llm_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        assert!(records[0].metrics.is_some());
        assert!(records[1].metrics.is_none());
        // an empty but successful response scores zero, not null
        assert_eq!(records[2].metrics, Some(ScoreRecord::zeroed()));
    }
}
