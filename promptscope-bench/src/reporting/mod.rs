//! Console and JSON reporting

use indexmap::IndexMap;
use promptscope::{Metric, ScoreRecord};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

use crate::analysis::{ComparisonResult, ModelStats};
use crate::experiments::{Experiment, ResponseRecord};

const PREVIEW_CHARS: usize = 60;

/// JSON summary of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Store id, absent for unsaved runs
    pub experiment_id: Option<u64>,
    pub timestamp: String,
    pub prompt: String,
    pub winner: Option<String>,
    pub margin: Option<f64>,
    pub responses: Vec<ResponseRecord>,
}

impl JsonSummary {
    pub fn new(
        experiment_id: Option<u64>,
        prompt: impl Into<String>,
        responses: Vec<ResponseRecord>,
        comparison: &ComparisonResult,
    ) -> Self {
        Self {
            experiment_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            prompt: prompt.into(),
            winner: comparison.winner.clone(),
            margin: comparison.margin,
            responses,
        }
    }

    /// Write to JSON file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

/// `value / count` as a percentage with one decimal, "N/A" when `count` is 0
pub fn format_metric(total: f64, count: u64) -> String {
    if count == 0 {
        return "N/A".to_string();
    }
    format!("{:.1}%", total / count as f64 * 100.0)
}

/// Mean latency in whole milliseconds, "N/A" when `count` is 0
pub fn format_time(total_ms: u64, count: u64) -> String {
    if count == 0 {
        return "N/A".to_string();
    }
    format!("{:.0}ms", total_ms as f64 / count as f64)
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(v) => format!("{:.1}%", v * 100.0),
        None => "N/A".to_string(),
    }
}

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

/// Scores of one response, one metric per line
pub fn render_scores(scores: &ScoreRecord) -> String {
    let mut out = String::new();
    for (metric, value) in scores.iter() {
        let _ = writeln!(out, "  {:<14}{:>8}", metric.as_str(), format_score(value));
    }
    let _ = writeln!(out, "  {:<14}{:>8}", "composite", format_score(scores.composite()));
    out
}

/// Side-by-side table for the responses of one run
pub fn render_comparison(responses: &[ResponseRecord], comparison: &ComparisonResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n=== Response Comparison ===\n");
    let _ = writeln!(
        out,
        "{:<14}{:>10}{:>10}{:>10}{:>10}{:>14}{:>10}",
        "Provider", "Accuracy", "Relevancy", "Coherence", "Complete", "Composite", "Time"
    );
    let _ = writeln!(out, "{:-<78}", "");

    for response in responses {
        match (&response.error, &response.metrics) {
            (None, Some(scores)) => {
                let _ = writeln!(
                    out,
                    "{:<14}{:>10}{:>10}{:>10}{:>10}{:>14}{:>10}",
                    response.llm_name,
                    format_score(scores.accuracy_score),
                    format_score(scores.relevancy_score),
                    format_score(scores.coherence_score),
                    format_score(scores.completeness_score),
                    format_score(scores.composite()),
                    format!("{}ms", response.response_time_ms),
                );
            }
            (error, _) => {
                let reason = error.as_deref().unwrap_or("not scored");
                let _ = writeln!(out, "{:<14}  error: {}", response.llm_name, preview(reason));
            }
        }
    }

    let _ = writeln!(out, "{:-<78}", "");
    match (&comparison.winner, comparison.margin) {
        (Some(winner), Some(margin)) => {
            let _ = writeln!(out, "Winner: {} (margin {:.3})", winner, margin);
        }
        (Some(winner), None) => {
            let _ = writeln!(out, "Winner: {}", winner);
        }
        (None, _) => {
            let _ = writeln!(out, "No scored responses");
        }
    }
    out
}

/// Experiment list, as returned by the store
pub fn render_history(experiments: &[Experiment]) -> String {
    if experiments.is_empty() {
        return "No experiments stored\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:>5}  {:<20}  {:>9}  Prompt", "ID", "Created", "Responses");
    let _ = writeln!(out, "{:-<78}", "");
    for experiment in experiments {
        let _ = writeln!(
            out,
            "{:>5}  {:<20}  {:>9}  {}",
            experiment.id,
            experiment.created_at.format("%Y-%m-%d %H:%M:%S"),
            experiment.responses.len(),
            preview(&experiment.prompt)
        );
    }
    out
}

/// Full view of one experiment
pub fn render_experiment(experiment: &Experiment) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Experiment {}", experiment.id);
    let _ = writeln!(out, "Created: {}", experiment.created_at.to_rfc3339());
    if let Some(description) = &experiment.description {
        let _ = writeln!(out, "Description: {}", description);
    }
    let _ = writeln!(out, "Prompt:\n{}\n", experiment.prompt);

    for response in &experiment.responses {
        let _ = writeln!(out, "{:=<60}", "");
        let model = response.model.as_deref().unwrap_or("-");
        let _ = writeln!(
            out,
            "{} ({}) {}ms",
            response.llm_name, model, response.response_time_ms
        );
        match &response.error {
            Some(error) => {
                let _ = writeln!(out, "Error: {}", error);
            }
            None => {
                if let Some(scores) = &response.metrics {
                    out.push_str(&render_scores(scores));
                }
                let _ = writeln!(out, "\n{}", response.response_text);
            }
        }
    }
    out
}

/// Per-model averages across stored experiments
pub fn render_model_stats(stats: &IndexMap<String, ModelStats>) -> String {
    if stats.is_empty() {
        return "No responses recorded\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "\n=== Model Performance ===\n");
    let _ = writeln!(
        out,
        "{:<14}{:>10}{:>10}{:>10}{:>10}{:>10}{:>14}",
        "Model", "Responses", "Avg Time", "Accuracy", "Relevancy", "Coherence", "Completeness"
    );
    let _ = writeln!(out, "{:-<78}", "");

    for (name, s) in stats {
        let metric = |m: Metric| format_metric(s.total(m), s.successful_responses);
        let _ = writeln!(
            out,
            "{:<14}{:>10}{:>10}{:>10}{:>10}{:>10}{:>14}",
            name,
            s.total_responses,
            format_time(s.total_time_ms, s.valid_time_responses),
            metric(Metric::Accuracy),
            metric(Metric::Relevancy),
            metric(Metric::Coherence),
            metric(Metric::Completeness),
        );
    }
    out
}
