//! Score record, metric identifiers and error types

use serde::{Deserialize, Serialize};

/// Errors raised while scoring a response.
///
/// The calculator never surfaces these from its infallible entry points; they are
/// only visible through [`crate::MetricsCalculator::try_calculate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal computation failure: {0}")]
    InternalComputationFailure(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;

/// One of the four scored dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Accuracy,
    Relevancy,
    Coherence,
    Completeness,
}

impl Metric {
    /// All metrics, in record order
    pub const ALL: [Metric; 4] = [
        Metric::Accuracy,
        Metric::Relevancy,
        Metric::Coherence,
        Metric::Completeness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Relevancy => "relevancy",
            Metric::Coherence => "coherence",
            Metric::Completeness => "completeness",
        }
    }

    /// Field name used when the score is persisted
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy_score",
            Metric::Relevancy => "relevancy_score",
            Metric::Coherence => "coherence_score",
            Metric::Completeness => "completeness_score",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accuracy" | "accuracy_score" => Ok(Metric::Accuracy),
            "relevancy" | "relevance" | "relevancy_score" => Ok(Metric::Relevancy),
            "coherence" | "coherence_score" => Ok(Metric::Coherence),
            "completeness" | "completeness_score" => Ok(Metric::Completeness),
            _ => Err(format!("Unknown metric: {}", s)),
        }
    }
}

/// Scores for one response.
///
/// Every present field lies in `[0, 1]`; `None` means the score could not be
/// computed. Field names match the persisted column names.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub accuracy_score: Option<f64>,
    pub relevancy_score: Option<f64>,
    pub coherence_score: Option<f64>,
    pub completeness_score: Option<f64>,
}

impl ScoreRecord {
    /// Record with every score absent
    pub const fn all_null() -> Self {
        Self {
            accuracy_score: None,
            relevancy_score: None,
            coherence_score: None,
            completeness_score: None,
        }
    }

    /// Record with every score present and zero
    pub const fn zeroed() -> Self {
        Self {
            accuracy_score: Some(0.0),
            relevancy_score: Some(0.0),
            coherence_score: Some(0.0),
            completeness_score: Some(0.0),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Accuracy => self.accuracy_score,
            Metric::Relevancy => self.relevancy_score,
            Metric::Coherence => self.coherence_score,
            Metric::Completeness => self.completeness_score,
        }
    }

    pub(crate) fn set(&mut self, metric: Metric, value: f64) {
        let slot = match metric {
            Metric::Accuracy => &mut self.accuracy_score,
            Metric::Relevancy => &mut self.relevancy_score,
            Metric::Coherence => &mut self.coherence_score,
            Metric::Completeness => &mut self.completeness_score,
        };
        *slot = Some(value);
    }

    /// Iterate over `(metric, score)` pairs in record order
    pub fn iter(&self) -> impl Iterator<Item = (Metric, Option<f64>)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    /// Mean of the present scores, `None` when none are present
    pub fn composite(&self) -> Option<f64> {
        let present: Vec<f64> = self.iter().filter_map(|(_, v)| v).collect();
        if present.is_empty() {
            None
        } else {
            Some(present.iter().sum::<f64>() / present.len() as f64)
        }
    }

    /// True when all four scores are present
    pub fn is_complete(&self) -> bool {
        self.iter().all(|(_, v)| v.is_some())
    }

    /// True when no score is present
    pub fn is_null(&self) -> bool {
        self.iter().all(|(_, v)| v.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parse() {
        assert_eq!("Accuracy".parse::<Metric>(), Ok(Metric::Accuracy));
        assert_eq!("relevance".parse::<Metric>(), Ok(Metric::Relevancy));
        assert_eq!("coherence_score".parse::<Metric>(), Ok(Metric::Coherence));
        assert!("fluency".parse::<Metric>().is_err());
    }

    #[test]
    fn test_composite_skips_absent_scores() {
        let record = ScoreRecord {
            accuracy_score: Some(0.5),
            relevancy_score: None,
            coherence_score: Some(1.0),
            completeness_score: None,
        };
        assert_eq!(record.composite(), Some(0.75));
        assert!(!record.is_complete());
        assert_eq!(ScoreRecord::all_null().composite(), None);
        assert!(ScoreRecord::default().is_null());
    }

    #[test]
    fn test_serializes_with_column_names() {
        let json = serde_json::to_value(ScoreRecord {
            accuracy_score: Some(0.25),
            ..ScoreRecord::all_null()
        })
        .unwrap();

        assert_eq!(json["accuracy_score"], 0.25);
        assert!(json["relevancy_score"].is_null());
        for metric in Metric::ALL {
            assert!(json.get(metric.column()).is_some());
        }
    }
}
