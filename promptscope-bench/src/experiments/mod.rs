//! Experiments: one prompt, the responses it produced, and their scores

pub mod store;

pub use store::{ExperimentStore, JsonFileStore, MemoryStore, StoreError};

use chrono::{DateTime, Utc};
use promptscope::ScoreRecord;
use serde::{Deserialize, Serialize};

use crate::runner::ProviderOutcome;

/// One provider's answer as stored with an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub llm_name: String,
    #[serde(default)]
    pub model: Option<String>,
    /// The response, or the error message when the call failed
    pub response_text: String,
    pub response_time_ms: u64,
    #[serde(default)]
    pub error: Option<String>,
    /// Present only for successful responses
    #[serde(default)]
    pub metrics: Option<ScoreRecord>,
}

impl ResponseRecord {
    pub fn from_outcome(outcome: ProviderOutcome, metrics: Option<ScoreRecord>) -> Self {
        let error = outcome.error_message;
        let response_text = outcome
            .response_text
            .or_else(|| error.clone())
            .unwrap_or_default();

        Self {
            llm_name: outcome.provider_name,
            model: outcome.model,
            response_text,
            response_time_ms: outcome.elapsed_ms,
            metrics: if error.is_none() { metrics } else { None },
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A stored experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: u64,
    pub prompt: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub responses: Vec<ResponseRecord>,
}

/// An experiment not yet assigned an id
#[derive(Debug, Clone, Default)]
pub struct NewExperiment {
    pub prompt: String,
    pub description: Option<String>,
    pub responses: Vec<ResponseRecord>,
}

impl NewExperiment {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_responses(mut self, responses: Vec<ResponseRecord>) -> Self {
        self.responses = responses;
        self
    }

    /// Assign an id and timestamps
    pub fn into_experiment(self, id: u64, now: DateTime<Utc>) -> Experiment {
        Experiment {
            id,
            prompt: self.prompt,
            description: self.description,
            created_at: now,
            updated_at: now,
            responses: self.responses,
        }
    }
}
