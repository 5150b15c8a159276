//! Multi-provider prompt comparison built on the `promptscope` metrics engine
//!
//! A prompt is fanned out to every configured LLM provider; each response is
//! scored for accuracy, relevancy, coherence and completeness, ranked, and
//! stored as an experiment for later comparison.
//!
//! # Example
//!
//! ```no_run
//! use promptscope_bench::{
//!     analysis::{score_outcomes, ComparisonEngine},
//!     config::Config,
//!     providers::create_all_providers_with_config,
//!     runner::Executor,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load_or_default();
//!     let providers = create_all_providers_with_config(&config);
//!     let executor = Executor::new(providers, config.runner.executor_config());
//!
//!     let outcomes = executor.fan_out("Explain the borrow checker.").await;
//!     let responses = score_outcomes(outcomes).await;
//!
//!     let comparison = ComparisonEngine::new().compare(&responses);
//!     println!("winner: {:?}", comparison.winner);
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod experiments;
pub mod providers;
pub mod reporting;
pub mod runner;

pub use config::Config;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{
        score_outcomes, ComparisonEngine, ComparisonResult, ModelStats, ProviderScore,
    };
    pub use crate::config::{Config, ProviderConfig, ProviderKind};
    pub use crate::experiments::{
        Experiment, ExperimentStore, JsonFileStore, MemoryStore, NewExperiment, ResponseRecord,
    };
    pub use crate::providers::{
        create_all_providers_with_config, create_providers_with_config, CompletionRequest,
        CompletionResponse, LLMProvider, Message, ProviderError, ProviderResult, SharedProvider,
    };
    pub use crate::reporting::JsonSummary;
    pub use crate::runner::{Executor, ExecutorConfig, ProviderOutcome};
    pub use promptscope::{MetricsCalculator, ScoreRecord};
}
