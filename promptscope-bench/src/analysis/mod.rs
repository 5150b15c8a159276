//! Response scoring and comparison

pub mod comparator;
pub mod scoring;

pub use comparator::{ComparisonEngine, ComparisonResult, ModelStats, ProviderScore};
pub use scoring::{score_outcome, score_outcomes};
