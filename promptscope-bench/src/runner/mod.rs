//! Provider fan-out engine

pub mod executor;
pub mod rate_limiter;

pub use executor::{Executor, ExecutorConfig, ProviderOutcome};
pub use rate_limiter::RateLimiter;
