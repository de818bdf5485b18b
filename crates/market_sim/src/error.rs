//! Market error type.
//!
//! Configuration problems surface from [crate::market::Market::new] before the
//! run starts. Business outcomes such as an unfulfilled order are never errors;
//! they are returned as [crate::matching::MatchOutcome] values.

use thiserror::Error;

use crate::ecs::AgentId;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("grid resolution must be positive, got {0}")]
    InvalidGridResolution(i64),

    #[error("distribution `{name}` is invalid: {reason}")]
    InvalidDistribution { name: &'static str, reason: String },

    #[error("probability `{name}` must be within [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("configuration error: {0}")]
    InvalidConfig(String),

    #[error("platform `{0}` is already registered")]
    DuplicatePlatform(String),

    #[error("no platforms registered")]
    NoPlatforms,

    #[error("cannot schedule event at tick {due_tick}: clock is already at tick {now}")]
    ScheduledInPast { due_tick: u64, now: u64 },

    #[error("agent {0} not found")]
    AgentNotFound(AgentId),
}

pub type MarketResult<T> = Result<T, MarketError>;
