pub mod engine;
pub mod types;

pub use engine::{MatcherConfig, MatchingEngine, MAX_SEARCH_RADIUS};
pub use types::{Candidate, MatchOutcome, OrderResult};
