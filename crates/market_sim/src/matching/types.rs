use std::fmt;

use bevy_ecs::prelude::Entity;

use crate::ecs::AgentId;

/// Result tag of one order. Unfulfilled orders are ordinary outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchOutcome {
    MatchSuccessful,
    UnfulfilledNoDrivers,
    UnfulfilledMaxTries,
}

impl MatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MatchOutcome::MatchSuccessful)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOutcome::MatchSuccessful => "MATCH_SUCCESSFUL",
            MatchOutcome::UnfulfilledNoDrivers => "UNFULFILLED_NO_DRIVERS",
            MatchOutcome::UnfulfilledMaxTries => "UNFULFILLED_MAX_TRIES",
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An idle driver considered for an order, with its distance to the rider.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub driver_id: AgentId,
    pub entity: Entity,
    pub distance: f64,
}

/// What `process_order` hands back: the matched driver exists iff the
/// outcome is [MatchOutcome::MatchSuccessful].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderResult {
    pub matched_driver: Option<AgentId>,
    pub outcome: MatchOutcome,
    /// Number of drivers that were offered the ride.
    pub offers_made: usize,
    /// Pickup ETA (ticks) of the accepting driver.
    pub pickup_eta: Option<u32>,
}

impl OrderResult {
    pub fn matched(driver: AgentId, offers_made: usize, pickup_eta: u32) -> Self {
        Self {
            matched_driver: Some(driver),
            outcome: MatchOutcome::MatchSuccessful,
            offers_made,
            pickup_eta: Some(pickup_eta),
        }
    }

    pub fn unfulfilled(outcome: MatchOutcome, offers_made: usize) -> Self {
        debug_assert!(!outcome.is_success());
        Self {
            matched_driver: None,
            outcome,
            offers_made,
            pickup_eta: None,
        }
    }
}
