use bevy_ecs::prelude::World;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agents::AgentDirectory;
use crate::ecs::{AgentId, Coordinate, Driver, DriverState, Match, OrderId, PlatformId, Position, Rider, RiderState};
use crate::error::{MarketError, MarketResult};
use crate::scoring::{EtaEstimator, LinearEta, LinearScoring, ScoringModel};
use crate::spatial::SpatialIndex;

use super::types::{Candidate, MatchOutcome, OrderResult};

/// Largest accepted `max_search_radius`, in rings.
pub const MAX_SEARCH_RADIUS: u32 = 1 << 16;

/// Per-platform tuning for the sequential-offer protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Maximum number of drivers offered a single order.
    pub max_order_tries: usize,
    /// Outermost ring (in cells) searched around the rider's cell.
    pub max_search_radius: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_order_tries: 3,
            max_search_radius: 3,
        }
    }
}

/// Sequential-offer matcher owned by one platform.
///
/// Candidates are idle drivers found by a ring search around the rider,
/// ordered by distance (then driver id). Each is offered the ride in turn
/// until one scores the offer as profitable or the try cap is hit.
#[derive(Debug)]
pub struct MatchingEngine {
    platform_id: PlatformId,
    config: MatcherConfig,
    scoring: Box<dyn ScoringModel>,
    eta: Box<dyn EtaEstimator>,
}

impl MatchingEngine {
    pub fn new(platform_id: PlatformId, config: MatcherConfig) -> Self {
        Self {
            platform_id,
            config,
            scoring: Box::new(LinearScoring),
            eta: Box::new(LinearEta::default()),
        }
    }

    pub fn with_scoring(mut self, scoring: Box<dyn ScoringModel>) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_eta(mut self, eta: Box<dyn EtaEstimator>) -> Self {
        self.eta = eta;
        self
    }

    pub fn platform_id(&self) -> &PlatformId {
        &self.platform_id
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn scoring(&self) -> &dyn ScoringModel {
        self.scoring.as_ref()
    }

    /// Idle drivers around `location`, nearest first, ties broken by id.
    ///
    /// The ring search holds at least one more driver than the try cap when
    /// that many are in range, which is enough to tell a capped order from an
    /// exhausted one.
    pub fn idle_candidates(&self, world: &World, location: Coordinate) -> Vec<Candidate> {
        let index = world.resource::<SpatialIndex>();
        let sufficient = self.config.max_order_tries.saturating_add(1);
        index
            .drivers_near(location, self.config.max_search_radius, sufficient, |agent| {
                world
                    .get::<Driver>(agent.entity)
                    .is_some_and(|d| d.state == DriverState::Idle)
            })
            .into_iter()
            .map(|nearby| Candidate {
                driver_id: nearby.agent.id,
                entity: nearby.agent.entity,
                distance: nearby.distance,
            })
            .collect()
    }

    /// Offer an order from `rider_id` at `fare` to nearby idle drivers.
    ///
    /// On success the driver moves to `DrivingToRider`, the rider to `Ordered`,
    /// and both hold the same [Match]. Any other outcome leaves every agent
    /// untouched.
    pub fn process_order(
        &self,
        world: &mut World,
        rider_id: AgentId,
        fare: f64,
        order_id: OrderId,
        now: u64,
    ) -> MarketResult<OrderResult> {
        let rider_entity = world
            .resource::<AgentDirectory>()
            .rider(rider_id)
            .filter(|entity| world.get::<Rider>(*entity).is_some())
            .ok_or(MarketError::AgentNotFound(rider_id))?;
        let rider_location = world
            .get::<Position>(rider_entity)
            .map(|p| p.0)
            .ok_or(MarketError::AgentNotFound(rider_id))?;

        let candidates = self.idle_candidates(world, rider_location);
        if candidates.is_empty() {
            debug!(tick = now, platform = %self.platform_id, order = %order_id, rider = %rider_id, "no idle drivers in range");
            return Ok(OrderResult::unfulfilled(MatchOutcome::UnfulfilledNoDrivers, 0));
        }

        let mut offers_made = 0;
        for candidate in &candidates {
            if offers_made >= self.config.max_order_tries {
                debug!(tick = now, platform = %self.platform_id, order = %order_id, offers_made, "order hit try cap");
                return Ok(OrderResult::unfulfilled(MatchOutcome::UnfulfilledMaxTries, offers_made));
            }
            offers_made += 1;

            let Some(profile) = world.get::<Driver>(candidate.entity).map(|d| d.profile) else {
                continue;
            };
            let eta = self.eta.eta_ticks(candidate.distance);
            let score = self.scoring.profitability(&profile, fare, eta);
            if score <= 0.0 {
                debug!(tick = now, platform = %self.platform_id, order = %order_id, driver = %candidate.driver_id, score, eta, "offer rejected");
                continue;
            }

            let matched = Match {
                driver_id: candidate.driver_id,
                rider_id,
                platform_id: self.platform_id.clone(),
                order_id,
                fare,
                matched_at: now,
                pickup_at: now + u64::from(eta),
            };
            if let Some(mut driver) = world.get_mut::<Driver>(candidate.entity) {
                driver.state = DriverState::DrivingToRider;
                driver.active_match = Some(matched.clone());
            }
            if let Some(mut rider) = world.get_mut::<Rider>(rider_entity) {
                rider.state = RiderState::Ordered;
                rider.active_match = Some(matched);
            }
            debug!(tick = now, platform = %self.platform_id, order = %order_id, driver = %candidate.driver_id, rider = %rider_id, score, eta, "offer accepted");
            return Ok(OrderResult::matched(candidate.driver_id, offers_made, eta));
        }

        Ok(OrderResult::unfulfilled(MatchOutcome::UnfulfilledNoDrivers, offers_made))
    }
}
