use bevy_ecs::prelude::{Entity, Mut, Resource, World};
use tracing::{debug, warn};

use crate::clock::SimulationClock;
use crate::ecs::{AgentId, AppAccess, OrderId, PlatformId, Rider, RiderProfile, RiderState};
use crate::platform::{Platforms, PLATFORM_A, PLATFORM_B};
use crate::telemetry::{AbandonmentRecord, MatchAttemptRecord, SimTelemetry};

/// Monotonic order id source shared by all platforms.
#[derive(Debug, Default, Resource)]
pub struct OrderSequence(u64);

impl OrderSequence {
    pub fn next(&mut self) -> OrderId {
        self.0 += 1;
        OrderId(self.0)
    }

    pub fn issued(&self) -> u64 {
        self.0
    }
}

/// Platform a rider orders from: A when they hold it and lean towards it, B
/// when they hold it and do not lean to A, otherwise whichever app they hold.
pub fn choose_platform(apps: AppAccess, preference_score: f64) -> Option<&'static str> {
    if apps.app_a && preference_score > 0.0 {
        Some(PLATFORM_A)
    } else if apps.app_b && preference_score <= 0.0 {
        Some(PLATFORM_B)
    } else if apps.app_a {
        Some(PLATFORM_A)
    } else if apps.app_b {
        Some(PLATFORM_B)
    } else {
        None
    }
}

/// Signed weight applied to the rider's preference score in utility.
pub fn preference_weight(platform_id: &PlatformId) -> f64 {
    match platform_id.as_str() {
        PLATFORM_A => 1.0,
        PLATFORM_B => -1.0,
        _ => 0.0,
    }
}

struct SearchingRider {
    id: AgentId,
    apps: AppAccess,
    profile: RiderProfile,
}

/// One order per searching rider, in ascending rider id order.
///
/// Unfulfilled orders cost one tick of patience; a rider out of patience
/// abandons for the rest of the run.
pub fn rider_search_system(world: &mut World) {
    let now = world.resource::<SimulationClock>().now();
    let mut searching: Vec<(SearchingRider, Entity)> = world
        .query::<(Entity, &Rider)>()
        .iter(world)
        .filter(|(_, rider)| rider.state == RiderState::Searching)
        .map(|(entity, rider)| {
            (
                SearchingRider {
                    id: rider.id,
                    apps: rider.apps,
                    profile: rider.profile,
                },
                entity,
            )
        })
        .collect();
    if searching.is_empty() {
        return;
    }
    searching.sort_by_key(|(rider, _)| rider.id);

    world.resource_scope(|world, mut platforms: Mut<Platforms>| {
        for (rider, entity) in searching {
            let Some(name) = choose_platform(rider.apps, rider.profile.preference_score) else {
                continue;
            };
            let Some(platform) = platforms.by_name_mut(name) else {
                continue;
            };

            let fare = platform.current_fare();
            let order_id = world.resource_mut::<OrderSequence>().next();
            let result = match platform
                .engine
                .process_order(world, rider.id, fare, order_id, now)
            {
                Ok(result) => result,
                Err(err) => {
                    warn!(tick = now, rider = %rider.id, error = %err, "order skipped");
                    continue;
                }
            };
            platform.pricing.record_attempt(result.outcome.is_success());

            let rider_utility = result.pickup_eta.map(|eta| {
                platform.engine.scoring().utility(
                    &rider.profile,
                    fare,
                    eta,
                    preference_weight(&platform.id),
                )
            });
            debug!(
                tick = now,
                rider = %rider.id,
                platform = %platform.id,
                order = %order_id,
                outcome = %result.outcome,
                offers = result.offers_made,
                "match attempt"
            );
            world
                .resource_mut::<SimTelemetry>()
                .record_match_attempt(MatchAttemptRecord {
                    tick: now,
                    rider_id: rider.id,
                    platform_id: platform.id.clone(),
                    order_id,
                    fare,
                    outcome: result.outcome,
                    offers_made: result.offers_made,
                    matched_driver: result.matched_driver,
                    rider_utility,
                });

            if result.outcome.is_success() {
                continue;
            }

            let abandoned = match world.get_mut::<Rider>(entity) {
                Some(mut state) => {
                    state.patience_timer -= 1;
                    if state.patience_timer <= 0 {
                        state.state = RiderState::AbandonedSearch;
                        true
                    } else {
                        false
                    }
                }
                None => false,
            };
            if abandoned {
                debug!(tick = now, rider = %rider.id, "rider abandoned search");
                world
                    .resource_mut::<SimTelemetry>()
                    .record_abandonment(AbandonmentRecord {
                        tick: now,
                        rider_id: rider.id,
                    });
            }
        }
    });
}
