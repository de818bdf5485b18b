use bevy_ecs::prelude::{Query, Res, ResMut, Without};
use tracing::{debug, warn};

use crate::agents::{AgentDirectory, AgentKind};
use crate::clock::{EventAction, SimulationClock};
use crate::ecs::{Coordinate, Driver, DriverState, Position, Rider, RiderState};
use crate::rng::SimRng;
use crate::scenario::BehaviorConfig;
use crate::spatial::{IndexedAgent, SpatialIndex};
use crate::systems::evaluation::{schedule_evaluation, EvaluationCadence};
use crate::telemetry::{CompletedTripRecord, SimTelemetry};

/// Move an agent's index entry to `dropoff`, re-inserting it if the index
/// had lost track of it.
fn reindex(index: &mut SpatialIndex, agent: IndexedAgent, dropoff: Coordinate, now: u64) {
    if !index.relocate(agent.id, dropoff) {
        warn!(tick = now, agent = %agent.id, "agent missing from spatial index, re-inserted");
        index.insert(agent, dropoff);
    }
}

/// Release every driver whose trip is done, with their rider.
///
/// Both agents are dropped off together at a random point in the market,
/// re-indexed, unlinked, set idle and re-evaluated on the next tick.
#[allow(clippy::too_many_arguments)]
pub fn trip_completion_system(
    behavior: Res<BehaviorConfig>,
    directory: Res<AgentDirectory>,
    mut clock: ResMut<SimulationClock>,
    mut cadence: ResMut<EvaluationCadence>,
    mut rng: ResMut<SimRng>,
    mut index: ResMut<SpatialIndex>,
    mut telemetry: ResMut<SimTelemetry>,
    mut drivers: Query<(&mut Driver, &mut Position), Without<Rider>>,
    mut riders: Query<(&mut Rider, &mut Position), Without<Driver>>,
) {
    let now = clock.now();
    let mut finished: Vec<_> = drivers
        .iter()
        .filter_map(|(driver, _)| {
            let matched = driver.active_match.as_ref()?;
            (driver.state == DriverState::DrivingToRider
                && matched.pickup_at.saturating_add(behavior.trip_duration_ticks) <= now)
                .then(|| matched.clone())
        })
        .collect();
    finished.sort_by_key(|m| m.driver_id);

    for matched in finished {
        let dropoff = rng.coordinate(behavior.world_extent);

        if let Some(entity) = directory.driver(matched.driver_id) {
            if let Ok((mut driver, mut position)) = drivers.get_mut(entity) {
                driver.active_match = None;
                driver.state = DriverState::Idle;
                position.0 = dropoff;
                reindex(
                    &mut index,
                    IndexedAgent {
                        id: matched.driver_id,
                        entity,
                        kind: AgentKind::Driver,
                    },
                    dropoff,
                    now,
                );
            }
        }

        match directory
            .rider(matched.rider_id)
            .and_then(|entity| Some((entity, riders.get_mut(entity).ok()?)))
        {
            Some((entity, (mut rider, mut position))) => {
                if rider.active_match.as_ref() == Some(&matched) {
                    rider.active_match = None;
                    rider.state = RiderState::Idle;
                    position.0 = dropoff;
                    reindex(
                        &mut index,
                        IndexedAgent {
                            id: matched.rider_id,
                            entity,
                            kind: AgentKind::Rider,
                        },
                        dropoff,
                        now,
                    );
                } else {
                    warn!(tick = now, order = %matched.order_id, rider = %matched.rider_id, "rider no longer holds the completed match");
                }
            }
            None => {
                warn!(tick = now, order = %matched.order_id, rider = %matched.rider_id, "completed trip references unknown rider");
            }
        }

        schedule_evaluation(
            &mut clock,
            &mut cadence,
            1,
            EventAction::EvaluateDriverGoOnline,
            matched.driver_id,
        );
        schedule_evaluation(
            &mut clock,
            &mut cadence,
            1,
            EventAction::EvaluateRiderSearchIntent,
            matched.rider_id,
        );

        debug!(
            tick = now,
            order = %matched.order_id,
            driver = %matched.driver_id,
            rider = %matched.rider_id,
            x = dropoff.x,
            y = dropoff.y,
            "trip completed"
        );
        telemetry.record_completed_trip(CompletedTripRecord {
            order_id: matched.order_id,
            rider_id: matched.rider_id,
            driver_id: matched.driver_id,
            platform_id: matched.platform_id,
            fare: matched.fare,
            matched_at: matched.matched_at,
            pickup_at: matched.pickup_at,
            completed_at: now,
        });
    }
}
