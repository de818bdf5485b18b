//! Handlers for the two evaluation events, plus the bookkeeping that keeps
//! one live evaluation chain per agent and action.

use std::collections::HashMap;

use bevy_ecs::prelude::{Query, Res, ResMut, Resource};
use tracing::{debug, warn};

use crate::agents::AgentDirectory;
use crate::clock::{CurrentEvent, Event, EventAction, SimulationClock};
use crate::ecs::{AgentId, Driver, DriverState, Rider, RiderState};
use crate::rng::SimRng;
use crate::scenario::BehaviorConfig;
use crate::telemetry::SimTelemetry;

/// Due tick of the live evaluation event for each (agent, action).
///
/// Arming a new evaluation supersedes the pending one; superseded events are
/// dropped on delivery.
#[derive(Debug, Default, Resource)]
pub struct EvaluationCadence {
    due: HashMap<(AgentId, EventAction), u64>,
}

impl EvaluationCadence {
    pub fn arm(&mut self, agent_id: AgentId, action: EventAction, due_tick: u64) {
        self.due.insert((agent_id, action), due_tick);
    }

    /// Take ownership of a delivered event. `false` means a newer evaluation
    /// superseded it and it must be ignored. Events that were never armed
    /// (scheduled straight onto the clock) are always accepted.
    pub fn claim(&mut self, event: &Event) -> bool {
        let key = (event.agent_id, event.action);
        match self.due.get(&key) {
            Some(&due) if due != event.due_tick => false,
            Some(_) => {
                self.due.remove(&key);
                true
            }
            None => true,
        }
    }

    pub fn due_tick(&self, agent_id: AgentId, action: EventAction) -> Option<u64> {
        self.due.get(&(agent_id, action)).copied()
    }

    pub fn retire(&mut self, agent_id: AgentId, action: EventAction) {
        self.due.remove(&(agent_id, action));
    }
}

/// Queue an evaluation `delay` ticks from now and make it the live one.
pub fn schedule_evaluation(
    clock: &mut SimulationClock,
    cadence: &mut EvaluationCadence,
    delay: u64,
    action: EventAction,
    agent_id: AgentId,
) -> u64 {
    let due_tick = clock.schedule_in(delay, action, agent_id);
    cadence.arm(agent_id, action, due_tick);
    due_tick
}

/// Offline drivers may come online, idle drivers may go offline. Busy drivers
/// are left alone. The driver is always re-evaluated after a fixed interval.
#[allow(clippy::too_many_arguments)]
pub fn driver_go_online_system(
    event: Res<CurrentEvent>,
    behavior: Res<BehaviorConfig>,
    directory: Res<AgentDirectory>,
    mut clock: ResMut<SimulationClock>,
    mut cadence: ResMut<EvaluationCadence>,
    mut rng: ResMut<SimRng>,
    mut telemetry: ResMut<SimTelemetry>,
    mut drivers: Query<&mut Driver>,
) {
    let event = event.0;
    if event.action != EventAction::EvaluateDriverGoOnline {
        return;
    }
    let now = clock.now();
    let Some(mut driver) = directory
        .driver(event.agent_id)
        .and_then(|entity| drivers.get_mut(entity).ok())
    else {
        warn!(tick = now, agent = %event.agent_id, "go-online evaluation for unknown driver");
        return;
    };

    match driver.state {
        DriverState::Offline => {
            if rng.gen_bool(behavior.go_online_probability) {
                driver.state = DriverState::Idle;
                telemetry.metrics.track_driver_online(driver.id);
                debug!(tick = now, driver = %driver.id, "driver online");
            }
        }
        DriverState::Idle => {
            if rng.gen_bool(behavior.go_offline_probability) {
                driver.state = DriverState::Offline;
                debug!(tick = now, driver = %driver.id, "driver offline");
            }
        }
        DriverState::DrivingToRider | DriverState::OnTrip => {}
    }

    schedule_evaluation(
        &mut clock,
        &mut cadence,
        behavior.go_online_reeval_interval,
        EventAction::EvaluateDriverGoOnline,
        event.agent_id,
    );
}

/// Idle riders with at least one app may start searching. The next
/// evaluation follows an exponential interval; abandoned riders get none.
#[allow(clippy::too_many_arguments)]
pub fn rider_search_intent_system(
    event: Res<CurrentEvent>,
    behavior: Res<BehaviorConfig>,
    directory: Res<AgentDirectory>,
    mut clock: ResMut<SimulationClock>,
    mut cadence: ResMut<EvaluationCadence>,
    mut rng: ResMut<SimRng>,
    mut telemetry: ResMut<SimTelemetry>,
    mut riders: Query<&mut Rider>,
) {
    let event = event.0;
    if event.action != EventAction::EvaluateRiderSearchIntent {
        return;
    }
    let now = clock.now();
    let Some(mut rider) = directory
        .rider(event.agent_id)
        .and_then(|entity| riders.get_mut(entity).ok())
    else {
        warn!(tick = now, agent = %event.agent_id, "search-intent evaluation for unknown rider");
        return;
    };

    if rider.state == RiderState::AbandonedSearch {
        cadence.retire(event.agent_id, EventAction::EvaluateRiderSearchIntent);
        return;
    }

    if rider.state == RiderState::Idle
        && rider.apps.any()
        && rng.gen_bool(behavior.search_probability(rider.profile.rides_per_week))
    {
        rider.state = RiderState::Searching;
        rider.patience_timer = behavior.patience_ticks;
        telemetry.metrics.track_rider_search(rider.id);
        debug!(tick = now, rider = %rider.id, patience = rider.patience_timer, "rider searching");
    }

    let delay = rng.exponential_ticks(behavior.mean_evaluation_interval());
    schedule_evaluation(
        &mut clock,
        &mut cadence,
        delay,
        EventAction::EvaluateRiderSearchIntent,
        event.agent_id,
    );
}
