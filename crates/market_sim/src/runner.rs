//! Simulation runner: advances the clock tick by tick and routes due events
//! into the market.
//!
//! Each tick delivers every event due at that tick in insertion order
//! (including events scheduled for the same tick while delivering), then runs
//! the minor-tick passes, then the major-tick passes on major boundaries.

use bevy_ecs::prelude::Schedule;
use bevy_ecs::schedule::IntoSystemConfigs;
use tracing::info;

use crate::clock::{format_tick, SimulationClock};
use crate::market::Market;
use crate::profiling::EventMetrics;
use crate::scenario::SimulationConfig;
use crate::systems::{
    platform_strategy::platform_strategy_system, rider_search::rider_search_system,
    telemetry_snapshot::capture_snapshot_system, trip_completion::trip_completion_system,
};

/// Passes run on every tick: rider search, then trip completion.
pub fn minor_tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((rider_search_system, trip_completion_system).chain());
    schedule
}

/// Passes run on major-tick boundaries: strategy update, then snapshot.
pub fn major_tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((platform_strategy_system, capture_snapshot_system).chain());
    schedule
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub ticks: u64,
    pub events_processed: u64,
    pub events_superseded: u64,
    pub match_attempts: u64,
    pub successful_matches: u64,
    pub completed_trips: u64,
    pub abandonments: u64,
}

impl RunSummary {
    fn collect(market: &Market, ticks: u64) -> Self {
        let metrics = market.world().resource::<EventMetrics>();
        let telemetry = market.telemetry();
        Self {
            ticks,
            events_processed: metrics.events_processed,
            events_superseded: metrics.events_superseded,
            match_attempts: telemetry.metrics.total_match_attempts,
            successful_matches: telemetry.metrics.successful_matches,
            completed_trips: telemetry.metrics.total_completed_trips,
            abandonments: telemetry.metrics.total_abandonments,
        }
    }
}

/// Run one tick: deliver due events, minor passes, major passes on boundaries.
/// Returns the number of events delivered.
pub fn step_tick(market: &mut Market, tick: u64, ticks_per_major: u64) -> usize {
    market
        .world_mut()
        .resource_mut::<SimulationClock>()
        .advance_to(tick);

    let mut delivered = 0;
    while let Some(event) = market
        .world_mut()
        .resource_mut::<SimulationClock>()
        .pop_due(tick)
    {
        market.handle_event(event, tick);
        delivered += 1;
    }

    market.run_minor_tick();
    if tick % ticks_per_major.max(1) == 0 {
        market.run_major_tick();
    }
    delivered
}

/// Run ticks `start..end`, calling `hook` after every tick.
pub fn run_ticks_with_hook<F>(
    market: &mut Market,
    start: u64,
    end: u64,
    ticks_per_major: u64,
    mut hook: F,
) where
    F: FnMut(&Market, u64),
{
    let ticks_per_major = ticks_per_major.max(1);
    let minor_tick_secs = market
        .world()
        .get_resource::<SimulationConfig>()
        .map_or(10, |c| c.minor_tick_secs);
    for tick in start..end {
        step_tick(market, tick, ticks_per_major);
        hook(market, tick);
        if (tick + 1) % ticks_per_major == 0 {
            let telemetry = market.telemetry();
            info!(
                day = (tick + 1) / ticks_per_major,
                at = %format_tick(tick + 1, ticks_per_major, minor_tick_secs),
                attempts = telemetry.metrics.total_match_attempts,
                completed_trips = telemetry.metrics.total_completed_trips,
                abandonments = telemetry.metrics.total_abandonments,
                "day complete"
            );
        }
    }
}

/// Run ticks `start..end`.
pub fn run_ticks(market: &mut Market, start: u64, end: u64, ticks_per_major: u64) {
    run_ticks_with_hook(market, start, end, ticks_per_major, |_, _| {});
}

/// Run `duration_days × ticks_per_major` ticks from tick 0, calling `hook`
/// after every tick.
pub fn run_with_hook<F>(
    market: &mut Market,
    duration_days: u64,
    ticks_per_major: u64,
    hook: F,
) -> RunSummary
where
    F: FnMut(&Market, u64),
{
    let total = duration_days.saturating_mul(ticks_per_major);
    run_ticks_with_hook(market, 0, total, ticks_per_major, hook);
    RunSummary::collect(market, total)
}

/// Run `duration_days × ticks_per_major` ticks from tick 0.
pub fn run(market: &mut Market, duration_days: u64, ticks_per_major: u64) -> RunSummary {
    run_with_hook(market, duration_days, ticks_per_major, |_, _| {})
}
