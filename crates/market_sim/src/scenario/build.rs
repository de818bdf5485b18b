use bevy_ecs::prelude::{Mut, World};
use tracing::info;

use crate::agents::{spawn_driver, spawn_rider, AgentDirectory};
use crate::clock::{EventAction, SimulationClock};
use crate::ecs::{AgentId, AppAccess, Driver, DriverProfile, Rider, RiderProfile};
use crate::error::MarketResult;
use crate::platform::Platforms;
use crate::profiling::{EventMetrics, SystemTimings};
use crate::rng::SimRng;
use crate::scenario::params::{
    DriverPopulationConfig, MarketConfig, NormalParams, RiderPopulationConfig,
};
use crate::spatial::SpatialIndex;
use crate::systems::evaluation::{schedule_evaluation, EvaluationCadence};
use crate::systems::rider_search::OrderSequence;
use crate::telemetry::{SimSnapshotConfig, SimSnapshots, SimTelemetry};

fn sample_preference(rng: &mut SimRng, params: NormalParams) -> f64 {
    rng.normal(params.mean, params.std_dev).clamp(-1.0, 1.0)
}

fn sample_non_negative(rng: &mut SimRng, params: NormalParams) -> f64 {
    rng.normal(params.mean, params.std_dev).max(0.0)
}

pub fn sample_rider(rng: &mut SimRng, id: AgentId, config: &RiderPopulationConfig) -> Rider {
    let apps = AppAccess {
        app_a: rng.gen_bool(config.app_a_share),
        app_b: rng.gen_bool(config.app_b_share),
    };
    let profile = RiderProfile {
        preference_score: sample_preference(rng, config.preference_score),
        price_sensitivity: sample_non_negative(rng, config.price_sensitivity),
        time_sensitivity: sample_non_negative(rng, config.time_sensitivity),
        rides_per_week: sample_non_negative(rng, config.rides_per_week),
    };
    Rider::new(id, apps, profile)
}

pub fn sample_driver(rng: &mut SimRng, id: AgentId, config: &DriverPopulationConfig) -> Driver {
    let is_exclusive = rng.gen_bool(config.exclusive_share);
    let profile = DriverProfile {
        preference_score: sample_preference(rng, config.preference_score),
        price_sensitivity: sample_non_negative(rng, config.price_sensitivity),
        eta_sensitivity: sample_non_negative(rng, config.eta_sensitivity),
    };
    Driver::new(id, is_exclusive, profile)
}

/// Insert every market resource into a fresh world. No agents, no platforms.
pub fn insert_market_resources(world: &mut World, config: &MarketConfig) -> MarketResult<()> {
    world.insert_resource(SimulationClock::default());
    world.insert_resource(SpatialIndex::with_resolution(config.grid_resolution)?);
    world.insert_resource(AgentDirectory::default());
    world.insert_resource(SimRng::new(config.seed));
    world.insert_resource(config.behavior);
    world.insert_resource(config.simulation);
    world.insert_resource(Platforms::default());
    world.insert_resource(EvaluationCadence::default());
    world.insert_resource(OrderSequence::default());
    world.insert_resource(SimTelemetry::with_limits(config.telemetry));
    world.insert_resource(SimSnapshotConfig::default());
    world.insert_resource(SimSnapshots::default());
    world.insert_resource(EventMetrics::default());
    world.insert_resource(SystemTimings::default());
    Ok(())
}

/// Build the market world: resources, the sampled population and the first
/// evaluation event for every agent at tick 0.
///
/// Riders take ids `0..initial_riders`, drivers the ids after them. Drivers
/// start offline, riders idle, all placed uniformly in the market extent.
pub fn build_market_world(config: &MarketConfig) -> MarketResult<World> {
    config.validate()?;
    let mut world = World::new();
    insert_market_resources(&mut world, config)?;

    let extent = config.behavior.world_extent;
    for i in 0..config.initial_riders {
        let id = AgentId(i as u64);
        let (rider, location) = {
            let mut rng = world.resource_mut::<SimRng>();
            let rider = sample_rider(&mut rng, id, &config.riders);
            (rider, rng.coordinate(extent))
        };
        spawn_rider(&mut world, rider, location);
    }
    for i in 0..config.initial_drivers {
        let id = AgentId((config.initial_riders + i) as u64);
        let (driver, location) = {
            let mut rng = world.resource_mut::<SimRng>();
            let driver = sample_driver(&mut rng, id, &config.drivers);
            (driver, rng.coordinate(extent))
        };
        spawn_driver(&mut world, driver, location);
    }

    world.resource_scope(|world, mut clock: Mut<SimulationClock>| {
        let mut cadence = world.resource_mut::<EvaluationCadence>();
        for i in 0..config.initial_riders {
            schedule_evaluation(
                &mut clock,
                &mut cadence,
                0,
                EventAction::EvaluateRiderSearchIntent,
                AgentId(i as u64),
            );
        }
        for i in 0..config.initial_drivers {
            schedule_evaluation(
                &mut clock,
                &mut cadence,
                0,
                EventAction::EvaluateDriverGoOnline,
                AgentId((config.initial_riders + i) as u64),
            );
        }
    });

    info!(
        riders = config.initial_riders,
        drivers = config.initial_drivers,
        grid_resolution = config.grid_resolution,
        seed = config.seed,
        "market population built"
    );
    Ok(world)
}
