//! Scenario setup: typed market configuration and the population builder.
//!
//! Configuration is plain serde data with defaults and `with_*` builders;
//! [build_market_world] validates it and samples riders and drivers from the
//! configured distributions with the run's seeded RNG.

mod build;
mod params;

pub use build::{build_market_world, insert_market_resources, sample_driver, sample_rider};
pub use params::{
    BehaviorConfig, DriverPopulationConfig, MarketConfig, NormalParams, RiderPopulationConfig,
    SimulationConfig,
};
