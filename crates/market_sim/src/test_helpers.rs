//! Test helpers for common test setup and utilities.
//!
//! Fixtures place agents at exact coordinates with exact traits, which the
//! sampled population in [crate::scenario::build_market_world] never does.

use bevy_ecs::prelude::{Entity, World};

use crate::agents::{spawn_driver, spawn_rider};
use crate::ecs::{
    AgentId, AppAccess, Coordinate, Driver, DriverProfile, DriverState, Match, Rider, RiderProfile,
    RiderState,
};
use crate::market::Market;
use crate::platform::{Platform, PlatformConfig, PLATFORM_A, PLATFORM_B};
use crate::scenario::{insert_market_resources, BehaviorConfig, MarketConfig};

/// A world holding every market resource and no agents.
pub fn create_test_world(grid_resolution: i64) -> World {
    let config = MarketConfig::default().with_grid_resolution(grid_resolution);
    let mut world = World::new();
    if let Err(err) = insert_market_resources(&mut world, &config) {
        panic!("test world: {err}");
    }
    world
}

/// A market over a hand-built population with platforms A and B at their
/// default configuration. Nothing is scheduled.
pub fn market_with_agents<R>(
    behavior: BehaviorConfig,
    setup: impl FnOnce(&mut World) -> R,
) -> (Market, R) {
    let mut world = create_test_world(10);
    world.insert_resource(behavior);
    let out = setup(&mut world);
    let mut market = Market::from_world(world);
    for id in [PLATFORM_A, PLATFORM_B] {
        let platform = match Platform::from_config(&PlatformConfig::new(id)) {
            Ok(platform) => platform,
            Err(err) => panic!("platform {id}: {err}"),
        };
        if let Err(err) = market.register_platform(platform) {
            panic!("register {id}: {err}");
        }
    }
    (market, out)
}

pub struct RiderFixture {
    rider: Rider,
    location: Coordinate,
}

impl RiderFixture {
    pub fn new(id: u64) -> Self {
        Self {
            rider: Rider::new(
                AgentId(id),
                AppAccess {
                    app_a: true,
                    app_b: true,
                },
                RiderProfile {
                    preference_score: 0.5,
                    price_sensitivity: 0.5,
                    time_sensitivity: 0.5,
                    rides_per_week: 3.0,
                },
            ),
            location: Coordinate::new(5, 5),
        }
    }

    pub fn at(mut self, x: i64, y: i64) -> Self {
        self.location = Coordinate::new(x, y);
        self
    }

    pub fn apps(mut self, app_a: bool, app_b: bool) -> Self {
        self.rider.apps = AppAccess { app_a, app_b };
        self
    }

    pub fn preference(mut self, preference_score: f64) -> Self {
        self.rider.profile.preference_score = preference_score;
        self
    }

    pub fn rides_per_week(mut self, rides_per_week: f64) -> Self {
        self.rider.profile.rides_per_week = rides_per_week;
        self
    }

    pub fn state(mut self, state: RiderState) -> Self {
        self.rider.state = state;
        self
    }

    /// Start searching with the given patience.
    pub fn searching(mut self, patience: i32) -> Self {
        self.rider.state = RiderState::Searching;
        self.rider.patience_timer = patience;
        self
    }

    pub fn spawn(self, world: &mut World) -> Entity {
        spawn_rider(world, self.rider, self.location)
    }
}

pub struct DriverFixture {
    driver: Driver,
    location: Coordinate,
}

impl DriverFixture {
    /// An idle driver at (5, 5) who accepts any short pickup at a fare of 10.
    pub fn new(id: u64) -> Self {
        let mut driver = Driver::new(
            AgentId(id),
            false,
            DriverProfile {
                preference_score: 0.0,
                price_sensitivity: 0.5,
                eta_sensitivity: 0.5,
            },
        );
        driver.state = DriverState::Idle;
        Self {
            driver,
            location: Coordinate::new(5, 5),
        }
    }

    pub fn at(mut self, x: i64, y: i64) -> Self {
        self.location = Coordinate::new(x, y);
        self
    }

    pub fn sensitivities(mut self, price: f64, eta: f64) -> Self {
        self.driver.profile.price_sensitivity = price;
        self.driver.profile.eta_sensitivity = eta;
        self
    }

    pub fn state(mut self, state: DriverState) -> Self {
        self.driver.state = state;
        self
    }

    pub fn spawn(self, world: &mut World) -> Entity {
        spawn_driver(world, self.driver, self.location)
    }
}

/// Every match held by a rider is held, identically, by its driver and vice
/// versa. Returns the offending agents.
pub fn asymmetric_match_links(world: &mut World) -> Vec<AgentId> {
    let riders: Vec<(AgentId, Option<Match>)> = world
        .query::<&Rider>()
        .iter(world)
        .map(|r| (r.id, r.active_match.clone()))
        .collect();
    let drivers: Vec<(AgentId, Option<Match>)> = world
        .query::<&Driver>()
        .iter(world)
        .map(|d| (d.id, d.active_match.clone()))
        .collect();

    let mut broken = Vec::new();
    for (id, matched) in &riders {
        if let Some(m) = matched {
            let paired = drivers.iter().find(|(d, _)| *d == m.driver_id);
            if m.rider_id != *id || paired.map(|(_, dm)| dm.as_ref()) != Some(Some(m)) {
                broken.push(*id);
            }
        }
    }
    for (id, matched) in &drivers {
        if let Some(m) = matched {
            let paired = riders.iter().find(|(r, _)| *r == m.rider_id);
            if m.driver_id != *id || paired.map(|(_, rm)| rm.as_ref()) != Some(Some(m)) {
                broken.push(*id);
            }
        }
    }
    broken
}
