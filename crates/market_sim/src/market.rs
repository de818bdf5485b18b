//! Market orchestrator: owns the ECS world and applies events and tick passes.
//!
//! Events are dispatched by [Market::handle_event]; each action has its own
//! schedule holding its handler system, which reads the event from
//! [CurrentEvent]. The per-tick passes live in two further schedules built by
//! [crate::runner].

use std::time::Instant;

use bevy_ecs::prelude::{Schedule, World};
use tracing::{trace, warn};

use crate::agents::AgentDirectory;
use crate::clock::{CurrentEvent, Event, EventAction, SimulationClock};
use crate::error::{MarketError, MarketResult};
use crate::platform::{Platform, Platforms};
use crate::profiling::{EventMetrics, SystemTimings};
use crate::runner::{major_tick_schedule, minor_tick_schedule};
use crate::scenario::{build_market_world, MarketConfig};
use crate::systems::evaluation::{
    driver_go_online_system, rider_search_intent_system, EvaluationCadence,
};
use crate::telemetry::SimTelemetry;

pub struct Market {
    world: World,
    driver_go_online: Schedule,
    rider_search_intent: Schedule,
    minor_schedule: Schedule,
    major_schedule: Schedule,
}

impl Market {
    /// Build the population and register the configured platforms.
    pub fn new(config: &MarketConfig) -> MarketResult<Self> {
        let platforms = config
            .platforms
            .iter()
            .map(Platform::from_config)
            .collect::<MarketResult<Vec<_>>>()?;
        Self::with_platforms(config, platforms)
    }

    /// Like [Market::new], with prebuilt platforms (custom scoring or ETA).
    pub fn with_platforms(config: &MarketConfig, platforms: Vec<Platform>) -> MarketResult<Self> {
        if platforms.is_empty() {
            return Err(MarketError::NoPlatforms);
        }
        let mut market = Self::from_world(build_market_world(config)?);
        for platform in platforms {
            market.register_platform(platform)?;
        }
        Ok(market)
    }

    /// Wrap a world that already holds the market resources
    /// (see [crate::scenario::insert_market_resources]).
    pub fn from_world(world: World) -> Self {
        let mut driver_go_online = Schedule::default();
        driver_go_online.add_systems(driver_go_online_system);
        let mut rider_search_intent = Schedule::default();
        rider_search_intent.add_systems(rider_search_intent_system);
        Self {
            world,
            driver_go_online,
            rider_search_intent,
            minor_schedule: minor_tick_schedule(),
            major_schedule: major_tick_schedule(),
        }
    }

    pub fn register_platform(&mut self, platform: Platform) -> MarketResult<()> {
        self.world.resource_mut::<Platforms>().register(platform)
    }

    /// Apply one delivered event. Events for unknown agents and superseded
    /// evaluations are logged and dropped.
    pub fn handle_event(&mut self, event: Event, current_tick: u64) {
        {
            let mut clock = self.world.resource_mut::<SimulationClock>();
            if clock.now() < current_tick {
                clock.advance_to(current_tick);
            }
        }
        if self.world.resource::<AgentDirectory>().get(event.agent_id).is_none() {
            warn!(tick = current_tick, agent = %event.agent_id, action = ?event.action, "event for unknown agent ignored");
            return;
        }
        if !self.world.resource_mut::<EvaluationCadence>().claim(&event) {
            trace!(tick = current_tick, agent = %event.agent_id, action = ?event.action, "superseded evaluation dropped");
            self.world.resource_mut::<EventMetrics>().record_superseded();
            return;
        }

        self.world
            .resource_mut::<EventMetrics>()
            .record_event(event.action);
        self.world.insert_resource(CurrentEvent(event));
        match event.action {
            EventAction::EvaluateDriverGoOnline => self.driver_go_online.run(&mut self.world),
            EventAction::EvaluateRiderSearchIntent => {
                self.rider_search_intent.run(&mut self.world)
            }
        }
        self.world.remove_resource::<CurrentEvent>();
    }

    /// Rider search then trip completion, once per tick.
    pub fn run_minor_tick(&mut self) {
        let start = Instant::now();
        self.minor_schedule.run(&mut self.world);
        self.world
            .resource_mut::<SystemTimings>()
            .record("minor_tick", start.elapsed());
    }

    /// Platform strategy update then a state snapshot, on major-tick boundaries.
    pub fn run_major_tick(&mut self) {
        let start = Instant::now();
        self.major_schedule.run(&mut self.world);
        self.world
            .resource_mut::<SystemTimings>()
            .record("major_tick", start.elapsed());
    }

    pub fn now(&self) -> u64 {
        self.world.resource::<SimulationClock>().now()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn telemetry(&self) -> &SimTelemetry {
        self.world.resource::<SimTelemetry>()
    }

    pub fn platforms(&self) -> &Platforms {
        self.world.resource::<Platforms>()
    }
}
