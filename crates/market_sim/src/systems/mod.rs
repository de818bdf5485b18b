pub mod evaluation;
pub mod platform_strategy;
pub mod rider_search;
pub mod telemetry_snapshot;
pub mod trip_completion;

#[cfg(test)]
mod end_to_end_tests {
    use crate::clock::{EventAction, SimulationClock};
    use crate::ecs::{AgentId, Driver, DriverState, Position, Rider, RiderState};
    use crate::matching::MatchOutcome;
    use crate::platform::PLATFORM_A;
    use crate::scenario::BehaviorConfig;
    use crate::spatial::SpatialIndex;
    use crate::systems::evaluation::EvaluationCadence;
    use crate::test_helpers::{asymmetric_match_links, market_with_agents, DriverFixture, RiderFixture};

    #[test]
    fn simulates_one_ride_end_to_end() {
        let (mut market, (rider, driver)) = market_with_agents(BehaviorConfig::default(), |world| {
            let rider = RiderFixture::new(0).at(5, 5).searching(180).spawn(world);
            let driver = DriverFixture::new(1).at(6, 5).spawn(world);
            (rider, driver)
        });

        market.run_minor_tick();
        {
            let world = market.world_mut();
            let r = world.get::<Rider>(rider).expect("rider");
            let d = world.get::<Driver>(driver).expect("driver");
            assert_eq!(r.state, RiderState::Ordered);
            assert_eq!(d.state, DriverState::DrivingToRider);
            assert_eq!(r.active_match, d.active_match);
            assert!(asymmetric_match_links(world).is_empty());
        }
        let pickup_at = market
            .world()
            .get::<Driver>(driver)
            .and_then(|d| d.active_match.as_ref().map(|m| m.pickup_at))
            .expect("match");

        for tick in 1..=pickup_at {
            market.world_mut().resource_mut::<SimulationClock>().advance_to(tick);
            market.run_minor_tick();
        }

        let world = market.world();
        let r = world.get::<Rider>(rider).expect("rider");
        let d = world.get::<Driver>(driver).expect("driver");
        assert_eq!(r.state, RiderState::Idle);
        assert_eq!(d.state, DriverState::Idle);
        assert!(r.active_match.is_none() && d.active_match.is_none());

        let r_pos = world.get::<Position>(rider).expect("position").0;
        let d_pos = world.get::<Position>(driver).expect("position").0;
        assert_eq!(r_pos, d_pos, "rider and driver are dropped off together");
        let index = world.resource::<SpatialIndex>();
        assert_eq!(index.cell_of_agent(AgentId(0)), Some(index.cell_of(r_pos)));
        assert_eq!(index.cell_of_agent(AgentId(1)), Some(index.cell_of(d_pos)));

        let cadence = world.resource::<EvaluationCadence>();
        assert_eq!(
            cadence.due_tick(AgentId(1), EventAction::EvaluateDriverGoOnline),
            Some(pickup_at + 1)
        );
        assert_eq!(
            cadence.due_tick(AgentId(0), EventAction::EvaluateRiderSearchIntent),
            Some(pickup_at + 1)
        );

        let telemetry = market.telemetry();
        assert_eq!(telemetry.match_attempts.len(), 1);
        let attempt = &telemetry.match_attempts[0];
        assert_eq!(attempt.outcome, MatchOutcome::MatchSuccessful);
        assert_eq!(attempt.platform_id.as_str(), PLATFORM_A);
        assert!(attempt.rider_utility.is_some());
        assert_eq!(telemetry.completed_trips.len(), 1);
        let trip = &telemetry.completed_trips[0];
        assert_eq!(trip.completed_at, pickup_at);
        assert_eq!(trip.driver_id, AgentId(1));
        assert_eq!(telemetry.metrics.total_completed_trips, 1);
    }

    #[test]
    fn trip_duration_delays_completion() {
        let behavior = BehaviorConfig {
            trip_duration_ticks: 20,
            ..BehaviorConfig::default()
        };
        let (mut market, driver) = market_with_agents(behavior, |world| {
            RiderFixture::new(0).searching(180).spawn(world);
            DriverFixture::new(1).spawn(world)
        });
        market.run_minor_tick();
        let pickup_at = market
            .world()
            .get::<Driver>(driver)
            .and_then(|d| d.active_match.as_ref().map(|m| m.pickup_at))
            .expect("match");

        for tick in 1..pickup_at + 20 {
            market.world_mut().resource_mut::<SimulationClock>().advance_to(tick);
            market.run_minor_tick();
        }
        assert_eq!(
            market.world().get::<Driver>(driver).map(|d| d.state),
            Some(DriverState::DrivingToRider)
        );

        market
            .world_mut()
            .resource_mut::<SimulationClock>()
            .advance_to(pickup_at + 20);
        market.run_minor_tick();
        assert_eq!(market.world().get::<Driver>(driver).map(|d| d.state), Some(DriverState::Idle));
    }

    #[test]
    fn patience_runs_out_after_unfulfilled_ticks() {
        let (mut market, rider) = market_with_agents(BehaviorConfig::default(), |world| {
            RiderFixture::new(0).searching(180).spawn(world)
        });

        for tick in 0..179 {
            market.world_mut().resource_mut::<SimulationClock>().advance_to(tick);
            market.run_minor_tick();
        }
        let r = market.world().get::<Rider>(rider).expect("rider");
        assert_eq!(r.state, RiderState::Searching);
        assert_eq!(r.patience_timer, 1);

        market.world_mut().resource_mut::<SimulationClock>().advance_to(179);
        market.run_minor_tick();
        assert_eq!(
            market.world().get::<Rider>(rider).map(|r| r.state),
            Some(RiderState::AbandonedSearch)
        );

        for tick in 180..200 {
            market.world_mut().resource_mut::<SimulationClock>().advance_to(tick);
            market.run_minor_tick();
        }
        let telemetry = market.telemetry();
        assert_eq!(telemetry.match_attempts.len(), 180);
        assert_eq!(telemetry.abandonments.len(), 1);
        assert_eq!(telemetry.abandonments[0].tick, 179);
    }

    #[test]
    fn abandoned_rider_is_not_rescheduled() {
        let (mut market, _) = market_with_agents(BehaviorConfig::default(), |world| {
            RiderFixture::new(0)
                .state(RiderState::AbandonedSearch)
                .spawn(world)
        });
        market.handle_event(
            crate::clock::Event {
                due_tick: 0,
                action: EventAction::EvaluateRiderSearchIntent,
                agent_id: AgentId(0),
            },
            0,
        );
        assert!(market.world().resource::<SimulationClock>().is_empty());
    }

    #[test]
    fn searching_rider_without_apps_places_no_order() {
        let (mut market, rider) = market_with_agents(BehaviorConfig::default(), |world| {
            DriverFixture::new(1).spawn(world);
            RiderFixture::new(0).searching(5).spawn(world)
        });
        if let Some(mut r) = market.world_mut().get_mut::<Rider>(rider) {
            r.apps.app_a = false;
            r.apps.app_b = false;
        }
        market.run_minor_tick();
        let r = market.world().get::<Rider>(rider).expect("rider");
        assert_eq!(r.state, RiderState::Searching);
        assert_eq!(r.patience_timer, 5);
        assert!(market.telemetry().match_attempts.is_empty());
    }
}
