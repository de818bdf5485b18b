mod support;

use market_sim::ecs::{Driver, DriverState, Rider, RiderState};
use market_sim::matching::MatchOutcome;
use market_sim::runner::{run, run_with_hook, step_tick};
use market_sim::telemetry::{SimSnapshots, TelemetryConfig};
use market_sim::test_helpers::asymmetric_match_links;
use support::market::{TestMarketBuilder, TEST_TICKS_PER_MAJOR};

#[test]
fn match_links_stay_symmetric_every_tick() {
    let mut market = TestMarketBuilder::new().build();
    for tick in 0..(3 * TEST_TICKS_PER_MAJOR) {
        step_tick(&mut market, tick, TEST_TICKS_PER_MAJOR);
        let broken = asymmetric_match_links(market.world_mut());
        assert!(broken.is_empty(), "tick {tick}: asymmetric links for {broken:?}");
    }
    assert!(market.telemetry().successful_matches() > 0);
}

#[test]
fn busy_agents_are_always_matched_and_idle_agents_never_are() {
    let mut market = TestMarketBuilder::new().with_seed(9).build();
    for tick in 0..(2 * TEST_TICKS_PER_MAJOR) {
        step_tick(&mut market, tick, TEST_TICKS_PER_MAJOR);
        let world = market.world_mut();
        for driver in world.query::<&Driver>().iter(world) {
            let busy = matches!(driver.state, DriverState::DrivingToRider | DriverState::OnTrip);
            assert_eq!(busy, driver.active_match.is_some(), "driver {} at tick {tick}", driver.id);
        }
        for rider in world.query::<&Rider>().iter(world) {
            assert_eq!(
                rider.state == RiderState::Ordered,
                rider.active_match.is_some(),
                "rider {} at tick {tick}",
                rider.id
            );
        }
    }
}

#[test]
fn summary_matches_telemetry() {
    let mut market = TestMarketBuilder::new().build();
    let summary = run(&mut market, 2, TEST_TICKS_PER_MAJOR);
    let telemetry = market.telemetry();

    assert_eq!(summary.ticks, 2 * TEST_TICKS_PER_MAJOR);
    assert_eq!(summary.match_attempts, telemetry.match_attempts.len() as u64);
    assert_eq!(summary.completed_trips, telemetry.completed_trips.len() as u64);
    assert_eq!(summary.abandonments, telemetry.abandonments.len() as u64);
    let successes = telemetry
        .match_attempts
        .iter()
        .filter(|a| a.outcome.is_success())
        .count() as u64;
    assert_eq!(summary.successful_matches, successes);
    let metrics = &telemetry.metrics;
    assert_eq!(
        metrics.successful_matches + metrics.unfulfilled_no_drivers + metrics.unfulfilled_max_tries,
        metrics.total_match_attempts
    );
    assert!(summary.successful_matches >= summary.completed_trips);
    assert!(summary.events_processed > 0);
}

#[test]
fn record_limits_bound_buffers_without_changing_totals() {
    let limits = TelemetryConfig {
        max_match_attempt_records: 5,
        max_completed_trip_records: 3,
    };
    let builder = TestMarketBuilder::new().with_population(60, 2);
    let mut full = builder.clone().build();
    let mut capped = builder.with_telemetry(limits).build();
    let full_summary = run(&mut full, 3, TEST_TICKS_PER_MAJOR);
    let capped_summary = run(&mut capped, 3, TEST_TICKS_PER_MAJOR);

    assert_eq!(full_summary, capped_summary);
    assert!(capped_summary.abandonments > 0);
    assert!(capped_summary.match_attempts > 5);

    let full = full.telemetry();
    let capped = capped.telemetry();
    assert_eq!(capped.match_attempts.len(), 5);
    assert_eq!(
        capped.completed_trips.len() as u64,
        capped_summary.completed_trips.min(3)
    );
    let newest: Vec<_> = full.match_attempts.iter().rev().take(5).rev().cloned().collect();
    assert!(capped.match_attempts.iter().cloned().eq(newest));
    assert_eq!(capped.metrics, full.metrics);
}

#[test]
fn completed_trips_respect_the_trip_timeline() {
    let mut market = TestMarketBuilder::new().build();
    run(&mut market, 3, TEST_TICKS_PER_MAJOR);
    let telemetry = market.telemetry();
    assert!(!telemetry.completed_trips.is_empty());

    for trip in &telemetry.completed_trips {
        assert!(trip.matched_at <= trip.pickup_at);
        assert_eq!(trip.trip_duration(), 10);
        let attempt = telemetry
            .match_attempts
            .iter()
            .find(|a| a.order_id == trip.order_id)
            .expect("attempt for every trip");
        assert_eq!(attempt.outcome, MatchOutcome::MatchSuccessful);
        assert_eq!(attempt.matched_driver, Some(trip.driver_id));
        assert_eq!(attempt.platform_id, trip.platform_id);
        assert_eq!(attempt.tick, trip.matched_at);
    }
    assert_eq!(
        telemetry.metrics.total_completed_trips,
        telemetry.completed_trips.len() as u64
    );
}

#[test]
fn order_ids_are_unique_across_platforms() {
    let mut market = TestMarketBuilder::new().build();
    run(&mut market, 2, TEST_TICKS_PER_MAJOR);
    let mut ids: Vec<_> = market
        .telemetry()
        .match_attempts
        .iter()
        .map(|a| a.order_id)
        .collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[test]
fn abandoned_riders_never_order_again() {
    let mut market = TestMarketBuilder::new().with_population(60, 2).build();
    run(&mut market, 3, TEST_TICKS_PER_MAJOR);
    let telemetry = market.telemetry();
    assert!(!telemetry.abandonments.is_empty());

    for abandonment in &telemetry.abandonments {
        assert!(telemetry
            .match_attempts
            .iter()
            .filter(|a| a.rider_id == abandonment.rider_id)
            .all(|a| a.tick <= abandonment.tick));
    }
}

#[test]
fn snapshots_record_every_major_tick_and_whole_population() {
    let mut market = TestMarketBuilder::new().build();
    let mut hooked = 0;
    run_with_hook(&mut market, 3, TEST_TICKS_PER_MAJOR, |_, _| hooked += 1);
    assert_eq!(hooked, 3 * TEST_TICKS_PER_MAJOR);

    let snapshots = market.world().resource::<SimSnapshots>();
    let ticks: Vec<u64> = snapshots.snapshots.iter().map(|s| s.tick).collect();
    assert_eq!(ticks, vec![0, TEST_TICKS_PER_MAJOR, 2 * TEST_TICKS_PER_MAJOR]);
    for snapshot in &snapshots.snapshots {
        assert_eq!(snapshot.counts.riders(), 40);
        assert_eq!(snapshot.counts.drivers(), 15);
        assert_eq!(snapshot.multipliers.len(), 2);
    }
}
