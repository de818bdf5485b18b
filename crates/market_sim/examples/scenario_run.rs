//! Run a two-platform market for a few simulated days and print the KPIs.
//!
//! Run with: cargo run -p market_sim --example scenario_run
//! Set `RUST_LOG=market_sim=debug` for per-order logs.

use market_sim::market::Market;
use market_sim::profiling::{EventMetrics, SystemTimings};
use market_sim::runner::run;
use market_sim::scenario::{BehaviorConfig, MarketConfig};
use market_sim::telemetry::SimSnapshots;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("market_sim=info")),
        )
        .init();

    const NUM_RIDERS: usize = 2000;
    const NUM_DRIVERS: usize = 300;
    const DAYS: u64 = 3;

    let config = MarketConfig::default()
        .with_seed(123)
        .with_population(NUM_RIDERS, NUM_DRIVERS)
        .with_grid_resolution(20)
        .with_behavior(BehaviorConfig {
            go_online_probability: 0.3,
            trip_duration_ticks: 90,
            world_extent: 400,
            ..BehaviorConfig::default()
        })
        .with_duration_days(DAYS);
    let mut market = Market::new(&config).expect("market config");
    let summary = run(
        &mut market,
        config.simulation.duration_days,
        config.simulation.ticks_per_major,
    );

    println!(
        "--- Market run ({} riders, {} drivers, {} days, seed {}) ---",
        NUM_RIDERS, NUM_DRIVERS, DAYS, config.seed
    );
    println!("Ticks: {}", summary.ticks);
    println!(
        "Events processed: {} ({} superseded)",
        summary.events_processed, summary.events_superseded
    );
    println!(
        "Match attempts: {}  successful: {}  completed trips: {}  abandonments: {}",
        summary.match_attempts,
        summary.successful_matches,
        summary.completed_trips,
        summary.abandonments
    );

    let telemetry = market.telemetry();
    for platform in market.platforms().iter() {
        let attempts: Vec<_> = telemetry
            .match_attempts
            .iter()
            .filter(|a| a.platform_id == platform.id)
            .collect();
        let matched = attempts.iter().filter(|a| a.outcome.is_success()).count();
        let rate = if attempts.is_empty() {
            0.0
        } else {
            matched as f64 / attempts.len() as f64
        };
        println!(
            "Platform {}: {:.1}% of its last {} recorded attempts matched, fare now {:.2}",
            platform.id,
            rate * 100.0,
            attempts.len(),
            platform.current_fare()
        );
    }

    let metrics = &telemetry.metrics;
    println!(
        "Unfulfilled: {} no drivers, {} out of tries",
        metrics.unfulfilled_no_drivers, metrics.unfulfilled_max_tries
    );
    println!(
        "Unique drivers online: {}  with trips: {}  riders searching: {}  with trips: {}",
        metrics.online_drivers.len(),
        metrics.active_drivers.len(),
        metrics.searching_riders.len(),
        metrics.riders_with_completed_trips.len()
    );

    if let Some(snapshot) = market.world().resource::<SimSnapshots>().latest() {
        println!("Last snapshot at tick {}: {:?}", snapshot.tick, snapshot.counts);
    }

    let events = market.world().resource::<EventMetrics>();
    println!("Event throughput: {:.0} events/s", events.events_per_second());
    for line in market.world().resource::<SystemTimings>().summary_lines() {
        println!("  {line}");
    }
}
