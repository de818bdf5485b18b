//! Performance benchmarks for market_sim using Criterion.rs.

use bevy_ecs::prelude::World;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use market_sim::ecs::{AgentId, Coordinate, OrderId, PlatformId};
use market_sim::market::Market;
use market_sim::matching::{MatcherConfig, MatchingEngine};
use market_sim::runner::run;
use market_sim::scenario::{BehaviorConfig, MarketConfig};
use market_sim::spatial::SpatialIndex;
use market_sim::test_helpers::{create_test_world, DriverFixture, RiderFixture};

const TICKS_PER_MAJOR: u64 = 360;

fn bench_market_run(c: &mut Criterion) {
    let scenarios = vec![("small", 200, 50), ("medium", 1000, 200), ("large", 5000, 1000)];

    let mut group = c.benchmark_group("market_run");
    group.sample_size(10);
    for (name, riders, drivers) in scenarios {
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &(riders, drivers),
            |b, &(riders, drivers)| {
                b.iter(|| {
                    let config = MarketConfig::default()
                        .with_seed(42)
                        .with_population(riders, drivers)
                        .with_behavior(BehaviorConfig {
                            go_online_probability: 0.5,
                            trip_duration_ticks: 30,
                            world_extent: 500,
                            ..BehaviorConfig::default()
                        })
                        .with_ticks_per_major(TICKS_PER_MAJOR);
                    let mut market = Market::new(&config).expect("market");
                    black_box(run(&mut market, 1, TICKS_PER_MAJOR))
                });
            },
        );
    }
    group.finish();
}

fn populated_world(drivers: u64) -> World {
    let mut world = create_test_world(10);
    for i in 0..drivers {
        let x = (i % 100) as i64 * 3;
        let y = (i / 100) as i64 * 3;
        DriverFixture::new(1000 + i).at(x, y).spawn(&mut world);
    }
    RiderFixture::new(1).at(150, 15).searching(180).spawn(&mut world);
    world
}

fn bench_idle_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("idle_candidates");
    let engine = MatchingEngine::new(PlatformId::new("A"), MatcherConfig::default());
    for drivers in [100u64, 1000, 5000] {
        let world = populated_world(drivers);
        group.bench_with_input(BenchmarkId::from_parameter(drivers), &world, |b, world| {
            b.iter(|| black_box(engine.idle_candidates(world, Coordinate::new(150, 15))));
        });
    }
    group.finish();
}

fn bench_process_order(c: &mut Criterion) {
    let engine = MatchingEngine::new(PlatformId::new("A"), MatcherConfig::default());
    c.bench_function("process_order_1000_drivers", |b| {
        b.iter_batched(
            || populated_world(1000),
            |mut world| {
                black_box(
                    engine
                        .process_order(&mut world, AgentId(1), 15.0, OrderId(1), 0)
                        .expect("order"),
                )
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_spatial_relocate(c: &mut Criterion) {
    let mut world = populated_world(1000);
    let mut index = world.remove_resource::<SpatialIndex>().expect("index");
    let mut step = 0i64;
    c.bench_function("spatial_relocate", |b| {
        b.iter(|| {
            step = (step + 7) % 300;
            let agent = AgentId(1000 + step as u64);
            black_box(index.relocate(agent, Coordinate::new(step, 300 - step)))
        });
    });
}

criterion_group!(
    benches,
    bench_market_run,
    bench_idle_candidates,
    bench_process_order,
    bench_spatial_relocate
);
criterion_main!(benches);
