use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::SimulationClock;
use crate::ecs::{Driver, Rider};
use crate::platform::Platforms;
use crate::telemetry::{SimCounts, SimSnapshot, SimSnapshotConfig, SimSnapshots};

pub fn capture_snapshot_system(
    clock: Res<SimulationClock>,
    config: Res<SimSnapshotConfig>,
    platforms: Res<Platforms>,
    mut snapshots: ResMut<SimSnapshots>,
    riders: Query<&Rider>,
    drivers: Query<&Driver>,
) {
    let now = clock.now();
    if snapshots.last_snapshot_at == Some(now) {
        return;
    }

    let mut counts = SimCounts::default();
    for rider in riders.iter() {
        counts.add_rider(rider.state);
    }
    for driver in drivers.iter() {
        counts.add_driver(driver.state);
    }
    let multipliers = platforms
        .iter()
        .map(|p| (p.id.clone(), p.pricing.multiplier()))
        .collect();

    snapshots.push(
        SimSnapshot {
            tick: now,
            counts,
            multipliers,
        },
        config.max_snapshots,
    );
}
