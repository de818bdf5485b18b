//! Telemetry / KPIs: match attempts, completed trips, abandonments and
//! periodic state snapshots, all keyed by simulation tick.

use std::collections::{BTreeSet, VecDeque};

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ecs::{AgentId, DriverState, OrderId, PlatformId, RiderState};
use crate::matching::MatchOutcome;

/// One call into a platform's matching engine.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchAttemptRecord {
    pub tick: u64,
    pub rider_id: AgentId,
    pub platform_id: PlatformId,
    pub order_id: OrderId,
    pub fare: f64,
    pub outcome: MatchOutcome,
    pub offers_made: usize,
    pub matched_driver: Option<AgentId>,
    /// Rider utility of the accepted offer; `None` when unmatched.
    pub rider_utility: Option<f64>,
}

/// One completed trip, recorded when both agents are released.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedTripRecord {
    pub order_id: OrderId,
    pub rider_id: AgentId,
    pub driver_id: AgentId,
    pub platform_id: PlatformId,
    pub fare: f64,
    pub matched_at: u64,
    pub pickup_at: u64,
    pub completed_at: u64,
}

impl CompletedTripRecord {
    /// Time from driver acceptance to pickup.
    pub fn time_to_pickup(&self) -> u64 {
        self.pickup_at.saturating_sub(self.matched_at)
    }

    /// Time from pickup to completion.
    pub fn trip_duration(&self) -> u64 {
        self.completed_at.saturating_sub(self.pickup_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbandonmentRecord {
    pub tick: u64,
    pub rider_id: AgentId,
}

/// Whole-run counters. Unlike the record buffers these never drop entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketMetrics {
    pub online_drivers: BTreeSet<AgentId>,
    pub active_drivers: BTreeSet<AgentId>,
    pub searching_riders: BTreeSet<AgentId>,
    pub riders_with_completed_trips: BTreeSet<AgentId>,
    pub total_completed_trips: u64,
    pub total_match_attempts: u64,
    pub successful_matches: u64,
    pub unfulfilled_no_drivers: u64,
    pub unfulfilled_max_tries: u64,
    pub total_abandonments: u64,
}

impl MarketMetrics {
    pub fn track_match_attempt(&mut self, outcome: MatchOutcome) {
        self.total_match_attempts += 1;
        match outcome {
            MatchOutcome::MatchSuccessful => self.successful_matches += 1,
            MatchOutcome::UnfulfilledNoDrivers => self.unfulfilled_no_drivers += 1,
            MatchOutcome::UnfulfilledMaxTries => self.unfulfilled_max_tries += 1,
        }
    }

    pub fn track_abandonment(&mut self) {
        self.total_abandonments += 1;
    }

    pub fn track_driver_online(&mut self, driver_id: AgentId) {
        self.online_drivers.insert(driver_id);
    }

    pub fn track_rider_search(&mut self, rider_id: AgentId) {
        self.searching_riders.insert(rider_id);
    }

    pub fn track_completed_trip(&mut self, driver_id: AgentId, rider_id: AgentId) {
        self.total_completed_trips += 1;
        self.active_drivers.insert(driver_id);
        self.riders_with_completed_trips.insert(rider_id);
    }
}

/// Upper bounds for the per-event record buffers. Oldest records go first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub max_match_attempt_records: usize,
    pub max_completed_trip_records: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            max_match_attempt_records: 100_000,
            max_completed_trip_records: 100_000,
        }
    }
}

/// Collects simulation telemetry.
///
/// `match_attempts` and `completed_trips` keep only the most recent records
/// (see [`TelemetryConfig`]); totals live in `metrics`.
#[derive(Debug, Clone, Default, Resource)]
pub struct SimTelemetry {
    pub match_attempts: VecDeque<MatchAttemptRecord>,
    pub completed_trips: VecDeque<CompletedTripRecord>,
    pub abandonments: Vec<AbandonmentRecord>,
    pub metrics: MarketMetrics,
    pub limits: TelemetryConfig,
}

impl SimTelemetry {
    pub fn with_limits(limits: TelemetryConfig) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn record_match_attempt(&mut self, record: MatchAttemptRecord) {
        self.metrics.track_match_attempt(record.outcome);
        push_bounded(
            &mut self.match_attempts,
            record,
            self.limits.max_match_attempt_records,
        );
    }

    pub fn record_completed_trip(&mut self, record: CompletedTripRecord) {
        self.metrics
            .track_completed_trip(record.driver_id, record.rider_id);
        push_bounded(
            &mut self.completed_trips,
            record,
            self.limits.max_completed_trip_records,
        );
    }

    pub fn record_abandonment(&mut self, record: AbandonmentRecord) {
        self.metrics.track_abandonment();
        self.abandonments.push(record);
    }

    pub fn successful_matches(&self) -> u64 {
        self.metrics.successful_matches
    }
}

fn push_bounded<T>(buffer: &mut VecDeque<T>, record: T, max: usize) {
    buffer.push_back(record);
    while buffer.len() > max {
        buffer.pop_front();
    }
}

/// Agents per state at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimCounts {
    pub riders_idle: usize,
    pub riders_searching: usize,
    pub riders_comparing_offers: usize,
    pub riders_ordered: usize,
    pub riders_on_trip: usize,
    pub riders_abandoned: usize,
    pub drivers_offline: usize,
    pub drivers_idle: usize,
    pub drivers_driving_to_rider: usize,
    pub drivers_on_trip: usize,
}

impl SimCounts {
    pub fn add_rider(&mut self, state: RiderState) {
        match state {
            RiderState::Idle => self.riders_idle += 1,
            RiderState::Searching => self.riders_searching += 1,
            RiderState::ComparingOffers => self.riders_comparing_offers += 1,
            RiderState::Ordered => self.riders_ordered += 1,
            RiderState::OnTrip => self.riders_on_trip += 1,
            RiderState::AbandonedSearch => self.riders_abandoned += 1,
        }
    }

    pub fn add_driver(&mut self, state: DriverState) {
        match state {
            DriverState::Offline => self.drivers_offline += 1,
            DriverState::Idle => self.drivers_idle += 1,
            DriverState::DrivingToRider => self.drivers_driving_to_rider += 1,
            DriverState::OnTrip => self.drivers_on_trip += 1,
        }
    }

    pub fn riders(&self) -> usize {
        self.riders_idle
            + self.riders_searching
            + self.riders_comparing_offers
            + self.riders_ordered
            + self.riders_on_trip
            + self.riders_abandoned
    }

    pub fn drivers(&self) -> usize {
        self.drivers_offline + self.drivers_idle + self.drivers_driving_to_rider + self.drivers_on_trip
    }
}

/// State of the market at one major-tick boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct SimSnapshot {
    pub tick: u64,
    pub counts: SimCounts,
    /// Fare multiplier per platform after the strategy update.
    pub multipliers: Vec<(PlatformId, f64)>,
}

#[derive(Debug, Clone, Copy, Resource)]
pub struct SimSnapshotConfig {
    pub max_snapshots: usize,
}

impl Default for SimSnapshotConfig {
    fn default() -> Self {
        Self { max_snapshots: 1_000 }
    }
}

/// Rolling snapshot buffer.
#[derive(Debug, Default, Resource)]
pub struct SimSnapshots {
    pub snapshots: VecDeque<SimSnapshot>,
    pub last_snapshot_at: Option<u64>,
}

impl SimSnapshots {
    pub fn push(&mut self, snapshot: SimSnapshot, max_snapshots: usize) {
        self.last_snapshot_at = Some(snapshot.tick);
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > max_snapshots {
            self.snapshots.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&SimSnapshot> {
        self.snapshots.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_sum_per_population() {
        let mut counts = SimCounts::default();
        counts.add_rider(RiderState::Idle);
        counts.add_rider(RiderState::AbandonedSearch);
        counts.add_driver(DriverState::Offline);
        counts.add_driver(DriverState::DrivingToRider);
        counts.add_driver(DriverState::Idle);
        assert_eq!(counts.riders(), 2);
        assert_eq!(counts.drivers(), 3);
        assert_eq!(counts.riders_abandoned, 1);
    }

    #[test]
    fn metrics_count_unique_agents() {
        let mut metrics = MarketMetrics::default();
        metrics.track_driver_online(AgentId(5));
        metrics.track_driver_online(AgentId(5));
        metrics.track_completed_trip(AgentId(5), AgentId(1));
        metrics.track_completed_trip(AgentId(5), AgentId(1));
        assert_eq!(metrics.online_drivers.len(), 1);
        assert_eq!(metrics.active_drivers.len(), 1);
        assert_eq!(metrics.riders_with_completed_trips.len(), 1);
        assert_eq!(metrics.total_completed_trips, 2);
    }

    fn attempt(tick: u64, outcome: MatchOutcome) -> MatchAttemptRecord {
        MatchAttemptRecord {
            tick,
            rider_id: AgentId(0),
            platform_id: PlatformId::new("A"),
            order_id: OrderId(tick),
            fare: 10.0,
            outcome,
            offers_made: 1,
            matched_driver: None,
            rider_utility: None,
        }
    }

    #[test]
    fn attempt_buffer_is_bounded_but_totals_are_not() {
        let mut telemetry = SimTelemetry::with_limits(TelemetryConfig {
            max_match_attempt_records: 3,
            ..TelemetryConfig::default()
        });
        for tick in 0..10 {
            let outcome = match tick % 3 {
                0 => MatchOutcome::MatchSuccessful,
                1 => MatchOutcome::UnfulfilledNoDrivers,
                _ => MatchOutcome::UnfulfilledMaxTries,
            };
            telemetry.record_match_attempt(attempt(tick, outcome));
        }
        assert_eq!(telemetry.match_attempts.len(), 3);
        assert_eq!(telemetry.match_attempts.front().map(|a| a.tick), Some(7));
        let metrics = &telemetry.metrics;
        assert_eq!(metrics.total_match_attempts, 10);
        assert_eq!(metrics.successful_matches, 4);
        assert_eq!(metrics.unfulfilled_no_drivers, 3);
        assert_eq!(metrics.unfulfilled_max_tries, 3);
        assert_eq!(telemetry.successful_matches(), 4);
    }

    #[test]
    fn zero_limit_keeps_only_counters() {
        let mut telemetry = SimTelemetry::with_limits(TelemetryConfig {
            max_match_attempt_records: 0,
            max_completed_trip_records: 0,
        });
        telemetry.record_match_attempt(attempt(0, MatchOutcome::MatchSuccessful));
        telemetry.record_completed_trip(CompletedTripRecord {
            order_id: OrderId(0),
            rider_id: AgentId(0),
            driver_id: AgentId(9),
            platform_id: PlatformId::new("A"),
            fare: 10.0,
            matched_at: 0,
            pickup_at: 3,
            completed_at: 5,
        });
        assert!(telemetry.match_attempts.is_empty());
        assert!(telemetry.completed_trips.is_empty());
        assert_eq!(telemetry.metrics.total_match_attempts, 1);
        assert_eq!(telemetry.metrics.total_completed_trips, 1);
        assert!(telemetry.metrics.active_drivers.contains(&AgentId(9)));
    }

    #[test]
    fn snapshot_buffer_is_bounded() {
        let mut snapshots = SimSnapshots::default();
        for tick in 0..5 {
            snapshots.push(
                SimSnapshot {
                    tick,
                    counts: SimCounts::default(),
                    multipliers: Vec::new(),
                },
                3,
            );
        }
        assert_eq!(snapshots.snapshots.len(), 3);
        assert_eq!(snapshots.snapshots.front().map(|s| s.tick), Some(2));
        assert_eq!(snapshots.latest().map(|s| s.tick), Some(4));
        assert_eq!(snapshots.last_snapshot_at, Some(4));
    }

    #[test]
    fn trip_record_durations() {
        let record = CompletedTripRecord {
            order_id: OrderId(1),
            rider_id: AgentId(0),
            driver_id: AgentId(9),
            platform_id: PlatformId::new("A"),
            fare: 15.0,
            matched_at: 10,
            pickup_at: 16,
            completed_at: 20,
        };
        assert_eq!(record.time_to_pickup(), 6);
        assert_eq!(record.trip_duration(), 4);
    }
}
