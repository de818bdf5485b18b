//! Performance profiling: pass timing and event rate tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bevy_ecs::prelude::Resource;

use crate::clock::EventAction;

/// Per-pass timing metrics.
#[derive(Debug, Clone, Default)]
pub struct SystemTiming {
    pub total_duration: Duration,
    pub call_count: u64,
    pub min_duration: Duration,
    pub max_duration: Duration,
}

impl SystemTiming {
    pub fn record(&mut self, duration: Duration) {
        self.total_duration += duration;
        self.call_count += 1;
        if duration < self.min_duration || self.call_count == 1 {
            self.min_duration = duration;
        }
        if duration > self.max_duration {
            self.max_duration = duration;
        }
    }

    pub fn avg_duration(&self) -> Duration {
        if self.call_count == 0 {
            return Duration::ZERO;
        }
        let avg_nanos = self.total_duration.as_nanos() / self.call_count as u128;
        Duration::from_nanos(avg_nanos as u64)
    }
}

/// Wall-clock time spent in the minor and major passes.
#[derive(Debug, Default, Resource)]
pub struct SystemTimings {
    timings: HashMap<&'static str, SystemTiming>,
}

impl SystemTimings {
    pub fn record(&mut self, name: &'static str, duration: Duration) {
        self.timings.entry(name).or_default().record(duration);
    }

    pub fn get(&self, name: &str) -> Option<&SystemTiming> {
        self.timings.get(name)
    }

    /// One line per pass, slowest (by total) first.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut entries: Vec<_> = self.timings.iter().collect();
        entries.sort_by(|a, b| b.1.total_duration.cmp(&a.1.total_duration));
        entries
            .into_iter()
            .map(|(name, timing)| {
                format!(
                    "{:24} | calls: {:8} | total: {:8.2}ms | avg: {:8.2}µs | max: {:8.2}µs",
                    name,
                    timing.call_count,
                    timing.total_duration.as_secs_f64() * 1000.0,
                    timing.avg_duration().as_secs_f64() * 1_000_000.0,
                    timing.max_duration.as_secs_f64() * 1_000_000.0,
                )
            })
            .collect()
    }
}

/// Event delivery counts. Superseded evaluations are counted separately.
#[derive(Debug, Default, Resource)]
pub struct EventMetrics {
    pub events_processed: u64,
    pub events_superseded: u64,
    pub start_time: Option<Instant>,
    pub events_by_action: HashMap<EventAction, u64>,
}

impl EventMetrics {
    pub fn record_event(&mut self, action: EventAction) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
        self.events_processed += 1;
        *self.events_by_action.entry(action).or_insert(0) += 1;
    }

    pub fn record_superseded(&mut self) {
        self.events_superseded += 1;
    }

    pub fn count(&self, action: EventAction) -> u64 {
        self.events_by_action.get(&action).copied().unwrap_or(0)
    }

    /// Events per wall-clock second since the first delivery.
    pub fn events_per_second(&self) -> f64 {
        match self.start_time {
            Some(start) => {
                let elapsed = start.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    self.events_processed as f64 / elapsed
                } else {
                    0.0
                }
            }
            None => 0.0,
        }
    }
}
