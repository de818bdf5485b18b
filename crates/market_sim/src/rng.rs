//! The single seeded random source for a market run.
//!
//! Every draw in the simulation (population sampling, Bernoulli trials,
//! exponential re-evaluation intervals, teleport destinations) goes through
//! [SimRng], so two runs with the same seed and configuration are identical.

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};

use crate::ecs::Coordinate;

#[derive(Debug, Resource)]
pub struct SimRng(StdRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut StdRng {
        &mut self.0
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.0.gen_bool(p)
    }

    /// Normal sample; a zero standard deviation yields the mean.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        match Normal::new(mean, std_dev) {
            Ok(dist) if std_dev > 0.0 => dist.sample(&mut self.0),
            _ => mean,
        }
    }

    /// Whole ticks until the next event of a Poisson process with the given
    /// mean interval. Always at least one tick.
    pub fn exponential_ticks(&mut self, mean_interval: f64) -> u64 {
        if !(mean_interval > 0.0) || !mean_interval.is_finite() {
            return 1;
        }
        let sample = match Exp::new(1.0 / mean_interval) {
            Ok(dist) => dist.sample(&mut self.0),
            Err(_) => mean_interval,
        };
        (sample.ceil() as u64).max(1)
    }

    /// Uniform coordinate in `[0, extent)` on both axes.
    pub fn coordinate(&mut self, extent: i64) -> Coordinate {
        let extent = extent.max(1);
        Coordinate::new(self.0.gen_range(0..extent), self.0.gen_range(0..extent))
    }
}
