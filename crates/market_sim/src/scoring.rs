//! Scoring collaborators: how drivers value an offer and how riders value a ride.
//!
//! The matching engine only cares about the sign of the driver's score
//! (`> 0` accepts). Formulas are linear and live behind [ScoringModel] so
//! experiments can swap them without touching the offer protocol.

use crate::ecs::{DriverProfile, RiderProfile};

/// Pure scoring functions consumed by the matching engine and the market.
pub trait ScoringModel: Send + Sync + std::fmt::Debug {
    /// Driver profitability for an offer of `fare` with a pickup `eta` (ticks).
    fn profitability(&self, driver: &DriverProfile, fare: f64, eta: u32) -> f64;

    /// Rider utility for a ride at `price` with a pickup `eta` (ticks).
    /// `preference_weight` is signed: positive for platform A, negative for B.
    fn utility(&self, rider: &RiderProfile, price: f64, eta: u32, preference_weight: f64) -> f64;
}

/// Linear scores: sensitivity-weighted fare minus sensitivity-weighted wait.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScoring;

impl ScoringModel for LinearScoring {
    fn profitability(&self, driver: &DriverProfile, fare: f64, eta: u32) -> f64 {
        driver.price_sensitivity * fare - driver.eta_sensitivity * eta as f64
    }

    fn utility(&self, rider: &RiderProfile, price: f64, eta: u32, preference_weight: f64) -> f64 {
        -rider.price_sensitivity * price - rider.time_sensitivity * eta as f64
            + preference_weight * rider.preference_score
    }
}

/// Pickup time estimate from straight-line distance.
pub trait EtaEstimator: Send + Sync + std::fmt::Debug {
    fn eta_ticks(&self, distance: f64) -> u32;
}

/// `base_ticks + distance * ticks_per_unit`, rounded to whole ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearEta {
    pub base_ticks: u32,
    pub ticks_per_unit: f64,
}

impl Default for LinearEta {
    fn default() -> Self {
        Self {
            base_ticks: 5,
            ticks_per_unit: 0.1,
        }
    }
}

impl EtaEstimator for LinearEta {
    fn eta_ticks(&self, distance: f64) -> u32 {
        let extra = (distance.max(0.0) * self.ticks_per_unit.max(0.0)).round();
        self.base_ticks.saturating_add(extra.min(u32::MAX as f64) as u32)
    }
}
