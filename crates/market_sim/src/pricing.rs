//! Platform pricing: a base fare scaled by a multiplier that reacts to how
//! well the platform filled orders over the last major period.

use serde::{Deserialize, Serialize};

use crate::error::{MarketError, MarketResult};

/// Base fare in currency units.
pub const BASE_FARE: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub base_fare: f64,
    /// Fulfillment rate (matched / attempted) the platform aims for.
    pub target_fulfillment: f64,
    /// Multiplier change per major tick.
    pub step: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fare: BASE_FARE,
            target_fulfillment: 0.8,
            step: 0.1,
            min_multiplier: 0.5,
            max_multiplier: 3.0,
        }
    }
}

impl PricingConfig {
    pub fn validate(&self) -> MarketResult<()> {
        if !(self.base_fare.is_finite() && self.base_fare >= 0.0) {
            return Err(MarketError::InvalidConfig(format!(
                "base_fare must be a non-negative number, got {}",
                self.base_fare
            )));
        }
        if !(0.0..=1.0).contains(&self.target_fulfillment) {
            return Err(MarketError::InvalidProbability {
                name: "target_fulfillment",
                value: self.target_fulfillment,
            });
        }
        if !(self.min_multiplier > 0.0 && self.min_multiplier <= self.max_multiplier) {
            return Err(MarketError::InvalidConfig(format!(
                "multiplier bounds must satisfy 0 < min <= max, got [{}, {}]",
                self.min_multiplier, self.max_multiplier
            )));
        }
        if !(self.step.is_finite() && self.step >= 0.0) {
            return Err(MarketError::InvalidConfig(format!(
                "pricing step must be non-negative, got {}",
                self.step
            )));
        }
        Ok(())
    }
}

/// Live pricing state for one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingStrategy {
    config: PricingConfig,
    multiplier: f64,
    period_attempts: u64,
    period_matches: u64,
}

impl PricingStrategy {
    pub fn new(config: PricingConfig) -> Self {
        Self {
            config,
            multiplier: 1.0_f64.clamp(config.min_multiplier, config.max_multiplier),
            period_attempts: 0,
            period_matches: 0,
        }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Fare currently quoted to riders.
    pub fn current_fare(&self) -> f64 {
        self.config.base_fare * self.multiplier
    }

    pub fn record_attempt(&mut self, matched: bool) {
        self.period_attempts += 1;
        if matched {
            self.period_matches += 1;
        }
    }

    /// Fulfillment rate of the running period, `None` before any attempt.
    pub fn period_fulfillment(&self) -> Option<f64> {
        (self.period_attempts > 0).then(|| self.period_matches as f64 / self.period_attempts as f64)
    }

    /// Close the period: surge when under target, otherwise relax toward 1.0.
    /// A period without attempts relaxes. Returns the new multiplier.
    pub fn end_period(&mut self) -> f64 {
        let cfg = self.config;
        let next = match self.period_fulfillment() {
            Some(rate) if rate < cfg.target_fulfillment => self.multiplier + cfg.step,
            _ if self.multiplier > 1.0 => (self.multiplier - cfg.step).max(1.0),
            _ => (self.multiplier + cfg.step).min(1.0),
        };
        self.multiplier = next.clamp(cfg.min_multiplier, cfg.max_multiplier);
        self.period_attempts = 0;
        self.period_matches = 0;
        self.multiplier
    }
}
