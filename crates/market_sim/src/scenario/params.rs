use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, MarketResult};
use crate::platform::{PlatformConfig, PLATFORM_A, PLATFORM_B};
use crate::telemetry::TelemetryConfig;

/// Mean / standard deviation pair for a normally distributed agent trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalParams {
    pub mean: f64,
    pub std_dev: f64,
}

impl NormalParams {
    pub const fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }

    pub const fn fixed(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    fn validate(&self, name: &'static str) -> MarketResult<()> {
        if !self.mean.is_finite() {
            return Err(MarketError::InvalidDistribution {
                name,
                reason: format!("mean must be finite, got {}", self.mean),
            });
        }
        if !(self.std_dev.is_finite() && self.std_dev >= 0.0) {
            return Err(MarketError::InvalidDistribution {
                name,
                reason: format!("std_dev must be non-negative, got {}", self.std_dev),
            });
        }
        Ok(())
    }
}

fn validate_probability(name: &'static str, value: f64) -> MarketResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(MarketError::InvalidProbability { name, value })
    }
}

/// Rider population: trait distributions and app ownership.
///
/// Every distribution is required when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiderPopulationConfig {
    pub preference_score: NormalParams,
    pub price_sensitivity: NormalParams,
    pub time_sensitivity: NormalParams,
    pub rides_per_week: NormalParams,
    /// Share of riders with app A installed.
    #[serde(default = "default_app_share")]
    pub app_a_share: f64,
    /// Share of riders with app B installed.
    #[serde(default = "default_app_share")]
    pub app_b_share: f64,
}

fn default_app_share() -> f64 {
    0.7
}

impl Default for RiderPopulationConfig {
    fn default() -> Self {
        Self {
            preference_score: NormalParams::new(0.0, 0.5),
            price_sensitivity: NormalParams::new(0.5, 0.1),
            time_sensitivity: NormalParams::new(0.5, 0.1),
            rides_per_week: NormalParams::new(3.0, 1.0),
            app_a_share: default_app_share(),
            app_b_share: default_app_share(),
        }
    }
}

impl RiderPopulationConfig {
    pub fn validate(&self) -> MarketResult<()> {
        self.preference_score.validate("rider.preference_score")?;
        self.price_sensitivity.validate("rider.price_sensitivity")?;
        self.time_sensitivity.validate("rider.time_sensitivity")?;
        self.rides_per_week.validate("rider.rides_per_week")?;
        validate_probability("rider.app_a_share", self.app_a_share)?;
        validate_probability("rider.app_b_share", self.app_b_share)
    }
}

/// Driver population: trait distributions and exclusivity.
///
/// Every distribution is required when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverPopulationConfig {
    pub preference_score: NormalParams,
    pub price_sensitivity: NormalParams,
    pub eta_sensitivity: NormalParams,
    /// Share of drivers that only work for one platform.
    #[serde(default)]
    pub exclusive_share: f64,
}

impl Default for DriverPopulationConfig {
    fn default() -> Self {
        Self {
            preference_score: NormalParams::new(0.0, 0.5),
            price_sensitivity: NormalParams::new(0.5, 0.1),
            eta_sensitivity: NormalParams::new(0.5, 0.1),
            exclusive_share: 0.2,
        }
    }
}

impl DriverPopulationConfig {
    pub fn validate(&self) -> MarketResult<()> {
        self.preference_score.validate("driver.preference_score")?;
        self.price_sensitivity.validate("driver.price_sensitivity")?;
        self.eta_sensitivity.validate("driver.eta_sensitivity")?;
        validate_probability("driver.exclusive_share", self.exclusive_share)
    }
}

/// Behavioural constants for the evaluation events and the minor-tick passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Chance an offline driver comes online on an evaluation.
    pub go_online_probability: f64,
    /// Chance an idle driver goes offline on an evaluation.
    pub go_offline_probability: f64,
    /// Ticks between driver evaluations.
    pub go_online_reeval_interval: u64,
    /// Mean rider search-intent evaluations per simulated hour.
    pub evaluations_per_hour: f64,
    pub ticks_per_hour: u64,
    /// Unfulfilled ticks a rider tolerates before abandoning.
    pub patience_ticks: i32,
    /// Ticks from pickup to completion. Zero completes the trip on pickup.
    pub trip_duration_ticks: u64,
    /// Side of the square `[0, extent)` that agents are placed in.
    pub world_extent: i64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            go_online_probability: 0.1,
            go_offline_probability: 0.02,
            go_online_reeval_interval: 360,
            evaluations_per_hour: 1.0,
            ticks_per_hour: 360,
            patience_ticks: 180,
            trip_duration_ticks: 0,
            world_extent: 100,
        }
    }
}

impl BehaviorConfig {
    pub fn validate(&self) -> MarketResult<()> {
        validate_probability("go_online_probability", self.go_online_probability)?;
        validate_probability("go_offline_probability", self.go_offline_probability)?;
        if self.go_online_reeval_interval == 0 {
            return Err(MarketError::InvalidConfig(
                "go_online_reeval_interval must be at least 1 tick".into(),
            ));
        }
        if !(self.evaluations_per_hour.is_finite() && self.evaluations_per_hour > 0.0) {
            return Err(MarketError::InvalidConfig(format!(
                "evaluations_per_hour must be positive, got {}",
                self.evaluations_per_hour
            )));
        }
        if self.ticks_per_hour == 0 {
            return Err(MarketError::InvalidConfig("ticks_per_hour must be positive".into()));
        }
        if self.patience_ticks <= 0 {
            return Err(MarketError::InvalidConfig(format!(
                "patience_ticks must be positive, got {}",
                self.patience_ticks
            )));
        }
        if self.world_extent <= 0 {
            return Err(MarketError::InvalidConfig(format!(
                "world_extent must be positive, got {}",
                self.world_extent
            )));
        }
        Ok(())
    }

    /// Bernoulli probability that an idle rider starts searching on one evaluation.
    pub fn search_probability(&self, rides_per_week: f64) -> f64 {
        (rides_per_week / (7.0 * 24.0 * self.evaluations_per_hour)).clamp(0.0, 1.0)
    }

    /// Mean ticks between rider search-intent evaluations.
    pub fn mean_evaluation_interval(&self) -> f64 {
        self.ticks_per_hour as f64 / self.evaluations_per_hour
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct SimulationConfig {
    pub duration_days: u64,
    /// Minor ticks per major tick (one simulated day at 10 s ticks).
    pub ticks_per_major: u64,
    /// Simulated seconds per minor tick, used for log labels.
    pub minor_tick_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_days: 1,
            ticks_per_major: 8640,
            minor_tick_secs: 10,
        }
    }
}

fn default_platforms() -> Vec<PlatformConfig> {
    vec![PlatformConfig::new(PLATFORM_A), PlatformConfig::new(PLATFORM_B)]
}

/// Complete configuration for one market run.
///
/// `grid_resolution`, the population counts and both population sections are
/// required when deserializing; everything else falls back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub grid_resolution: i64,
    pub initial_riders: usize,
    pub initial_drivers: usize,
    #[serde(default)]
    pub seed: u64,
    pub riders: RiderPopulationConfig,
    pub drivers: DriverPopulationConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<PlatformConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            grid_resolution: 10,
            initial_riders: 100,
            initial_drivers: 20,
            seed: 0,
            riders: RiderPopulationConfig::default(),
            drivers: DriverPopulationConfig::default(),
            behavior: BehaviorConfig::default(),
            simulation: SimulationConfig::default(),
            platforms: default_platforms(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl MarketConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_population(mut self, riders: usize, drivers: usize) -> Self {
        self.initial_riders = riders;
        self.initial_drivers = drivers;
        self
    }

    pub fn with_grid_resolution(mut self, resolution: i64) -> Self {
        self.grid_resolution = resolution;
        self
    }

    pub fn with_world_extent(mut self, extent: i64) -> Self {
        self.behavior.world_extent = extent;
        self
    }

    pub fn with_riders(mut self, riders: RiderPopulationConfig) -> Self {
        self.riders = riders;
        self
    }

    pub fn with_drivers(mut self, drivers: DriverPopulationConfig) -> Self {
        self.drivers = drivers;
        self
    }

    pub fn with_behavior(mut self, behavior: BehaviorConfig) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_duration_days(mut self, days: u64) -> Self {
        self.simulation.duration_days = days;
        self
    }

    pub fn with_ticks_per_major(mut self, ticks: u64) -> Self {
        self.simulation.ticks_per_major = ticks;
        self
    }

    pub fn with_platforms(mut self, platforms: Vec<PlatformConfig>) -> Self {
        self.platforms = platforms;
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Check everything that would make the run meaningless, before any agent exists.
    pub fn validate(&self) -> MarketResult<()> {
        if self.grid_resolution <= 0 {
            return Err(MarketError::InvalidGridResolution(self.grid_resolution));
        }
        if self.simulation.ticks_per_major == 0 {
            return Err(MarketError::InvalidConfig("ticks_per_major must be positive".into()));
        }
        self.riders.validate()?;
        self.drivers.validate()?;
        self.behavior.validate()?;
        for platform in &self.platforms {
            platform.validate()?;
        }
        Ok(())
    }
}
