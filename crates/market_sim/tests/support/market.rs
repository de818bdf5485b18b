use market_sim::market::Market;
use market_sim::scenario::{BehaviorConfig, MarketConfig};
use market_sim::telemetry::TelemetryConfig;

/// Minor ticks per major tick used by the integration tests: short "days" so
/// strategy updates and snapshots happen within a few hundred ticks.
pub const TEST_TICKS_PER_MAJOR: u64 = 120;

/// Behaviour tuned so a small market produces plenty of traffic quickly.
pub fn busy_behavior() -> BehaviorConfig {
    BehaviorConfig {
        go_online_probability: 0.8,
        go_offline_probability: 0.01,
        go_online_reeval_interval: 30,
        evaluations_per_hour: 1.0 / 24.0,
        ticks_per_hour: 60,
        patience_ticks: 20,
        trip_duration_ticks: 10,
        world_extent: 50,
    }
}

/// Builder configuration for reproducible test markets.
#[derive(Clone, Debug)]
pub struct TestMarketBuilder {
    config: MarketConfig,
}

impl Default for TestMarketBuilder {
    fn default() -> Self {
        Self {
            config: MarketConfig::default()
                .with_seed(42)
                .with_population(40, 15)
                .with_behavior(busy_behavior())
                .with_ticks_per_major(TEST_TICKS_PER_MAJOR),
        }
    }
}

impl TestMarketBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config = self.config.with_seed(seed);
        self
    }

    pub fn with_population(mut self, riders: usize, drivers: usize) -> Self {
        self.config = self.config.with_population(riders, drivers);
        self
    }

    pub fn with_behavior(mut self, behavior: BehaviorConfig) -> Self {
        self.config = self.config.with_behavior(behavior);
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.config = self.config.with_telemetry(telemetry);
        self
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn build(self) -> Market {
        Market::new(&self.config).expect("test market")
    }
}
