pub mod agents;
pub mod clock;
pub mod ecs;
pub mod error;
pub mod market;
pub mod matching;
pub mod platform;
pub mod pricing;
pub mod profiling;
pub mod rng;
pub mod runner;
pub mod scenario;
pub mod scoring;
pub mod spatial;
pub mod systems;
pub mod telemetry;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
