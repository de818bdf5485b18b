use bevy_ecs::prelude::{Res, ResMut};
use tracing::info;

use crate::clock::SimulationClock;
use crate::platform::Platforms;

/// Close each platform's pricing period and move its fare multiplier.
pub fn platform_strategy_system(clock: Res<SimulationClock>, mut platforms: ResMut<Platforms>) {
    let now = clock.now();
    for platform in platforms.iter_mut() {
        let fulfillment = platform.pricing.period_fulfillment();
        let previous = platform.pricing.multiplier();
        let multiplier = platform.pricing.end_period();
        info!(
            tick = now,
            platform = %platform.id,
            fulfillment = fulfillment.unwrap_or(f64::NAN),
            previous,
            multiplier,
            fare = platform.current_fare(),
            "platform strategy updated"
        );
    }
}
