use std::fmt;

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

/// Identity shared by riders and drivers. Rider and driver ids never overlap.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlatformId(pub String);

impl PlatformId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Integer location on the unbounded market plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i64,
    pub y: i64,
}

impl Coordinate {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Coordinate) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiderState {
    Idle,
    Searching,
    /// Reserved for multi-platform offer comparison; no transition enters it yet.
    ComparingOffers,
    Ordered,
    /// Reserved: trips complete without a distinct in-vehicle phase.
    OnTrip,
    AbandonedSearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverState {
    Offline,
    Idle,
    DrivingToRider,
    /// Reserved: trips complete without a distinct in-vehicle phase.
    OnTrip,
}

/// Which ride-hailing apps a rider has installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppAccess {
    pub app_a: bool,
    pub app_b: bool,
}

impl AppAccess {
    pub fn any(&self) -> bool {
        self.app_a || self.app_b
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiderProfile {
    /// -1.0 is a full preference for platform B, +1.0 for platform A.
    pub preference_score: f64,
    pub price_sensitivity: f64,
    pub time_sensitivity: f64,
    pub rides_per_week: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverProfile {
    pub preference_score: f64,
    pub price_sensitivity: f64,
    pub eta_sensitivity: f64,
}

/// Rider/driver pairing held by both sides of an accepted order.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub driver_id: AgentId,
    pub rider_id: AgentId,
    pub platform_id: PlatformId,
    pub order_id: OrderId,
    pub fare: f64,
    /// Tick the driver accepted the offer.
    pub matched_at: u64,
    /// Tick the driver reaches the rider (`matched_at` + pickup ETA).
    pub pickup_at: u64,
}

#[derive(Debug, Clone, PartialEq, Component)]
pub struct Rider {
    pub id: AgentId,
    pub apps: AppAccess,
    pub profile: RiderProfile,
    pub state: RiderState,
    pub patience_timer: i32,
    pub active_match: Option<Match>,
}

impl Rider {
    pub fn new(id: AgentId, apps: AppAccess, profile: RiderProfile) -> Self {
        Self {
            id,
            apps,
            profile,
            state: RiderState::Idle,
            patience_timer: 0,
            active_match: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Component)]
pub struct Driver {
    pub id: AgentId,
    pub is_exclusive: bool,
    pub profile: DriverProfile,
    pub state: DriverState,
    pub active_match: Option<Match>,
}

impl Driver {
    pub fn new(id: AgentId, is_exclusive: bool, profile: DriverProfile) -> Self {
        Self {
            id,
            is_exclusive,
            profile,
            state: DriverState::Offline,
            active_match: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Component)]
pub struct Position(pub Coordinate);
