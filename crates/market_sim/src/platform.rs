//! Platforms: an id, one matching engine and a pricing strategy each.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ecs::PlatformId;
use crate::error::{MarketError, MarketResult};
use crate::matching::{MatcherConfig, MatchingEngine, MAX_SEARCH_RADIUS};
use crate::pricing::{PricingConfig, PricingStrategy};

pub const PLATFORM_A: &str = "A";
pub const PLATFORM_B: &str = "B";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub id: String,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
}

impl PlatformConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            matcher: MatcherConfig::default(),
            pricing: PricingConfig::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: MatcherConfig) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingConfig) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn validate(&self) -> MarketResult<()> {
        if self.id.trim().is_empty() {
            return Err(MarketError::InvalidConfig("platform id must not be empty".into()));
        }
        if self.matcher.max_order_tries == 0 {
            return Err(MarketError::InvalidConfig(format!(
                "platform {}: max_order_tries must be at least 1",
                self.id
            )));
        }
        if self.matcher.max_search_radius > MAX_SEARCH_RADIUS {
            return Err(MarketError::InvalidConfig(format!(
                "platform {}: max_search_radius must be at most {MAX_SEARCH_RADIUS}, got {}",
                self.id, self.matcher.max_search_radius
            )));
        }
        self.pricing.validate()
    }
}

#[derive(Debug)]
pub struct Platform {
    pub id: PlatformId,
    pub engine: MatchingEngine,
    pub pricing: PricingStrategy,
}

impl Platform {
    pub fn new(id: PlatformId, engine: MatchingEngine, pricing: PricingStrategy) -> Self {
        Self { id, engine, pricing }
    }

    pub fn from_config(config: &PlatformConfig) -> MarketResult<Self> {
        config.validate()?;
        let id = PlatformId::new(config.id.clone());
        Ok(Self {
            engine: MatchingEngine::new(id.clone(), config.matcher),
            pricing: PricingStrategy::new(config.pricing),
            id,
        })
    }

    pub fn current_fare(&self) -> f64 {
        self.pricing.current_fare()
    }
}

/// Registered platforms, in registration order.
#[derive(Debug, Default, Resource)]
pub struct Platforms(Vec<Platform>);

impl Platforms {
    pub fn register(&mut self, platform: Platform) -> MarketResult<()> {
        if self.get(&platform.id).is_some() {
            return Err(MarketError::DuplicatePlatform(platform.id.0));
        }
        self.0.push(platform);
        Ok(())
    }

    pub fn get(&self, id: &PlatformId) -> Option<&Platform> {
        self.0.iter().find(|p| &p.id == id)
    }

    pub fn get_mut(&mut self, id: &PlatformId) -> Option<&mut Platform> {
        self.0.iter_mut().find(|p| &p.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Platform> {
        self.0.iter().find(|p| p.id.as_str() == name)
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut Platform> {
        self.0.iter_mut().find(|p| p.id.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Platform> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Platform> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
