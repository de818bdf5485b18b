//! Agent directory: id → entity lookup plus spawn helpers that keep the
//! directory and the spatial index in step with the world.

use std::collections::HashMap;

use bevy_ecs::prelude::{Entity, Resource, World};

use crate::ecs::{AgentId, Coordinate, Driver, Position, Rider};
use crate::spatial::{IndexedAgent, SpatialIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Rider,
    Driver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentRecord {
    pub entity: Entity,
    pub kind: AgentKind,
}

/// O(1) lookup from agent id to its entity.
#[derive(Debug, Default, Resource)]
pub struct AgentDirectory {
    agents: HashMap<AgentId, AgentRecord>,
}

impl AgentDirectory {
    pub fn insert(&mut self, id: AgentId, entity: Entity, kind: AgentKind) {
        self.agents.insert(id, AgentRecord { entity, kind });
    }

    pub fn get(&self, id: AgentId) -> Option<AgentRecord> {
        self.agents.get(&id).copied()
    }

    pub fn rider(&self, id: AgentId) -> Option<Entity> {
        self.get(id)
            .filter(|r| r.kind == AgentKind::Rider)
            .map(|r| r.entity)
    }

    pub fn driver(&self, id: AgentId) -> Option<Entity> {
        self.get(id)
            .filter(|r| r.kind == AgentKind::Driver)
            .map(|r| r.entity)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Spawn a rider entity and register it in the directory and spatial index.
///
/// The world must already hold [AgentDirectory] and [SpatialIndex].
pub fn spawn_rider(world: &mut World, rider: Rider, location: Coordinate) -> Entity {
    let id = rider.id;
    let entity = world.spawn((rider, Position(location))).id();
    register(world, id, entity, AgentKind::Rider, location);
    entity
}

/// Spawn a driver entity and register it in the directory and spatial index.
///
/// The world must already hold [AgentDirectory] and [SpatialIndex].
pub fn spawn_driver(world: &mut World, driver: Driver, location: Coordinate) -> Entity {
    let id = driver.id;
    let entity = world.spawn((driver, Position(location))).id();
    register(world, id, entity, AgentKind::Driver, location);
    entity
}

fn register(world: &mut World, id: AgentId, entity: Entity, kind: AgentKind, location: Coordinate) {
    world
        .resource_mut::<AgentDirectory>()
        .insert(id, entity, kind);
    world
        .resource_mut::<SpatialIndex>()
        .insert(IndexedAgent { id, entity, kind }, location);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{AppAccess, DriverProfile, RiderProfile};
    use crate::spatial::CellId;

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(AgentDirectory::default());
        world.insert_resource(SpatialIndex::with_resolution(10).expect("index"));
        world
    }

    #[test]
    fn spawned_agents_are_registered_and_indexed() {
        let mut world = world();
        let rider = spawn_rider(
            &mut world,
            Rider::new(
                AgentId(0),
                AppAccess::default(),
                RiderProfile {
                    preference_score: 0.0,
                    price_sensitivity: 0.5,
                    time_sensitivity: 0.5,
                    rides_per_week: 3.0,
                },
            ),
            Coordinate::new(5, 5),
        );
        let driver = spawn_driver(
            &mut world,
            Driver::new(
                AgentId(1),
                false,
                DriverProfile {
                    preference_score: 0.0,
                    price_sensitivity: 0.5,
                    eta_sensitivity: 0.5,
                },
            ),
            Coordinate::new(25, 5),
        );

        let directory = world.resource::<AgentDirectory>();
        assert_eq!(directory.rider(AgentId(0)), Some(rider));
        assert_eq!(directory.driver(AgentId(1)), Some(driver));
        assert_eq!(directory.driver(AgentId(0)), None);
        assert_eq!(directory.len(), 2);

        let index = world.resource::<SpatialIndex>();
        assert_eq!(index.cell_of_agent(AgentId(0)), Some(CellId::new(0, 0)));
        assert_eq!(index.cell_of_agent(AgentId(1)), Some(CellId::new(2, 0)));
    }
}
