//! Spatial operations: square-cell bucketing of the market plane.
//!
//! This module provides:
//!
//! - **GridIndex**: coordinate → cell mapping for a fixed resolution
//! - **Ring queries**: cells at an exact Chebyshev distance from a center cell
//! - **SpatialIndex**: cell → agent mappings for proximity searches
//!
//! Cells are `resolution × resolution` squares. Floor division keeps negative
//! coordinates in the cell that actually contains them.

use std::collections::HashMap;

use bevy_ecs::prelude::{Entity, Resource};

use crate::agents::AgentKind;
use crate::ecs::{AgentId, Coordinate};
use crate::error::{MarketError, MarketResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId {
    pub x: i64,
    pub y: i64,
}

impl CellId {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance in cells.
    pub fn ring_distance(&self, other: CellId) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridIndex {
    resolution: i64,
}

impl GridIndex {
    pub fn new(resolution: i64) -> MarketResult<Self> {
        if resolution <= 0 {
            return Err(MarketError::InvalidGridResolution(resolution));
        }
        Ok(Self { resolution })
    }

    pub fn resolution(&self) -> i64 {
        self.resolution
    }

    pub fn cell_of(&self, location: Coordinate) -> CellId {
        CellId {
            x: location.x.div_euclid(self.resolution),
            y: location.y.div_euclid(self.resolution),
        }
    }

    /// Cells at exactly `radius` from `center`, walking the square perimeter.
    /// Radius 0 is the center cell alone.
    pub fn ring(&self, center: CellId, radius: u32) -> Vec<CellId> {
        if radius == 0 {
            return vec![center];
        }
        let r = radius as i64;
        let mut cells = Vec::with_capacity(8 * radius as usize);
        for dx in -r..=r {
            cells.push(CellId::new(center.x + dx, center.y - r));
            cells.push(CellId::new(center.x + dx, center.y + r));
        }
        for dy in (-r + 1)..r {
            cells.push(CellId::new(center.x - r, center.y + dy));
            cells.push(CellId::new(center.x + r, center.y + dy));
        }
        cells
    }
}

/// One bucket entry: enough to find the agent's components again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedAgent {
    pub id: AgentId,
    pub entity: Entity,
    pub kind: AgentKind,
}

/// A driver found by [SpatialIndex::drivers_near], with its straight-line
/// distance from the search origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyDriver {
    pub agent: IndexedAgent,
    pub distance: f64,
}

/// Spatial index for agent lookups by cell.
///
/// Maintains mappings from cells to agents (riders and drivers) so matching
/// never scans the whole population. Every indexed agent sits in exactly one
/// bucket; [SpatialIndex::relocate] keeps that true when agents move.
#[derive(Debug, Resource)]
pub struct SpatialIndex {
    grid: GridIndex,
    /// Map from cell to the agents in that cell, in insertion order
    agents_by_cell: HashMap<CellId, Vec<IndexedAgent>>,
    /// Reverse mapping: agent → indexed location (its cell follows from it)
    locations: HashMap<AgentId, Coordinate>,
}

impl SpatialIndex {
    pub fn new(grid: GridIndex) -> Self {
        Self {
            grid,
            agents_by_cell: HashMap::new(),
            locations: HashMap::new(),
        }
    }

    pub fn with_resolution(resolution: i64) -> MarketResult<Self> {
        Ok(Self::new(GridIndex::new(resolution)?))
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    pub fn cell_of(&self, location: Coordinate) -> CellId {
        self.grid.cell_of(location)
    }

    /// Insert an agent at `location`. Each agent must be inserted once.
    pub fn insert(&mut self, agent: IndexedAgent, location: Coordinate) {
        debug_assert!(
            !self.locations.contains_key(&agent.id),
            "agent inserted into spatial index twice"
        );
        let cell = self.grid.cell_of(location);
        self.agents_by_cell.entry(cell).or_default().push(agent);
        self.locations.insert(agent.id, location);
    }

    /// Remove an agent from the index. Returns the cell it occupied.
    pub fn remove(&mut self, id: AgentId) -> Option<CellId> {
        let cell = self.grid.cell_of(self.locations.remove(&id)?);
        if let Some(agents) = self.agents_by_cell.get_mut(&cell) {
            agents.retain(|a| a.id != id);
            if agents.is_empty() {
                self.agents_by_cell.remove(&cell);
            }
        }
        Some(cell)
    }

    /// Move an indexed agent to the bucket for `new_location`.
    /// Returns `false` if the agent was never indexed.
    pub fn relocate(&mut self, id: AgentId, new_location: Coordinate) -> bool {
        let Some(old_location) = self.locations.get(&id).copied() else {
            return false;
        };
        let old_cell = self.grid.cell_of(old_location);
        let new_cell = self.grid.cell_of(new_location);
        if old_cell == new_cell {
            self.locations.insert(id, new_location);
            return true;
        }
        let mut moved = None;
        if let Some(agents) = self.agents_by_cell.get_mut(&old_cell) {
            if let Some(pos) = agents.iter().position(|a| a.id == id) {
                moved = Some(agents.remove(pos));
            }
            if agents.is_empty() {
                self.agents_by_cell.remove(&old_cell);
            }
        }
        let Some(agent) = moved else {
            return false;
        };
        self.agents_by_cell.entry(new_cell).or_default().push(agent);
        self.locations.insert(id, new_location);
        true
    }

    /// Bucket contents for `cell`; empty when nothing is there.
    pub fn agents_in(&self, cell: CellId) -> &[IndexedAgent] {
        self.agents_by_cell
            .get(&cell)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn cell_of_agent(&self, id: AgentId) -> Option<CellId> {
        self.location_of(id).map(|location| self.grid.cell_of(location))
    }

    pub fn location_of(&self, id: AgentId) -> Option<Coordinate> {
        self.locations.get(&id).copied()
    }

    /// Smallest distance from any point of the center cell to any point of
    /// a cell `radius` rings out.
    fn ring_clearance(&self, radius: u32) -> f64 {
        if radius == 0 {
            0.0
        } else {
            ((i64::from(radius) - 1) * self.grid.resolution + 1) as f64
        }
    }

    /// Ring search outward from `origin` for drivers accepted by `filter`,
    /// nearest first with ties broken by lower id.
    ///
    /// Rings are scanned by increasing radius up to `max_radius`. Once
    /// `min_candidates` drivers are held, scanning continues only while the
    /// next ring could still hold a driver no farther than the
    /// `min_candidates`-th nearest, so the result is never missing a closer
    /// (or equally close) driver than the ones it contains.
    pub fn drivers_near<F>(
        &self,
        origin: Coordinate,
        max_radius: u32,
        min_candidates: usize,
        mut filter: F,
    ) -> Vec<NearbyDriver>
    where
        F: FnMut(&IndexedAgent) -> bool,
    {
        let center = self.grid.cell_of(origin);
        let wanted = min_candidates.max(1);
        let mut found: Vec<NearbyDriver> = Vec::new();
        for radius in 0..=max_radius {
            if found.len() >= wanted {
                let mut distances: Vec<f64> = found.iter().map(|d| d.distance).collect();
                let (_, kth, _) = distances.select_nth_unstable_by(wanted - 1, f64::total_cmp);
                if self.ring_clearance(radius) > *kth {
                    break;
                }
            }
            for cell in self.grid.ring(center, radius) {
                for agent in self.agents_in(cell) {
                    if agent.kind != AgentKind::Driver || !filter(agent) {
                        continue;
                    }
                    let Some(location) = self.location_of(agent.id) else {
                        continue;
                    };
                    found.push(NearbyDriver {
                        agent: *agent,
                        distance: origin.distance_to(location),
                    });
                }
            }
        }
        found.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.agent.id.cmp(&b.agent.id))
        });
        found
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn clear(&mut self) {
        self.agents_by_cell.clear();
        self.locations.clear();
    }
}
