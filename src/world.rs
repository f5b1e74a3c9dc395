//! Snapshot of the simulated world the predictor reads from.
//!
//! The host refreshes it once per tick through [`WorldState::update`]; every
//! prediction made during that tick sees the same agents, walls and clock.

use std::collections::BTreeMap;

use bevy::math::DVec2;
use bevy::prelude::*;

use crate::predictor::PredictionSettings;
use crate::types::{Agent, AgentId, Team};

/// A short-lived wall that deflects incoming effects.
#[derive(Clone, Debug, PartialEq)]
pub struct WallEffect {
    /// Object name; trailing digits encode the wall's tier.
    pub name: String,
    pub team: Team,
    /// Center of the wall.
    pub position: DVec2,
    /// Where the wall's caster stood when placing it.
    pub cast_from: DVec2,
    /// Simulation time (seconds) the wall appeared.
    pub created_at: f64,
}

impl WallEffect {
    /// Tier encoded in the trailing digits of the name.
    pub fn tier(&self) -> Option<u32> {
        let digits_start = self
            .name
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i)?;
        self.name[digits_start..].parse().ok()
    }
}

/// World context passed to every prediction call.
#[derive(Resource, Clone, Debug, Default)]
pub struct WorldState {
    /// Current simulation time in seconds.
    pub time: f64,
    /// Estimated round-trip latency in milliseconds.
    pub latency_ms: f64,
    agents: BTreeMap<AgentId, Agent>,
    walls: Vec<WallEffect>,
}

impl WorldState {
    pub fn new(time: f64) -> Self {
        Self {
            time,
            ..Default::default()
        }
    }

    /// Replace the agent snapshot and advance the clock. Walls are kept;
    /// see [`WorldState::expire_walls`].
    pub fn update(&mut self, time: f64, agents: impl IntoIterator<Item = Agent>) {
        self.time = time;
        self.agents = agents.into_iter().map(|a| (a.id, a)).collect();
    }

    pub fn set_latency(&mut self, latency_ms: f64) {
        self.latency_ms = latency_ms.max(0.0);
    }

    /// Insert or replace a single agent.
    pub fn upsert(&mut self, agent: Agent) {
        self.agents.insert(agent.id, agent);
    }

    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        self.agents.remove(&id)
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// All agents in id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn add_wall(&mut self, wall: WallEffect) {
        self.walls.push(wall);
    }

    pub fn clear_walls(&mut self) {
        self.walls.clear();
    }

    /// Forget walls created more than `lifetime` seconds ago.
    pub fn expire_walls(&mut self, lifetime: f64) {
        let now = self.time;
        self.walls.retain(|wall| now - wall.created_at <= lifetime);
    }

    /// Walls in the order they were added.
    pub fn walls(&self) -> &[WallEffect] {
        &self.walls
    }

    /// Valid agents of `team` within `range` of `center`, in id order.
    pub fn valid_agents_near(
        &self,
        team: Team,
        center: DVec2,
        range: f64,
    ) -> impl Iterator<Item = &Agent> {
        self.agents.values().filter(move |a| {
            a.team == team
                && a.is_valid_target()
                && a.position.distance_squared(center) <= range * range
        })
    }
}

/// Drop walls whose deflection window has passed.
pub fn expire_stale_walls(settings: Res<PredictionSettings>, mut world: ResMut<WorldState>) {
    if world.walls.is_empty() {
        return;
    }
    world.expire_walls(settings.wall_lifetime);
}
