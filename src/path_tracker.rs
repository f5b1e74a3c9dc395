//! Rolling history of the paths each agent has been given.
//!
//! The predictor uses the age of the latest path to judge how fresh a
//! prediction is: a path that just changed is likely to be followed for a
//! while, an old one may be abandoned any moment.

use std::collections::HashMap;

use bevy::math::DVec2;
use bevy::prelude::*;

use crate::geometry::path_length;
use crate::types::{Agent, AgentId};
use crate::world::WorldState;

/// Window (seconds) used when deriving an agent's movement tendency.
const TENDENCY_WINDOW: f64 = 1.5;

/// One recorded path with the simulation time it was captured at.
#[derive(Clone, Debug, PartialEq)]
pub struct PathSnapshot {
    pub waypoints: Vec<DVec2>,
    pub captured_at: f64,
}

static EMPTY_PATH: PathSnapshot = PathSnapshot {
    waypoints: Vec::new(),
    captured_at: f64::NEG_INFINITY,
};

impl PathSnapshot {
    /// Seconds since capture; infinite for the empty snapshot.
    pub fn age(&self, now: f64) -> f64 {
        now - self.captured_at
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    pub fn end_point(&self) -> Option<DVec2> {
        self.waypoints.last().copied()
    }

    pub fn length(&self) -> f64 {
        path_length(&self.waypoints)
    }
}

/// Per-agent path history, bounded in length.
#[derive(Resource, Clone, Debug)]
pub struct PathTracker {
    paths: HashMap<AgentId, Vec<PathSnapshot>>,
    /// History length that triggers pruning.
    capacity: usize,
    /// Snapshots kept after pruning.
    retain: usize,
}

impl Default for PathTracker {
    fn default() -> Self {
        Self::with_capacity(50, 10)
    }
}

impl PathTracker {
    /// Tracker that prunes a history longer than `capacity` down to the
    /// `retain` most recent snapshots.
    pub fn with_capacity(capacity: usize, retain: usize) -> Self {
        Self {
            paths: HashMap::new(),
            capacity: capacity.max(1),
            retain: retain.clamp(1, capacity.max(1)),
        }
    }

    /// Record that `agent` received a new path at `time`.
    pub fn record_path_change(&mut self, agent: AgentId, waypoints: Vec<DVec2>, time: f64) {
        let history = self.paths.entry(agent).or_default();
        history.push(PathSnapshot {
            waypoints,
            captured_at: time,
        });
        if history.len() > self.capacity {
            let excess = history.len() - self.retain;
            history.drain(..excess);
        }
    }

    /// Same as [`PathTracker::record_path_change`].
    pub fn track(&mut self, agent: AgentId, waypoints: Vec<DVec2>, time: f64) {
        self.record_path_change(agent, waypoints, time);
    }

    /// Latest snapshot, or an empty one of infinite age for unknown agents.
    pub fn current_path(&self, agent: AgentId) -> &PathSnapshot {
        self.paths
            .get(&agent)
            .and_then(|h| h.last())
            .unwrap_or(&EMPTY_PATH)
    }

    /// Snapshots younger than `max_age`, oldest first.
    pub fn recent_paths(&self, agent: AgentId, max_age: f64, now: f64) -> Vec<&PathSnapshot> {
        self.paths
            .get(&agent)
            .map(|h| h.iter().filter(|p| p.age(now) < max_age).collect())
            .unwrap_or_default()
    }

    pub fn history_len(&self, agent: AgentId) -> usize {
        self.paths.get(&agent).map_or(0, Vec::len)
    }

    /// Average speed over the last `max_age` seconds, reconstructed from the
    /// recorded paths. Falls back to the nominal speed without history.
    pub fn mean_speed(&self, agent: &Agent, max_age: f64, now: f64) -> f64 {
        let paths = self.recent_paths(agent.id, max_age, now);
        let (Some(first), Some(last)) = (paths.first(), paths.last()) else {
            return agent.move_speed;
        };
        if max_age <= 0.0 {
            return agent.move_speed;
        }

        // Moving at nominal speed before the oldest recorded path.
        let mut distance = (max_age - first.age(now)) * agent.move_speed;
        for pair in paths.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            if current.waypoint_count() > 0 {
                let elapsed = current.age(now) - next.age(now);
                distance += (elapsed * agent.move_speed).min(current.length());
            }
        }
        if last.waypoint_count() > 0 {
            distance += (last.age(now) * agent.move_speed).min(last.length());
        }

        distance / max_age
    }

    /// Mean heading towards the end points of recently issued paths.
    pub fn tendency(&self, agent: &Agent, now: f64) -> DVec2 {
        let headings: Vec<DVec2> = self
            .recent_paths(agent.id, TENDENCY_WINDOW, now)
            .into_iter()
            .filter_map(PathSnapshot::end_point)
            .map(|end| (end - agent.position).normalize_or_zero())
            .collect();
        if headings.is_empty() {
            return DVec2::ZERO;
        }
        headings.iter().sum::<DVec2>() / headings.len() as f64
    }

    /// Record every valid agent whose path differs from the stored one and
    /// forget agents that left the world.
    pub fn sync(&mut self, world: &WorldState) {
        for agent in world.agents().filter(|a| a.is_valid) {
            if self.current_path(agent.id).waypoints != agent.path {
                trace!("path change for {:?} at {:.3}s", agent.id, world.time);
                self.record_path_change(agent.id, agent.path.clone(), world.time);
            }
        }
        self.paths.retain(|id, _| world.agent(*id).is_some());
    }
}

/// Pull path changes out of the world snapshot once per tick.
pub fn track_path_changes(world: Res<WorldState>, mut tracker: ResMut<PathTracker>) {
    tracker.sync(&world);
}
