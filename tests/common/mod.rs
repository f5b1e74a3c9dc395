//! Common test utilities for integration tests.

#![allow(dead_code)]

use bevy::math::DVec2;
use leadshot::{
    Agent, AgentId, AgentKind, EffectRequest, EffectResult, PathTracker, PredictionSettings, Team,
    TrajectoryPredictor, WorldState,
};

/// A standing enemy hero.
pub fn hero(id: u32, position: DVec2) -> Agent {
    Agent::new(AgentId(id), AgentKind::Hero, Team::Chaos, position)
}

/// A standing enemy minion.
pub fn minion(id: u32, position: DVec2) -> Agent {
    Agent::new(AgentId(id), AgentKind::Minion, Team::Chaos, position).with_bounding_radius(48.0)
}

/// An enemy hero walking straight from `from` to `to`.
pub fn walker(id: u32, from: DVec2, to: DVec2, speed: f64) -> Agent {
    hero(id, from).with_move_speed(speed).moving_along(&[to])
}

pub fn world_with(time: f64, agents: impl IntoIterator<Item = Agent>) -> WorldState {
    let mut world = WorldState::new(time);
    world.update(time, agents);
    world
}

/// Predict with default settings and the given path history.
pub fn predict_with(world: &WorldState, tracker: &PathTracker, request: &EffectRequest) -> EffectResult {
    let settings = PredictionSettings::default();
    TrajectoryPredictor::new(world, tracker, &settings).predict(request)
}

/// Predict with default settings and no path history.
pub fn predict(world: &WorldState, request: &EffectRequest) -> EffectResult {
    predict_with(world, &PathTracker::default(), request)
}

pub fn assert_near(actual: DVec2, expected: DVec2, tolerance: f64) {
    let distance = actual.distance(expected);
    assert!(
        distance <= tolerance,
        "points differ: actual={actual:?}, expected={expected:?}, distance={distance:.6e}"
    );
}
