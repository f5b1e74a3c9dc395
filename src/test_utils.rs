//! Test utilities for prediction and clustering tests.
//!
//! Provides agent and world fixtures plus assertions for comparing planar
//! positions.

use bevy::math::DVec2;

use crate::types::{Agent, AgentId, AgentKind, Team};
use crate::world::WorldState;

/// Fixtures for creating agents and world snapshots.
pub mod fixtures {
    use super::*;

    /// A standing enemy hero with default speed and bounding radius.
    pub fn hero(id: u32, position: DVec2) -> Agent {
        Agent::new(AgentId(id), AgentKind::Hero, Team::Chaos, position)
    }

    /// A standing enemy minion.
    pub fn minion(id: u32, position: DVec2) -> Agent {
        Agent::new(AgentId(id), AgentKind::Minion, Team::Chaos, position).with_bounding_radius(48.0)
    }

    /// An enemy hero walking in a straight line from `from` to `to`.
    pub fn walker(id: u32, from: DVec2, to: DVec2, speed: f64) -> Agent {
        hero(id, from).with_move_speed(speed).moving_along(&[to])
    }

    /// A world at `time` holding `agents`.
    pub fn world_with(time: f64, agents: impl IntoIterator<Item = Agent>) -> WorldState {
        let mut world = WorldState::new(time);
        world.update(time, agents);
        world
    }

    /// Standing heroes at the corners of an equilateral triangle of side
    /// `side`, with ids 1..=3. Bounding radii are zero so radii are exact.
    pub fn triangle(center: DVec2, side: f64) -> Vec<Agent> {
        let circumradius = side / 3f64.sqrt();
        (0..3u32)
            .map(|i| {
                let angle = (90.0 + 120.0 * i as f64).to_radians();
                let position = center + DVec2::from_angle(angle) * circumradius;
                hero(i + 1, position).with_bounding_radius(0.0)
            })
            .collect()
    }
}

/// Assertions on planar positions.
pub mod assertions {
    use super::*;

    /// Assert that two points are within `tolerance` of each other.
    ///
    /// # Panics
    /// Panics with both points and their distance otherwise.
    pub fn assert_near(actual: DVec2, expected: DVec2, tolerance: f64) {
        let distance = actual.distance(expected);
        assert!(
            distance <= tolerance,
            "points differ: actual={actual:?}, expected={expected:?}, distance={distance:.6e}, tolerance={tolerance:.6e}"
        );
    }

    /// Assert that `point` lies within `range` of `center`, with a small
    /// numeric allowance.
    pub fn assert_within(point: DVec2, center: DVec2, range: f64) {
        let distance = point.distance(center);
        assert!(
            distance <= range + 1e-6,
            "point {point:?} is {distance:.3} from {center:?}, beyond {range:.3}"
        );
    }
}

/// Utilities for creating headless Bevy apps for testing.
pub mod bevy_test {
    use bevy::prelude::*;

    /// Create a minimal Bevy app for testing without rendering.
    pub fn headless_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_walker_path_starts_at_position() {
        let agent = fixtures::walker(1, DVec2::ZERO, DVec2::new(10.0, 0.0), 250.0);
        assert_eq!(agent.path, vec![DVec2::ZERO, DVec2::new(10.0, 0.0)]);
        assert_eq!(agent.move_speed, 250.0);
    }

    #[test]
    fn test_triangle_has_requested_side() {
        let corners: Vec<DVec2> = fixtures::triangle(DVec2::new(100.0, 100.0), 500.0)
            .iter()
            .map(|a| a.position)
            .collect();
        assert_relative_eq!(corners[0].distance(corners[1]), 500.0, epsilon = 1e-9);
        assert_relative_eq!(corners[1].distance(corners[2]), 500.0, epsilon = 1e-9);
        assert_relative_eq!(corners[2].distance(corners[0]), 500.0, epsilon = 1e-9);
    }

    #[test]
    #[should_panic(expected = "points differ")]
    fn test_assert_near_panics_on_distant_points() {
        assertions::assert_near(DVec2::ZERO, DVec2::ONE, 0.5);
    }
}
