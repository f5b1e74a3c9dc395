//! Property-based tests for prediction and clustering using proptest.
//!
//! These tests verify invariants of the intercept solver, the single-target
//! predictor and the area placements across random worlds.

use bevy::math::DVec2;
use proptest::prelude::*;

use crate::clustering::{Candidate, Cluster, circle};
use crate::geometry::solve_intercept;
use crate::path_tracker::PathTracker;
use crate::predictor::{PredictionSettings, TrajectoryPredictor};
use crate::request::{EffectRequest, EffectResult, EffectShape};
use crate::test_utils::fixtures;
use crate::types::AgentId;
use crate::world::WorldState;

fn point(range: f64) -> impl Strategy<Value = DVec2> {
    (-range..range, -range..range).prop_map(|(x, y)| DVec2::new(x, y))
}

fn shape() -> impl Strategy<Value = EffectShape> {
    prop_oneof![
        Just(EffectShape::Circle),
        Just(EffectShape::Line),
        (0.2f64..2.5).prop_map(|angle| EffectShape::Cone { angle }),
    ]
}

fn predict(world: &WorldState, request: &EffectRequest) -> EffectResult {
    let tracker = PathTracker::default();
    let settings = PredictionSettings::default();
    TrajectoryPredictor::new(world, &tracker, &settings).predict(request)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any root the solver returns is a real meeting: the mover and the
    /// projectile are at the same place at the same, admissible, time.
    #[test]
    fn prop_intercept_roots_are_meetings(
        start in point(2000.0),
        end in point(2000.0),
        shooter in point(2000.0),
        mover_speed in 0.0f64..1500.0,
        shot_speed in 100.0f64..3000.0,
        min_time in 0.0f64..2.0,
    ) {
        if let Some(hit) = solve_intercept(start, end, mover_speed, shooter, shot_speed, min_time) {
            prop_assert!(hit.time.is_finite() && hit.time > 0.0 && hit.time >= min_time);
            prop_assert!(hit.position.is_finite());

            let heading = (end - start).normalize();
            let expected = start + heading * mover_speed * hit.time;
            prop_assert!(hit.position.distance(expected) < 1e-6 * (1.0 + expected.length()));

            let flown = shot_speed * hit.time;
            let gap = (shooter.distance(hit.position) - flown).abs();
            prop_assert!(gap < 1e-6 * (1.0 + flown), "gap {} at t={}", gap, hit.time);
        }
    }

    /// Identical requests against an unchanged snapshot give identical
    /// results.
    #[test]
    fn prop_prediction_is_idempotent(
        from in point(1500.0),
        to in point(1500.0),
        speed in 100.0f64..600.0,
        delay in 0.0f64..1.5,
        radius in 0.0f64..200.0,
        effect_speed in 500.0f64..3000.0,
        shape in shape(),
    ) {
        let world = fixtures::world_with(0.0, [fixtures::walker(1, from, to, speed)]);
        let request = EffectRequest::new(AgentId(1), DVec2::ZERO)
            .with_range(1200.0)
            .with_delay(delay)
            .with_radius(radius)
            .with_speed(effect_speed)
            .with_shape(shape);
        prop_assert_eq!(predict(&world, &request), predict(&world, &request));
    }

    /// Predictions never produce non-finite positions.
    #[test]
    fn prop_positions_are_finite(
        from in point(3000.0),
        to in point(3000.0),
        speed in 0.0f64..800.0,
        delay in 0.0f64..3.0,
        radius in 0.0f64..300.0,
        instant in any::<bool>(),
        effect_speed in 1.0f64..4000.0,
    ) {
        let world = fixtures::world_with(0.0, [fixtures::walker(1, from, to, speed)]);
        let request = EffectRequest::new(AgentId(1), DVec2::new(10.0, -20.0))
            .with_range(1000.0)
            .with_delay(delay)
            .with_radius(radius)
            .with_speed(if instant { f64::INFINITY } else { effect_speed });
        let result = predict(&world, &request);
        prop_assert!(result.predicted_position().is_finite());
        prop_assert!(result.cast_position().is_finite());
    }

    /// For a walking target, a longer delay never moves the aim backwards
    /// along its path.
    #[test]
    fn prop_delay_is_monotonic(
        speed in 100.0f64..600.0,
        radius in 0.0f64..150.0,
        delay in 0.0f64..2.0,
        extra in 0.0f64..2.0,
    ) {
        let walker = fixtures::walker(1, DVec2::ZERO, DVec2::new(2500.0, 0.0), speed);
        let world = fixtures::world_with(0.0, [walker]);
        let request = EffectRequest::new(AgentId(1), DVec2::new(0.0, 700.0)).with_radius(radius);

        let early = predict(&world, &request.clone().with_delay(delay));
        let late = predict(&world, &request.with_delay(delay + extra));
        prop_assert!(late.cast_position().x >= early.cast_position().x - 1e-9);
        prop_assert!(late.predicted_position().x >= early.predicted_position().x - 1e-9);
    }

    /// For a walking target on any waypoint path, a longer delay never
    /// raises confidence. The range is unbounded so only the path walk
    /// decides.
    #[test]
    fn prop_delay_never_raises_confidence(
        start in point(1500.0),
        waypoints in prop::collection::vec(point(1500.0), 1..5),
        speed in 100.0f64..600.0,
        radius in 0.0f64..150.0,
        delay in 0.0f64..3.0,
        extra in 0.0f64..2.0,
        instant in any::<bool>(),
        effect_speed in 400.0f64..3000.0,
        shape in shape(),
    ) {
        let walker = fixtures::hero(1, start).with_move_speed(speed).moving_along(&waypoints);
        let world = fixtures::world_with(0.0, [walker]);
        let request = EffectRequest::new(AgentId(1), DVec2::new(0.0, -300.0))
            .with_radius(radius)
            .with_speed(if instant { f64::INFINITY } else { effect_speed })
            .with_shape(shape);

        let early = predict(&world, &request.clone().with_delay(delay));
        let late = predict(&world, &request.with_delay(delay + extra));
        prop_assert!(
            late.confidence <= early.confidence,
            "{:?} at {} rose to {:?} at {}",
            early.confidence,
            delay,
            late.confidence,
            delay + extra
        );
    }

    /// Area predictions always count at least the primary and never list
    /// more hits than they count.
    #[test]
    fn prop_area_hit_counts(
        positions in prop::collection::vec(point(900.0), 1..7),
        radius in 20.0f64..400.0,
        shape in shape(),
    ) {
        let agents = positions
            .iter()
            .enumerate()
            .map(|(i, &p)| fixtures::hero(i as u32 + 1, p));
        let world = fixtures::world_with(0.0, agents);
        let request = EffectRequest::new(AgentId(1), DVec2::ZERO)
            .with_range(1000.0)
            .with_radius(radius)
            .with_shape(shape)
            .with_area(true);

        let result = predict(&world, &request);
        prop_assert!(result.hit_count() >= 1);
        prop_assert!(result.hits.len() <= result.hit_count());

        let mut unique = result.hits.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), result.hits.len());
    }

    /// A circle placement covers every agent it claims to hit.
    #[test]
    fn prop_circle_placement_covers_hits(
        positions in prop::collection::vec(point(600.0), 2..8),
        radius in 50.0f64..500.0,
    ) {
        let settings = PredictionSettings::default();
        let primary = fixtures::hero(1, positions[0]).with_bounding_radius(0.0);
        let request = EffectRequest::new(AgentId(1), DVec2::ZERO).with_radius(radius);
        let cluster = Cluster {
            request: &request,
            settings: &settings,
            primary: &primary,
            candidates: positions
                .iter()
                .enumerate()
                .map(|(i, &position)| Candidate { id: AgentId(i as u32 + 1), position })
                .collect(),
        };

        if let Some(placement) = circle::place(&cluster) {
            prop_assert!(placement.hits.contains(&AgentId(1)));
            for candidate in cluster.candidates.iter().filter(|c| placement.hits.contains(&c.id)) {
                let distance = candidate.position.distance(placement.cast_position);
                prop_assert!(distance <= radius - settings.circle_slack + 1e-6);
            }
        }
    }
}
