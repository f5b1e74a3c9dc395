//! Obstacle detection between an effect's origin and its aim points.
//!
//! Two kinds of obstacles stop an effect: enemy bodies standing in its way
//! (forecast to where they will be when the effect passes) and a deflecting
//! wall raised by the target's team.

use bevy::math::DVec2;
use bevy::prelude::*;

use crate::geometry::{segment_distance_squared, segment_intersection};
use crate::predictor::TrajectoryPredictor;
use crate::request::{CollisionMask, EffectRequest, Obstacle};
use crate::types::{Agent, AgentKind};
use crate::world::WallEffect;

/// An obstacle body with its forecast position.
struct Forecast<'w> {
    agent: &'w Agent,
    position: DVec2,
}

/// Tests effect trajectories against obstacles in one world snapshot.
pub struct CollisionDetector<'w> {
    predictor: TrajectoryPredictor<'w>,
}

impl<'w> CollisionDetector<'w> {
    pub fn new(predictor: &TrajectoryPredictor<'w>) -> Self {
        Self {
            predictor: *predictor,
        }
    }

    /// Obstacles on any segment from the request origin to one of
    /// `endpoints`, without duplicates and never including the target.
    pub fn detect(&self, request: &EffectRequest, endpoints: &[DVec2]) -> Vec<Obstacle> {
        let world = self.predictor.world();
        let Some(target) = world.agent(request.target) else {
            return Vec::new();
        };

        let forecasts = self.forecast_bodies(request, target);
        let wall = if request.collision.contains(CollisionMask::WALLS) {
            self.active_wall(target)
        } else {
            None
        };

        let mut found = Vec::new();
        for &end in endpoints.iter().filter(|p| p.is_finite()) {
            for body in &forecasts {
                let reach = request.radius
                    + self.predictor.settings().collision_padding
                    + body.agent.bounding_radius;
                if segment_distance_squared(body.position, request.origin, end) <= reach * reach {
                    push_unique(&mut found, Obstacle::Agent(body.agent.id));
                }
            }
            if let Some(wall) = wall
                && self.wall_blocks(wall, request, end)
            {
                push_unique(&mut found, Obstacle::Wall(wall.name.clone()));
            }
        }
        found
    }

    /// Forecast every enemy body the mask cares about, once per call.
    fn forecast_bodies(&self, request: &EffectRequest, target: &'w Agent) -> Vec<Forecast<'w>> {
        let mask = request.collision;
        if !mask.contains(CollisionMask::MINIONS) && !mask.contains(CollisionMask::HEROES) {
            return Vec::new();
        }

        let settings = self.predictor.settings();
        let search = (request.range + request.radius + settings.collision_search_margin)
            .min(settings.collision_search_cap);
        self.predictor
            .world()
            .valid_agents_near(target.team, request.range_check_origin(), search)
            .filter(|agent| agent.id != target.id)
            .filter(|agent| match agent.kind {
                AgentKind::Minion => mask.contains(CollisionMask::MINIONS),
                AgentKind::Hero => mask.contains(CollisionMask::HEROES),
                AgentKind::Other => false,
            })
            .map(|agent| Forecast {
                agent,
                position: self
                    .predictor
                    .predict_single(&request.retargeted(agent.id), false)
                    .predicted_position(),
            })
            .collect()
    }

    /// The most recent deflecting wall of the target's team still standing.
    fn active_wall(&self, target: &Agent) -> Option<&'w WallEffect> {
        let world = self.predictor.world();
        let settings = self.predictor.settings();
        let wall = world
            .walls()
            .iter()
            .rev()
            .find(|w| w.team == target.team && w.name.contains(&settings.wall_marker))?;
        (world.time - wall.created_at <= settings.wall_lifetime).then_some(wall)
    }

    /// Whether the effect reaches `wall` on its way to `end` before the wall
    /// disappears.
    fn wall_blocks(&self, wall: &WallEffect, request: &EffectRequest, end: DVec2) -> bool {
        let settings = self.predictor.settings();
        let Some(tier) = wall.tier() else {
            trace!("ignoring wall {:?} without tier", wall.name);
            return false;
        };
        let facing = (wall.position - wall.cast_from).normalize_or_zero();
        if facing == DVec2::ZERO {
            return false;
        }

        let half_width = (settings.wall_base_width + settings.wall_width_per_tier * tier as f64) / 2.0;
        let span = facing.perp() * half_width;
        let Some(hit) =
            segment_intersection(request.origin, end, wall.position - span, wall.position + span)
        else {
            return false;
        };

        let flight = if request.is_instant() {
            0.0
        } else {
            request.origin.distance(hit) / request.speed
        };
        let arrival = self.predictor.world().time + request.delay + flight;
        arrival < wall.created_at + settings.wall_lifetime
    }
}

fn push_unique(found: &mut Vec<Obstacle>, obstacle: Obstacle) {
    if !found.contains(&obstacle) {
        found.push(obstacle);
    }
}
