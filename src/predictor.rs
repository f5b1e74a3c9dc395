//! Top-level prediction: validation, movement branch selection, range
//! reconciliation and collision downgrade.
//!
//! A [`TrajectoryPredictor`] borrows the tick's [`WorldState`], the
//! [`PathTracker`] and the [`PredictionSettings`]; it holds no state of its
//! own, so identical requests against an unchanged snapshot give identical
//! results.

use bevy::math::DVec2;
use bevy::prelude::*;

use crate::clustering;
use crate::collision::CollisionDetector;
use crate::movement::{MovementModel, classify};
use crate::path_tracker::{PathTracker, track_path_changes};
use crate::request::{EffectRequest, EffectResult, EffectShape};
use crate::types::{Agent, Confidence};
use crate::world::{WorldState, expire_stale_walls};

/// Plugin registering the prediction resources and the per-tick wall
/// expiry and path tracking systems.
pub struct PredictionPlugin;

impl Plugin for PredictionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PredictionSettings>()
            .init_resource::<WorldState>();
        if !app.world().contains_resource::<PathTracker>() {
            let settings = app.world().resource::<PredictionSettings>();
            let tracker =
                PathTracker::with_capacity(settings.history_capacity, settings.history_retain);
            app.insert_resource(tracker);
        }
        // Path changes must be recorded before anything predicts in Update.
        app.add_systems(PreUpdate, (expire_stale_walls, track_path_changes));
    }
}

/// Tunables for prediction, collision and clustering.
#[derive(Resource, Clone, Debug)]
pub struct PredictionSettings {
    /// Fixed reaction time added to every delay (seconds).
    pub reaction_delay: f64,
    /// A path younger than this (seconds) gives `VeryHigh` instead of `High`.
    pub fresh_path_age: f64,
    /// Targets beyond `range * cheap_reject_factor` are rejected untouched.
    pub cheap_reject_factor: f64,
    /// Line and cone effects fired from closer than this ignore the radius
    /// when giving the target a head start.
    pub close_range: f64,
    /// Intercepts this close to a segment end are left to the end fallback.
    pub segment_end_tolerance: f64,
    /// Minimum remaining dash length for waiting at the landing point.
    pub dash_min_length: f64,
    /// Extra clearance around obstacle bodies.
    pub collision_padding: f64,
    /// Obstacles are searched within `range + radius + margin`...
    pub collision_search_margin: f64,
    /// ...but never farther than this.
    pub collision_search_cap: f64,
    /// Name fragment identifying deflecting walls.
    pub wall_marker: String,
    /// Seconds a deflecting wall stays up.
    pub wall_lifetime: f64,
    pub wall_base_width: f64,
    pub wall_width_per_tier: f64,
    /// Area candidates are searched within `range + margin + radius`.
    pub area_search_margin: f64,
    /// Circle placements must fit within `radius - circle_slack`.
    pub circle_slack: f64,
    /// Cone aims closer than this to the origin are rejected.
    pub cone_min_aim_distance: f64,
    /// Line aims must pass the primary within
    /// `radius + primary_bounding / 3 - line_primary_slack`.
    pub line_primary_slack: f64,
    /// Path history length per agent that triggers pruning.
    pub history_capacity: usize,
    /// Snapshots kept after pruning.
    pub history_retain: usize,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            reaction_delay: 0.06,
            fresh_path_age: 0.1,
            cheap_reject_factor: 1.5,
            close_range: 200.0,
            segment_end_tolerance: 20.0,
            dash_min_length: 200.0,
            collision_padding: 50.0,
            collision_search_margin: 100.0,
            collision_search_cap: 2000.0,
            wall_marker: "windwall".to_string(),
            wall_lifetime: 4.0,
            wall_base_width: 300.0,
            wall_width_per_tier: 50.0,
            area_search_margin: 200.0,
            circle_slack: 10.0,
            cone_min_aim_distance: 50.0,
            line_primary_slack: 10.0,
            history_capacity: 50,
            history_retain: 10,
        }
    }
}

/// Predicts where effects should be aimed, against one world snapshot.
#[derive(Clone, Copy)]
pub struct TrajectoryPredictor<'w> {
    world: &'w WorldState,
    tracker: &'w PathTracker,
    settings: &'w PredictionSettings,
}

impl<'w> TrajectoryPredictor<'w> {
    pub fn new(
        world: &'w WorldState,
        tracker: &'w PathTracker,
        settings: &'w PredictionSettings,
    ) -> Self {
        Self {
            world,
            tracker,
            settings,
        }
    }

    pub fn world(&self) -> &'w WorldState {
        self.world
    }

    pub fn settings(&self) -> &'w PredictionSettings {
        self.settings
    }

    /// Predict a single effect. Area-flagged requests are clustered.
    pub fn predict(&self, request: &EffectRequest) -> EffectResult {
        if request.area {
            return self.predict_area(request);
        }
        match self.prepare(request) {
            Ok(prepared) => self.predict_single(&prepared, true),
            Err(rejected) => rejected,
        }
    }

    /// Predict an effect as an area effect regardless of its flag.
    pub fn predict_area(&self, request: &EffectRequest) -> EffectResult {
        match self.prepare(request) {
            Ok(prepared) => clustering::predict_area(self, &prepared),
            Err(mut rejected) => {
                // Area results always count the primary.
                rejected.hit_count = 1;
                rejected
            }
        }
    }

    /// Validate the request, pin the range origin, move the origin to the
    /// caster's body edge and account for latency.
    fn prepare(&self, request: &EffectRequest) -> Result<EffectRequest, EffectResult> {
        let target = self.world.agent(request.target);
        if let Err(err) = request.validate() {
            warn!("rejecting effect request for {:?}: {}", request.target, err);
            let anchor = target
                .map(|t| t.position)
                .filter(|p| p.is_finite())
                .unwrap_or(DVec2::ZERO);
            return Err(EffectResult::unresolved(
                request.target,
                anchor,
                Confidence::Impossible,
            ));
        }

        let Some(target) = target.filter(|t| t.is_valid_target()) else {
            debug!("no valid target {:?}", request.target);
            return Err(self.reject(request));
        };

        let mut prepared = request.clone();
        prepared.range_origin = Some(request.range_check_origin());
        if let Some(caster) = request.caster.and_then(|id| self.world.agent(id)) {
            let toward = target.position - request.origin;
            let distance = toward.length();
            if distance > caster.bounding_radius {
                prepared.origin += toward / distance * caster.bounding_radius;
            }
        }
        prepared.delay += self.world.latency_ms / 2000.0 + self.settings.reaction_delay;
        Ok(prepared)
    }

    fn reject(&self, request: &EffectRequest) -> EffectResult {
        let anchor = self
            .world
            .agent(request.target)
            .map(|t| t.position)
            .filter(|p| p.is_finite())
            .unwrap_or(request.origin);
        EffectResult::unresolved(request.target, anchor, Confidence::Impossible)
    }

    /// Single-target prediction of an already prepared request.
    pub(crate) fn predict_single(
        &self,
        request: &EffectRequest,
        check_collision: bool,
    ) -> EffectResult {
        let Some(target) = self
            .world
            .agent(request.target)
            .filter(|t| t.is_valid_target())
        else {
            return self.reject(request);
        };

        let range_origin = request.range_check_origin();
        if request.has_finite_range() {
            let cutoff = request.range * self.settings.cheap_reject_factor;
            if target.position.distance_squared(range_origin) > cutoff * cutoff {
                let mut result =
                    EffectResult::unresolved(target.id, target.position, Confidence::OutOfRange);
                result.hits = vec![target.id];
                result.hit_count = 1;
                return result;
            }
        }

        let now = self.world.time;
        let state = classify(target, now);
        trace!("predicting {:?} as {:?}", target.id, state);
        let model = MovementModel {
            request,
            target,
            settings: self.settings,
            fresh_path: self.tracker.current_path(target.id).age(now)
                < self.settings.fresh_path_age,
        };
        let estimate = model.project(state);

        let mut result = EffectResult {
            target: target.id,
            predicted_position: Some(estimate.target_position),
            cast_position: Some(estimate.cast_position),
            anchor: target.position,
            confidence: estimate.confidence,
            collisions: Vec::new(),
            hits: vec![target.id],
            hit_count: 1,
        };

        if request.has_finite_range() {
            reconcile_range(&mut result, request, target);
        }

        if check_collision && !request.collision.is_empty() {
            let endpoints = [
                result.predicted_position(),
                result.cast_position(),
                target.position,
            ];
            let collisions = CollisionDetector::new(self).detect(request, &endpoints);
            if !collisions.is_empty() {
                debug!("{:?} blocked by {:?}", target.id, collisions);
                result.confidence = result.confidence.downgraded_to(Confidence::Collision);
            }
            result.collisions = collisions;
        }

        result
    }
}

/// Downgrade or clamp a result whose positions leave the range.
fn reconcile_range(result: &mut EffectResult, request: &EffectRequest, target: &Agent) {
    let range_origin = request.range_check_origin();
    let range = request.range;
    let radius = request.effective_radius(target);

    let leash = range + radius * 0.75;
    if result.confidence >= Confidence::High
        && range_origin.distance_squared(target.position) > leash * leash
    {
        result.confidence = result.confidence.downgraded_to(Confidence::Medium);
    }

    let predicted = result.predicted_position();
    let reach = match request.shape {
        EffectShape::Circle => range + radius,
        EffectShape::Cone { .. } | EffectShape::Line => range,
    };
    if range_origin.distance_squared(predicted) > reach * reach {
        result.confidence = result.confidence.downgraded_to(Confidence::OutOfRange);
    }

    if result.confidence != Confidence::OutOfRange
        && range_origin.distance_squared(result.cast_position()) > range * range
    {
        let direction = (predicted - range_origin).normalize_or_zero();
        result.cast_position = Some(range_origin + direction * range);
    }
}
