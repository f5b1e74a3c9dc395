//! Movement classification and position projection for a single target.
//!
//! An agent is either walking a waypoint path, locked into a dash, or held
//! in place by a status effect. Each state has its own way of answering
//! "where will it be when the effect lands".

use bevy::math::DVec2;

use crate::geometry::{EPSILON, cut_path, path_length, solve_intercept};
use crate::predictor::PredictionSettings;
use crate::request::{EffectRequest, EffectShape};
use crate::types::{Agent, Confidence, Dash};

/// Movement state of an agent at a given time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MovementState<'a> {
    /// Following its waypoint path at nominal speed.
    Standard,
    /// Locked into a forced movement.
    Dashing(&'a Dash),
    /// Unable to move for `remaining` more seconds.
    Immobilized { remaining: f64 },
}

/// Classify an agent; dashes take precedence over immobilization.
pub fn classify(agent: &Agent, now: f64) -> MovementState<'_> {
    if let Some(dash) = &agent.dash {
        return MovementState::Dashing(dash);
    }
    match agent.immobile_for(now) {
        Some(remaining) => MovementState::Immobilized { remaining },
        None => MovementState::Standard,
    }
}

/// Raw outcome of a movement branch, before range and collision checks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimate {
    /// Where the target is expected to be.
    pub target_position: DVec2,
    /// Where to aim.
    pub cast_position: DVec2,
    pub confidence: Confidence,
}

impl Estimate {
    fn at(position: DVec2, confidence: Confidence) -> Self {
        Self {
            target_position: position,
            cast_position: position,
            confidence,
        }
    }
}

/// Everything a movement branch needs about the effect and its target.
pub struct MovementModel<'a> {
    pub request: &'a EffectRequest,
    pub target: &'a Agent,
    pub settings: &'a PredictionSettings,
    /// The target's latest path is younger than the freshness window.
    pub fresh_path: bool,
}

impl MovementModel<'_> {
    /// Project the target according to its movement state.
    pub fn project(&self, state: MovementState<'_>) -> Estimate {
        match state {
            MovementState::Standard => self.project_standard(),
            MovementState::Dashing(dash) => self.project_dash(dash),
            MovementState::Immobilized { remaining } => self.project_immobile(remaining),
        }
    }

    fn radius(&self) -> f64 {
        self.request.effective_radius(self.target)
    }

    /// Confidence for an intercept found on the current path.
    fn on_path_confidence(&self) -> Confidence {
        if self.fresh_path {
            Confidence::VeryHigh
        } else {
            Confidence::High
        }
    }

    /// Time the body needs to cover the effect radius, the slack granted
    /// to dash and immobility windows.
    fn radius_slack(&self) -> f64 {
        if self.target.move_speed > EPSILON {
            self.radius() / self.target.move_speed
        } else {
            0.0
        }
    }

    /// Seconds until the effect reaches `point`.
    fn arrival_time(&self, point: DVec2) -> f64 {
        let flight = if self.request.is_instant() {
            0.0
        } else {
            self.request.origin.distance(point) / self.request.speed
        };
        self.request.delay + flight
    }

    fn waypoints(&self) -> Vec<DVec2> {
        let position = self.target.position;
        match self.target.path.first() {
            Some(&first) if first == position => self.target.path.clone(),
            _ => std::iter::once(position)
                .chain(self.target.path.iter().copied())
                .collect(),
        }
    }

    fn project_standard(&self) -> Estimate {
        self.project_along_path(&self.waypoints(), self.target.move_speed)
    }

    /// Where the target walking `path` at `speed` meets the effect.
    pub fn project_along_path(&self, path: &[DVec2], speed: f64) -> Estimate {
        let position = self.target.position;
        if path.len() <= 1
            || self.target.is_committed
            || !speed.is_finite()
            || speed <= EPSILON
        {
            return Estimate::at(position, Confidence::VeryHigh);
        }

        let radius = self.radius();
        let travel = self.request.delay * speed - radius;
        if path_length(path) >= travel {
            let found = if self.request.is_instant() {
                self.walk_delay_only(path, travel.max(0.0), radius)
            } else {
                self.walk_intercept(path, speed, radius)
            };
            if let Some(estimate) = found {
                return estimate;
            }
        }

        let end = path.last().copied().unwrap_or(position);
        Estimate::at(end, Confidence::Medium)
    }

    /// Delay-only effects: the target just walks `travel` units.
    fn walk_delay_only(&self, path: &[DVec2], travel: f64, radius: f64) -> Option<Estimate> {
        let mut remaining = travel;
        let last_segment = path.len() - 2;
        for (i, pair) in path.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let segment = a.distance(b);
            if segment >= remaining {
                let direction = (b - a).normalize_or_zero();
                let ahead = if i == last_segment {
                    (remaining + radius).min(segment)
                } else {
                    remaining + radius
                };
                return Some(Estimate {
                    target_position: a + direction * ahead,
                    cast_position: a + direction * remaining,
                    confidence: self.on_path_confidence(),
                });
            }
            remaining -= segment;
        }
        None
    }

    /// Travelling effects: solve the intercept segment by segment.
    fn walk_intercept(&self, path: &[DVec2], speed: f64, radius: f64) -> Option<Estimate> {
        let origin = self.request.origin;
        let close = origin.distance_squared(self.target.position)
            < self.settings.close_range * self.settings.close_range;
        let head_start = match self.request.shape {
            EffectShape::Line | EffectShape::Cone { .. } if close => self.request.delay * speed,
            _ => self.request.delay * speed - radius,
        };

        let path = cut_path(path, head_start);
        let tolerance_sq = self.settings.segment_end_tolerance * self.settings.segment_end_tolerance;
        let last_segment = path.len().saturating_sub(2);
        let mut elapsed = 0.0;
        for (i, pair) in path.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let segment_time = a.distance(b) / speed;
            let direction = (b - a).normalize_or_zero();
            // Rewind the start so the mover's clock matches the effect's.
            let start = a - direction * (speed * elapsed);

            if let Some(hit) = solve_intercept(start, b, speed, origin, self.request.speed, elapsed)
                && hit.time <= elapsed + segment_time + EPSILON
            {
                // Only the path's terminal point is left to the fallback; a
                // hit near an inner corner is already the earliest meeting.
                if i == last_segment && hit.position.distance_squared(b) < tolerance_sq {
                    break;
                }
                return Some(Estimate {
                    target_position: hit.position + direction * radius,
                    cast_position: hit.position,
                    confidence: self.on_path_confidence(),
                });
            }
            elapsed += segment_time;
        }
        None
    }

    /// Dashing targets: catch them mid-air or wait at the landing point.
    pub fn project_dash(&self, dash: &Dash) -> Estimate {
        let position = self.target.position;
        if dash.is_blink || !dash.speed.is_finite() {
            return Estimate::at(position, Confidence::Impossible);
        }
        let Some(end) = dash.end_point() else {
            return self.project_standard();
        };

        let remaining: Vec<DVec2> = std::iter::once(position)
            .chain(dash.path.iter().copied())
            .collect();
        let mid_air = self.project_along_path(&remaining, dash.speed);
        if mid_air.confidence >= Confidence::High {
            return Estimate::at(mid_air.target_position, Confidence::Dashing);
        }

        if path_length(&remaining) > self.settings.dash_min_length && dash.speed > EPSILON {
            let landing = position.distance(end) / dash.speed + self.radius_slack();
            if self.arrival_time(end) <= landing {
                return Estimate::at(end, Confidence::Dashing);
            }
        }

        Estimate::at(end, mid_air.confidence)
    }

    /// Immobilized targets: hit them in place while the effect still fits
    /// in the window, otherwise project their path.
    pub fn project_immobile(&self, remaining: f64) -> Estimate {
        let position = self.target.position;
        if self.arrival_time(position) <= remaining + self.radius_slack() {
            return Estimate::at(position, Confidence::Immobile);
        }

        let mut estimate = self.project_standard();
        estimate.confidence = estimate.confidence.max(Confidence::High);
        estimate
    }
}
