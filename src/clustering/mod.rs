//! Area-effect placement: find one launch point that hits as many agents
//! as possible.
//!
//! Every strategy starts from the primary target's single-target
//! prediction, collects other enemies that are themselves predictable with
//! high confidence, and searches a bounded set of placements:
//! - [`circle`]: shrink the minimum enclosing circle until it fits
//! - [`cone`]: aim at midpoints between candidate pairs
//! - [`line`]: aim along beams grazing each candidate
//!
//! When no placement hits more than the primary, the single-target result
//! is returned unchanged.

pub mod circle;
pub mod cone;
pub mod line;

use bevy::math::DVec2;
use bevy::prelude::*;

use crate::predictor::{PredictionSettings, TrajectoryPredictor};
use crate::request::{EffectRequest, EffectResult, EffectShape};
use crate::types::{Agent, AgentId, Confidence};

/// An agent the effect may hit, at its predicted position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub id: AgentId,
    pub position: DVec2,
}

/// A chosen launch point and the agents it is expected to hit.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub cast_position: DVec2,
    pub hits: Vec<AgentId>,
}

/// Input shared by the placement strategies.
pub struct Cluster<'a> {
    pub request: &'a EffectRequest,
    pub settings: &'a PredictionSettings,
    pub primary: &'a Agent,
    /// Candidates to cover; the primary target is always first.
    pub candidates: Vec<Candidate>,
}

impl Cluster<'_> {
    pub fn primary_candidate(&self) -> Candidate {
        self.candidates[0]
    }

    /// Search for a placement according to the request's shape.
    pub fn place(&self) -> Option<Placement> {
        if self.candidates.len() < 2 {
            return None;
        }
        match self.request.shape {
            EffectShape::Circle => circle::place(self),
            EffectShape::Cone { angle } => cone::place(self, angle),
            EffectShape::Line => line::place(self),
        }
    }
}

/// Area prediction of an already prepared request.
pub(crate) fn predict_area(
    predictor: &TrajectoryPredictor<'_>,
    request: &EffectRequest,
) -> EffectResult {
    let single = request.clone().with_area(false);
    let main = predictor.predict_single(&single, true);
    if main.confidence < Confidence::Medium {
        return main;
    }
    let Some(primary) = predictor.world().agent(request.target) else {
        return main;
    };

    let cluster = Cluster {
        request: &single,
        settings: predictor.settings(),
        primary,
        candidates: gather_candidates(predictor, &single, primary, &main),
    };
    debug!(
        "clustering {:?} around {:?} with {} candidates",
        request.shape,
        primary.id,
        cluster.candidates.len()
    );

    match cluster.place() {
        Some(placement) => EffectResult {
            cast_position: Some(placement.cast_position),
            hit_count: placement.hits.len(),
            hits: placement.hits,
            ..main
        },
        None => main,
    }
}

/// The primary target followed by every other enemy near the range whose
/// own prediction is at least `High`.
fn gather_candidates(
    predictor: &TrajectoryPredictor<'_>,
    request: &EffectRequest,
    primary: &Agent,
    main: &EffectResult,
) -> Vec<Candidate> {
    let mut candidates = vec![Candidate {
        id: primary.id,
        position: main.predicted_position(),
    }];

    let search = request.range
        + predictor.settings().area_search_margin
        + request.effective_radius(primary);
    for agent in predictor
        .world()
        .valid_agents_near(primary.team, request.range_check_origin(), search)
        .filter(|a| a.id != primary.id)
    {
        let prediction = predictor.predict_single(&request.retargeted(agent.id), false);
        if prediction.confidence >= Confidence::High {
            candidates.push(Candidate {
                id: agent.id,
                position: prediction.predicted_position(),
            });
        }
    }
    candidates
}
