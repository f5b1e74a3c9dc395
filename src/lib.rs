//! Leadshot - lead-target prediction for tick-driven simulations
//!
//! Predicts where a moving agent will be when a delayed, possibly
//! area-shaped effect reaches it, picks launch points that hit several
//! agents at once, and flags obstacles in the way.
//!
//! The host refreshes a [`WorldState`] once per tick and asks a
//! [`TrajectoryPredictor`] for [`EffectResult`]s. Inside a Bevy `App`,
//! [`PredictionPlugin`] registers the resources and keeps the path history
//! in sync.

pub mod clustering;
pub mod collision;
pub mod geometry;
pub mod movement;
pub mod path_tracker;
pub mod predictor;
pub mod request;
pub mod types;
pub mod world;

pub use path_tracker::PathTracker;
pub use predictor::{PredictionPlugin, PredictionSettings, TrajectoryPredictor};
pub use request::{CollisionMask, EffectRequest, EffectResult, EffectShape, Obstacle, RequestError};
pub use types::{Agent, AgentId, AgentKind, Confidence, Dash, StatusEffect, StatusKind, Team};
pub use world::{WallEffect, WorldState};

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod proptest_prediction;
