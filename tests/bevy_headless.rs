//! Headless Bevy integration tests.
//!
//! These tests verify the prediction plugin's resources and systems work
//! inside an `App` without rendering.

mod common;

use bevy::math::DVec2;
use bevy::prelude::*;
use leadshot::{
    AgentId, Confidence, EffectRequest, EffectResult, PathTracker, PredictionPlugin,
    PredictionSettings, Team, TrajectoryPredictor, WallEffect, WorldState,
};

fn create_minimal_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(PredictionPlugin);
    app
}

#[derive(Resource, Default)]
struct LastShot(Option<EffectResult>);

fn aim_at_first_agent(
    world: Res<WorldState>,
    tracker: Res<PathTracker>,
    settings: Res<PredictionSettings>,
    mut last: ResMut<LastShot>,
) {
    let predictor = TrajectoryPredictor::new(&world, &tracker, &settings);
    let request = EffectRequest::new(AgentId(1), DVec2::ZERO)
        .with_range(1000.0)
        .with_delay(0.25);
    last.0 = Some(predictor.predict(&request));
}

#[test]
fn test_plugin_registers_resources() {
    let mut app = create_minimal_app();
    app.update();

    assert!(app.world().contains_resource::<WorldState>());
    assert!(app.world().contains_resource::<PathTracker>());
    let settings = app.world().resource::<PredictionSettings>();
    assert_eq!(settings.reaction_delay, 0.06);
}

#[test]
fn test_custom_settings_survive_plugin() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(PredictionSettings {
        reaction_delay: 0.0,
        ..Default::default()
    });
    app.add_plugins(PredictionPlugin);

    assert_eq!(app.world().resource::<PredictionSettings>().reaction_delay, 0.0);
}

#[test]
fn test_path_changes_are_tracked_per_tick() {
    let mut app = create_minimal_app();
    let walker = common::walker(1, DVec2::ZERO, DVec2::new(600.0, 0.0), 300.0);

    app.world_mut()
        .resource_mut::<WorldState>()
        .update(1.0, [walker.clone()]);
    app.update();
    app.update();
    assert_eq!(app.world().resource::<PathTracker>().history_len(AgentId(1)), 1);

    let turned = walker.moving_along(&[DVec2::new(0.0, 600.0)]);
    app.world_mut()
        .resource_mut::<WorldState>()
        .update(1.5, [turned]);
    app.update();
    let tracker = app.world().resource::<PathTracker>();
    assert_eq!(tracker.history_len(AgentId(1)), 2);
    assert_eq!(tracker.current_path(AgentId(1)).captured_at, 1.5);
}

#[test]
fn test_expired_walls_are_dropped_each_tick() {
    let mut app = create_minimal_app();
    {
        let mut world = app.world_mut().resource_mut::<WorldState>();
        world.update(10.0, []);
        world.add_wall(WallEffect {
            name: "windwall1".to_string(),
            team: Team::Chaos,
            position: DVec2::new(0.0, 500.0),
            cast_from: DVec2::new(0.0, 700.0),
            created_at: 9.0,
        });
    }
    app.update();
    assert_eq!(app.world().resource::<WorldState>().walls().len(), 1);

    app.world_mut()
        .resource_mut::<WorldState>()
        .update(13.5, []);
    app.update();
    assert!(app.world().resource::<WorldState>().walls().is_empty());
}

#[test]
fn test_prediction_from_a_system_sees_fresh_paths() {
    let mut app = create_minimal_app();
    app.init_resource::<LastShot>();
    app.add_systems(Update, aim_at_first_agent);

    let walker = common::walker(1, DVec2::new(400.0, 0.0), DVec2::new(400.0, 800.0), 300.0);
    app.world_mut()
        .resource_mut::<WorldState>()
        .update(3.0, [walker]);
    app.update();

    // The path was recorded in PreUpdate at the current time, so the
    // prediction in Update treats it as fresh.
    let shot = app.world().resource::<LastShot>();
    let result = shot.0.as_ref().unwrap();
    assert_eq!(result.confidence, Confidence::VeryHigh);
    assert!(result.cast_position().y > 0.0);
}
