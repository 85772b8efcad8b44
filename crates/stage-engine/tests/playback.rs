//! Integration tests for whole-stage playback.
//!
//! Every test runs on a paused tokio clock, so step delays and speech
//! bubbles elapse instantly but in the right order.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use stage_engine::{
    EndReason, InMemoryStage, PlaybackConfig, PlaybackController, PlaybackEvent, Scene,
    SpriteStore, StageConfig,
};
use stage_types::{Action, ScriptBlock, Sprite, SpriteId};

fn blocks(actions: impl IntoIterator<Item = Action>) -> Vec<ScriptBlock> {
    actions.into_iter().map(ScriptBlock::new).collect()
}

fn stage_with(sprites: Vec<Sprite>, config: PlaybackConfig) -> (PlaybackController, Arc<InMemoryStage>) {
    let stage = Arc::new(InMemoryStage::new(sprites));
    let store: Arc<dyn SpriteStore> = Arc::clone(&stage) as Arc<dyn SpriteStore>;
    (PlaybackController::new(store, config), stage)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

/// Two sprites walking towards each other; they meet after their second
/// step and the third action of each comes from the other's script.
fn head_on() -> (Sprite, Sprite) {
    let left = Sprite::new("Left").at(-100.0, 0.0).with_script(blocks([
        Action::move_steps(35.0),
        Action::move_steps(35.0),
        Action::GoTo { x: 500.0, y: 500.0 },
    ]));
    let mut right = Sprite::new("Right").at(100.0, 0.0).with_script(blocks([
        Action::move_steps(35.0),
        Action::move_steps(35.0),
        Action::TurnClockwise { degrees: 90.0 },
    ]));
    right.rotation = 180.0;
    (left, right)
}

fn position(stage: &InMemoryStage, id: SpriteId) -> (f64, f64, f64) {
    let sprite = stage.sprite(id).unwrap();
    (sprite.x, sprite.y, sprite.rotation)
}

#[tokio::test(start_paused = true)]
async fn colliding_sprites_swap_remaining_actions() {
    let (left, right) = head_on();
    let (left_id, right_id) = (left.id, right.id);
    let (left_script, right_script) = (left.actions.clone(), right.actions.clone());
    let (controller, stage) = stage_with(vec![left, right], PlaybackConfig::default());
    let mut events = controller.subscribe();

    let summary = controller.play().await.unwrap().wait().await.unwrap();

    assert_eq!(summary.end_reason, EndReason::Completed);
    assert_eq!(summary.swaps.len(), 1);
    assert_eq!(summary.steps_executed, 6);

    // Left ran Right's turn, Right ran Left's goto.
    let (x, y, rotation) = position(&stage, left_id);
    assert!(approx(x, -30.0) && approx(y, 0.0) && approx(rotation, 90.0));
    let (x, y, rotation) = position(&stage, right_id);
    assert!(approx(x, 500.0) && approx(y, 500.0) && approx(rotation, 180.0));

    // Saved scripts were exchanged too.
    assert_eq!(stage.sprite(left_id).unwrap().actions, right_script);
    assert_eq!(stage.sprite(right_id).unwrap().actions, left_script);

    let mut swapped = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let PlaybackEvent::Swapped { pair, .. } = event {
            swapped.push(pair);
        }
    }
    assert_eq!(swapped.len(), 1);
    assert!(swapped.iter().all(|pair| pair.contains(left_id) && pair.contains(right_id)));
}

#[tokio::test(start_paused = true)]
async fn swap_can_leave_saved_scripts_alone() {
    let (left, right) = head_on();
    let (left_id, right_id) = (left.id, right.id);
    let left_script = left.actions.clone();
    let config = PlaybackConfig {
        propagate_to_scripts: false,
        ..PlaybackConfig::default()
    };
    let (controller, stage) = stage_with(vec![left, right], config);

    let summary = controller.play().await.unwrap().wait().await.unwrap();

    assert_eq!(summary.swaps.len(), 1);
    assert_eq!(stage.sprite(left_id).unwrap().actions, left_script);
    let (x, y, _) = position(&stage, right_id);
    assert!(approx(x, 500.0) && approx(y, 500.0));
}

#[tokio::test(start_paused = true)]
async fn distant_sprites_run_their_own_scripts() {
    let a = Sprite::new("A").at(-200.0, 0.0).with_script(blocks([
        Action::repeat(3, [Action::move_steps(10.0)]),
    ]));
    let b = Sprite::new("B").at(200.0, 0.0).with_script(blocks([
        Action::TurnAnticlockwise { degrees: 30.0 },
    ]));
    let (a_id, b_id) = (a.id, b.id);
    let (controller, stage) = stage_with(vec![a, b], PlaybackConfig::default());

    let summary = controller.play().await.unwrap().wait().await.unwrap();

    assert!(summary.swaps.is_empty());
    let (x, _, _) = position(&stage, a_id);
    assert!(approx(x, -170.0));
    let (_, _, rotation) = position(&stage, b_id);
    assert!(approx(rotation, -30.0));
}

#[tokio::test(start_paused = true)]
async fn sprites_run_concurrently() {
    let script = blocks([Action::repeat(5, [Action::move_steps(1.0)])]);
    let a = Sprite::new("A").at(-300.0, 0.0).with_script(script.clone());
    let b = Sprite::new("B").at(300.0, 0.0).with_script(script);
    let (controller, _stage) = stage_with(vec![a, b], PlaybackConfig::default());

    let started = tokio::time::Instant::now();
    controller.play().await.unwrap().wait().await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_millis(600), "ran serially: {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn unknown_blocks_from_a_scene_are_skipped() {
    let scene = Scene::parse(
        r#"{"sprites": [{
            "id": "0190b3a4-0000-7000-8000-0000000000aa",
            "name": "Sprite 1",
            "x": 0, "y": 0, "rotation": "",
            "message": "", "messageType": "",
            "actions": [
                {"type": "spin", "speed": 3},
                {"type": "move", "steps": "12"},
                {"type": "say", "message": "done", "duration": null}
            ]
        }]}"#,
    )
    .unwrap();
    let stage = Arc::new(InMemoryStage::from(scene));
    let store: Arc<dyn SpriteStore> = Arc::clone(&stage) as Arc<dyn SpriteStore>;
    let controller = PlaybackController::new(store, PlaybackConfig::default());

    let summary = controller.play().await.unwrap().wait().await.unwrap();

    assert_eq!(summary.steps_executed, 3);
    let sprite = stage.sprites().into_iter().next().unwrap();
    assert!(approx(sprite.x, 12.0));
    assert!(sprite.message.is_empty());
}

#[tokio::test(start_paused = true)]
async fn legacy_repeat_mode_from_config() {
    let config = StageConfig::parse(
        "playback:\n  repeat_mode: repeat_preceding\n  step_delay_ms: 10\n",
    )
    .unwrap();
    let sprite = Sprite::new("Sprite 1").with_script(vec![
        ScriptBlock::new(Action::move_steps(10.0)),
        ScriptBlock::new(Action::Repeat {
            times: 2,
            children: Vec::new(),
        }),
    ]);
    let id = sprite.id;
    let (controller, stage) = stage_with(vec![sprite], config.playback);

    let started = tokio::time::Instant::now();
    controller.play().await.unwrap().wait().await.unwrap();

    let (x, _, _) = position(&stage, id);
    assert!(approx(x, 30.0));
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn reset_after_play_is_independent_of_history() {
    let (left, right) = head_on();
    let ids = [left.id, right.id];
    let (controller, stage) = stage_with(vec![left, right], PlaybackConfig::default());

    controller.play().await.unwrap().wait().await.unwrap();
    controller.reset().await;
    let first: Vec<_> = ids.iter().map(|&id| position(&stage, id)).collect();
    controller.reset().await;
    let second: Vec<_> = ids.iter().map(|&id| position(&stage, id)).collect();

    assert_eq!(first.len(), second.len());
    for (x, y, rotation) in first.into_iter().chain(second) {
        assert!(approx(x, 0.0) && approx(y, 0.0) && approx(rotation, 0.0));
    }
}

#[tokio::test(start_paused = true)]
async fn stop_then_play_starts_a_fresh_session() {
    let sprite = Sprite::new("Sprite 1").with_script(blocks([
        Action::say("first", 3.0),
        Action::move_steps(10.0),
    ]));
    let id = sprite.id;
    let (controller, stage) = stage_with(vec![sprite], PlaybackConfig::default());

    let stopped = controller.play().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(controller.stop().await);

    let fresh = controller.play().await.unwrap();
    assert_ne!(fresh.session_id(), stopped.session_id());
    let stopped = stopped.wait().await.unwrap();
    let fresh = fresh.wait().await.unwrap();

    assert_eq!(stopped.end_reason, EndReason::Stopped);
    assert_eq!(stopped.steps_executed, 1);
    assert_eq!(fresh.end_reason, EndReason::Completed);
    assert_eq!(fresh.steps_executed, 2);
    let (x, _, _) = position(&stage, id);
    assert!(approx(x, 10.0));
}
