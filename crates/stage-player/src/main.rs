//! Headless player for Sprite Stage scenes.
//!
//! Loads a scene, plays every sprite's script to the end and prints the
//! resulting scene as JSON. Ctrl-C stops playback the same way the stage's
//! stop button does.
//!
//! # Usage
//!
//! ```text
//! stage-player [SCENE.json] [OUT.json]
//! ```
//!
//! Without a scene file a built-in two-sprite demo is played. Without an
//! output path the final scene is written to stdout.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `STAGE_CONFIG` (default `stage-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the scene into an in-memory stage
//! 4. Play until every sprite finishes or Ctrl-C
//! 5. Log the summary and write the final scene

mod demo;
mod error;

use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::Arc;

use stage_engine::{InMemoryStage, PlaybackController, Scene, SpriteStore, StageConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::PlayerError;

/// Application entry point for the stage player.
///
/// # Errors
///
/// Returns an error if the configuration or scene cannot be loaded, the
/// session fails, or the final scene cannot be written.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so remember whether the
    //    file was there and report it afterwards.
    let config_path = config_path();
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("stage-player starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        step_delay_ms = config.playback.step_delay_ms,
        collision_threshold = config.playback.collision_threshold,
        propagate_to_scripts = config.playback.propagate_to_scripts,
        repeat_mode = ?config.playback.repeat_mode,
        "Playback configuration"
    );

    // 3. Load the scene.
    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let scene = match args.next() {
        Some(path) => {
            let scene = Scene::from_file(&path)?;
            info!(path = %path.display(), sprites = scene.sprites.len(), "Scene loaded");
            scene
        }
        None => {
            info!("No scene file given, playing the demo scene");
            demo::scene()
        }
    };
    let output = args.next();

    let stage = Arc::new(InMemoryStage::from(scene));
    let store: Arc<dyn SpriteStore> = Arc::clone(&stage) as Arc<dyn SpriteStore>;
    let controller = PlaybackController::new(store, config.playback);

    // 4. Play.
    let handle = controller.play().await.ok_or_else(|| PlayerError::NotStarted {
        message: "a session is already running".to_owned(),
    })?;
    let mut wait = pin!(handle.wait());
    let summary = tokio::select! {
        summary = &mut wait => summary,
        signal = tokio::signal::ctrl_c() => {
            if let Err(error) = signal {
                warn!(%error, "Failed to listen for Ctrl-C, waiting for playback");
            } else {
                info!("Ctrl-C received, stopping playback");
                controller.stop().await;
            }
            wait.await
        }
    };
    let summary = summary.map_err(PlayerError::from)?;

    // 5. Report.
    info!(
        session = %summary.session_id,
        end_reason = ?summary.end_reason,
        sprites = summary.sprites_started,
        steps = summary.steps_executed,
        swaps = summary.swaps.len(),
        elapsed_ms = summary
            .ended_at
            .signed_duration_since(summary.started_at)
            .num_milliseconds(),
        "Playback finished"
    );

    let final_scene = Scene::snapshot(stage.as_ref());
    match output {
        Some(path) => {
            final_scene.save(&path).map_err(PlayerError::from)?;
            info!(path = %path.display(), "Final scene written");
        }
        None => println!("{}", final_scene.to_json().map_err(PlayerError::from)?),
    }

    info!("stage-player shutdown complete");
    Ok(())
}

/// Config path from `STAGE_CONFIG`, or `stage-config.yaml` in the working
/// directory.
fn config_path() -> PathBuf {
    std::env::var_os("STAGE_CONFIG")
        .map_or_else(|| PathBuf::from("stage-config.yaml"), PathBuf::from)
}

/// Load the stage configuration, falling back to defaults when the file
/// does not exist. The flag tells whether the file was read.
fn load_config(path: &Path) -> Result<(StageConfig, bool), PlayerError> {
    if path.exists() {
        Ok((StageConfig::from_file(path)?, true))
    } else {
        let mut config = StageConfig::default();
        config.logging.apply_env_overrides();
        Ok((config, false))
    }
}
